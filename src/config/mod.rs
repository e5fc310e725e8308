use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_SETTINGS_PATH: &str = "settings.yaml";
const ENV_PREFIX: &str = "GATEWAY";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "snake_case")]
pub struct Settings {
    #[serde(default)]
    pub network: NetworkSettings,
    #[serde(default)]
    pub github: GitHubSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct NetworkSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for JSON request bodies; image uploads arrive base64-encoded.
    #[serde(default = "default_json_limit")]
    pub json_limit_bytes: usize,
    /// Empty means any origin is accepted.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct GitHubSettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default = "default_branch")]
    pub default_branch: String,
    #[serde(default = "default_image_dir")]
    pub image_dir: String,
    #[serde(default = "default_image_content_type")]
    pub image_content_type: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// No timeout is applied to remote calls unless this is set.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct LoggingSettings {
    #[serde(default = "default_console_level")]
    pub console_level: String,
    #[serde(default = "default_file_level")]
    pub file_level: String,
    #[serde(default = "default_log_path")]
    pub log_path: String,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_json_limit() -> usize {
    10 * 1024 * 1024
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_image_dir() -> String {
    "images".to_string()
}

fn default_image_content_type() -> String {
    "image/png".to_string()
}

fn default_user_agent() -> String {
    concat!("editor-gateway/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_console_level() -> String {
    "info".to_string()
}

fn default_file_level() -> String {
    "debug".to_string()
}

fn default_log_path() -> String {
    "/tmp/editor-gateway.log".to_string()
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            json_limit_bytes: default_json_limit(),
            allowed_origins: Vec::new(),
        }
    }
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            owner: String::new(),
            repo: String::new(),
            default_branch: default_branch(),
            image_dir: default_image_dir(),
            image_content_type: default_image_content_type(),
            user_agent: default_user_agent(),
            timeout_secs: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            console_level: default_console_level(),
            file_level: default_file_level(),
            log_path: default_log_path(),
        }
    }
}

impl Settings {
    /// Loads settings from the optional YAML file named by `SETTINGS_FILE_PATH`,
    /// overlaid with `GATEWAY__SECTION__KEY` environment variables.
    pub fn new() -> Result<Self, ConfigError> {
        let settings_path = std::env::var("SETTINGS_FILE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_PATH));

        debug!("Loading settings from: {:?}", settings_path);

        let builder = Config::builder()
            .add_source(File::from(settings_path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("network.allowed_origins"),
            );

        let settings = Self::from_builder(builder)?;

        info!(
            "GitHub settings loaded: owner={}, repo={}, default_branch={}",
            settings.github.owner, settings.github.repo, settings.github.default_branch
        );

        Ok(settings)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.github.owner.trim().is_empty() {
            return Err(ConfigError::Message("GitHub owner cannot be empty".into()));
        }
        if self.github.repo.trim().is_empty() {
            return Err(ConfigError::Message("GitHub repository cannot be empty".into()));
        }
        if self.github.default_branch.trim().is_empty() {
            return Err(ConfigError::Message("Default branch cannot be empty".into()));
        }
        Ok(())
    }

    /// Joins the configured image directory with an asset name.
    pub fn image_path(&self, name: &str) -> String {
        let dir = self.github.image_dir.trim_matches('/');
        if dir.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", dir, name)
        }
    }
}

/// Reads the process-wide credential once at start-up. Empty values count as unset.
pub fn process_token_from_env() -> Option<String> {
    std::env::var("GITHUB_TOKEN")
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

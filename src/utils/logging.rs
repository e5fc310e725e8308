use log::LevelFilter;
use log::info;
use simplelog::{CombinedLogger, Config, TermLogger, TerminalMode, WriteLogger};
use std::fs::File;
use std::io;

use crate::config::LoggingSettings;

#[derive(Debug)]
pub struct LogConfig {
    file_level: LevelFilter,
    console_level: LevelFilter,
    log_path: String,
}

impl LogConfig {
    pub fn new(file_level: &str, console_level: &str, log_path: &str) -> Self {
        Self {
            file_level: parse_level(file_level),
            console_level: parse_level(console_level),
            log_path: log_path.to_string(),
        }
    }

    pub fn file_level(&self) -> LevelFilter {
        self.file_level
    }

    pub fn console_level(&self) -> LevelFilter {
        self.console_level
    }
}

impl From<&LoggingSettings> for LogConfig {
    fn from(settings: &LoggingSettings) -> Self {
        Self::new(&settings.file_level, &settings.console_level, &settings.log_path)
    }
}

fn parse_level(level: &str) -> LevelFilter {
    match level.to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

pub fn init_logging_with_config(config: LogConfig) -> io::Result<()> {
    let log_file = File::create(&config.log_path)?;

    CombinedLogger::init(vec![
        TermLogger::new(
            config.console_level,
            Config::default(),
            TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        ),
        WriteLogger::new(config.file_level, Config::default(), log_file),
    ])
    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    info!(
        "Logging initialized with level file:{:?} console:{:?} ({})",
        config.file_level, config.console_level, config.log_path
    );
    Ok(())
}

use log::{debug, error, info};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::types::{RepositoryResponse, UserResponse};
use crate::config::GitHubSettings;
use crate::services::content_store::StoreError;
use crate::utils::auth::Credential;

const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";

/// Core GitHub API client bound to one repository.
pub struct GitHubClient {
    client: Client,
    api_url: String,
    owner: String,
    repo: String,
    default_branch: String,
}

impl GitHubClient {
    pub fn new(settings: &GitHubSettings) -> Result<Self, reqwest::Error> {
        info!(
            "Creating GitHub client for {}/{} via {}",
            settings.owner, settings.repo, settings.api_url
        );

        let mut builder = Client::builder().user_agent(settings.user_agent.clone());
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            owner: settings.owner.clone(),
            repo: settings.repo.clone(),
            default_branch: settings.default_branch.clone(),
        })
    }

    pub(crate) fn default_branch(&self) -> &str {
        &self.default_branch
    }

    /// `{api}/repos/{owner}/{repo}` followed by `suffix`
    pub(crate) fn repo_url(&self, suffix: &str) -> String {
        format!("{}/repos/{}/{}{}", self.api_url, self.owner, self.repo, suffix)
    }

    pub(crate) fn contents_url(&self, path: &str) -> String {
        self.repo_url(&format!("/contents/{}", encode_path(path)))
    }

    /// Builds a request carrying the credential and the versioned media type.
    pub(crate) fn request(&self, method: Method, url: &str, credential: &Credential) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", credential.authorization_header())
            .header("Accept", ACCEPT_HEADER)
    }

    /// Sends the request and decodes a successful body into `T`.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &str,
    ) -> Result<T, StoreError> {
        let response = request.send().await.map_err(|e| {
            error!("{} request failed: {}", operation, e);
            StoreError::Unavailable(e.to_string())
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read {} response: {}", operation, e);
            StoreError::Unavailable(e.to_string())
        })?;

        if !status.is_success() {
            error!("{} failed. Status: {}, Error: {}", operation, status, body);
            return Err(classify_failure(status, body));
        }

        debug!("{} succeeded with status {}", operation, status);
        serde_json::from_str(&body).map_err(|e| {
            error!("Unexpected {} response body: {}", operation, e);
            StoreError::Unavailable(format!("Invalid response from GitHub for {}: {}", operation, e))
        })
    }

    pub async fn check_repository(&self, credential: &Credential) -> Result<(), StoreError> {
        let url = self.repo_url("");
        let repo: RepositoryResponse = self
            .send_json(self.request(Method::GET, &url, credential), "repository check")
            .await?;
        debug!("Repository {} reachable", repo.full_name);
        Ok(())
    }

    pub async fn authenticated_user(&self, credential: &Credential) -> Result<String, StoreError> {
        let url = format!("{}/user", self.api_url);
        let user: UserResponse = self
            .send_json(self.request(Method::GET, &url, credential), "user lookup")
            .await?;
        Ok(user.login)
    }
}

/// Percent-encodes each path segment, keeping the separators.
pub(crate) fn encode_path(path: &str) -> String {
    path.trim_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Maps a non-2xx response onto the store taxonomy, keeping the body verbatim.
pub(crate) fn classify_failure(status: StatusCode, body: String) -> StoreError {
    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(body),
        StatusCode::CONFLICT => StoreError::Conflict(body),
        StatusCode::UNPROCESSABLE_ENTITY if reports_conflict(&body) => StoreError::Conflict(body),
        _ => StoreError::Unavailable(body),
    }
}

fn reports_conflict(body: &str) -> bool {
    let lowered = body.to_ascii_lowercase();
    lowered.contains("already exists")
        || lowered.contains("does not match")
        || lowered.contains("wasn't supplied")
}

//! GitHub-backed content store
//!
//! This module is split into:
//! - API client: URLs, headers and response classification
//! - Content API: reading, writing and listing files
//! - Pull Request API: branch refs, pull request creation and merging
//! - Wire types for each remote call

mod api;
mod content;
mod pr;
pub mod types;

pub use api::GitHubClient;
pub use content::ContentAPI;
pub use pr::PullRequestAPI;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::GitHubSettings;
use crate::services::content_store::{
    Branch, ContentStore, DirectoryEntry, MergedPullRequest, PullRequest, PullRequestSummary,
    RemoteFile, RepositoryBrowser, StoreError, Version,
};
use crate::utils::auth::Credential;

/// [`ContentStore`] over the GitHub REST API for a single repository.
pub struct GitHubStore {
    client: Arc<GitHubClient>,
    content: ContentAPI,
    pulls: PullRequestAPI,
}

impl GitHubStore {
    pub fn new(settings: &GitHubSettings) -> Result<Self, reqwest::Error> {
        let client = Arc::new(GitHubClient::new(settings)?);
        Ok(Self {
            content: ContentAPI::new(client.clone()),
            pulls: PullRequestAPI::new(client.clone()),
            client,
        })
    }
}

#[async_trait]
impl ContentStore for GitHubStore {
    async fn read_file_at(
        &self,
        credential: &Credential,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<RemoteFile, StoreError> {
        self.content.read_file(credential, path, git_ref).await
    }

    async fn put_file(
        &self,
        credential: &Credential,
        path: &str,
        content: &[u8],
        version: Option<&Version>,
        branch: Option<&str>,
        message: &str,
    ) -> Result<RemoteFile, StoreError> {
        self.content
            .put_file(credential, path, content, version, branch, message)
            .await
    }

    async fn branch_tip(&self, credential: &Credential, branch: &str) -> Result<String, StoreError> {
        self.pulls.branch_tip(credential, branch).await
    }

    async fn create_branch(
        &self,
        credential: &Credential,
        name: &str,
        base_commit: &str,
    ) -> Result<Branch, StoreError> {
        self.pulls.create_branch(credential, name, base_commit).await
    }

    async fn open_pull_request(
        &self,
        credential: &Credential,
        head_branch: &str,
        base_branch: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest, StoreError> {
        self.pulls
            .open_pull_request(credential, head_branch, base_branch, title, body)
            .await
    }

    async fn merge_pull_request(
        &self,
        credential: &Credential,
        number: u64,
    ) -> Result<MergedPullRequest, StoreError> {
        self.pulls.merge_pull_request(credential, number).await
    }

    fn default_branch(&self) -> &str {
        self.client.default_branch()
    }

    async fn file_version(
        &self,
        credential: &Credential,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Version, StoreError> {
        self.content.file_version(credential, path, git_ref).await
    }
}

#[async_trait]
impl RepositoryBrowser for GitHubStore {
    async fn check_repository(&self, credential: &Credential) -> Result<(), StoreError> {
        self.client.check_repository(credential).await
    }

    async fn authenticated_user(&self, credential: &Credential) -> Result<String, StoreError> {
        self.client.authenticated_user(credential).await
    }

    async fn list_directory(
        &self,
        credential: &Credential,
        path: &str,
    ) -> Result<Vec<DirectoryEntry>, StoreError> {
        self.content.list_directory(credential, path).await
    }

    async fn list_open_pull_requests(
        &self,
        credential: &Credential,
    ) -> Result<Vec<PullRequestSummary>, StoreError> {
        self.pulls.list_open_pull_requests(credential).await
    }
}

//! Abstraction over the remote file store.
//!
//! Writes are optimistic: every write carries the version token the writer
//! last observed, and the store rejects stale tokens with [`StoreError::Conflict`].
//! When the caller has no token, [`ContentStore::write_file`] reads the file
//! first and uses whatever version it finds (none if the file is absent).

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::utils::auth::Credential;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Authentication required: no GitHub token available")]
    Unauthenticated,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

/// Content-addressed version token assigned by the store on every write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    pub fn new(sha: impl Into<String>) -> Self {
        Self(sha.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    pub content: Vec<u8>,
    pub version: Version,
}

impl RemoteFile {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub base_commit: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestState {
    Open,
    Merged,
    ClosedUnmerged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub url: String,
    pub head_branch: String,
    pub base_branch: String,
    pub state: PullRequestState,
}

/// Outcome of a successful merge. The store does not echo the branch names
/// back on merge, so only what it reports is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedPullRequest {
    pub number: u64,
    pub merge_commit: String,
    pub message: String,
}

impl MergedPullRequest {
    pub fn state(&self) -> PullRequestState {
        PullRequestState::Merged
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestSummary {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub head: String,
}

/// Decodes the store's base64 payload. The store wraps lines, so whitespace is dropped first.
pub fn decode_content(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64.decode(compact)
}

pub fn encode_content(content: &[u8]) -> String {
    BASE64.encode(content)
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Reads `path` at `git_ref`, or at the default branch when `git_ref` is `None`.
    async fn read_file_at(
        &self,
        credential: &Credential,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<RemoteFile, StoreError>;

    /// Issues a single write. `version` of `None` means "create new".
    async fn put_file(
        &self,
        credential: &Credential,
        path: &str,
        content: &[u8],
        version: Option<&Version>,
        branch: Option<&str>,
        message: &str,
    ) -> Result<RemoteFile, StoreError>;

    /// Commit the named branch currently points at.
    async fn branch_tip(&self, credential: &Credential, branch: &str) -> Result<String, StoreError>;

    async fn create_branch(
        &self,
        credential: &Credential,
        name: &str,
        base_commit: &str,
    ) -> Result<Branch, StoreError>;

    async fn open_pull_request(
        &self,
        credential: &Credential,
        head_branch: &str,
        base_branch: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest, StoreError>;

    async fn merge_pull_request(
        &self,
        credential: &Credential,
        number: u64,
    ) -> Result<MergedPullRequest, StoreError>;

    fn default_branch(&self) -> &str;

    async fn read_file(&self, credential: &Credential, path: &str) -> Result<RemoteFile, StoreError> {
        self.read_file_at(credential, path, None).await
    }

    /// Writes onto the default branch. Without `expected_version` the current
    /// version is looked up first; a conflict under a concurrent writer is
    /// returned as-is.
    async fn write_file(
        &self,
        credential: &Credential,
        path: &str,
        content: &[u8],
        expected_version: Option<Version>,
        message: &str,
    ) -> Result<RemoteFile, StoreError> {
        let version = match expected_version {
            Some(version) => Some(version),
            None => self.current_version(credential, path, None).await?,
        };
        self.put_file(credential, path, content, version.as_ref(), None, message)
            .await
    }

    async fn write_file_on_branch(
        &self,
        credential: &Credential,
        path: &str,
        content: &[u8],
        branch: &str,
        message: &str,
    ) -> Result<RemoteFile, StoreError> {
        let version = self.current_version(credential, path, Some(branch)).await?;
        self.put_file(credential, path, content, version.as_ref(), Some(branch), message)
            .await
    }

    /// Version of `path` at `git_ref` without needing its content. Stores that
    /// can look the version up cheaply should override this.
    async fn file_version(
        &self,
        credential: &Credential,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Version, StoreError> {
        self.read_file_at(credential, path, git_ref)
            .await
            .map(|file| file.version)
    }

    async fn current_version(
        &self,
        credential: &Credential,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Option<Version>, StoreError> {
        match self.file_version(credential, path, git_ref).await {
            Ok(version) => Ok(Some(version)),
            Err(StoreError::NotFound(_)) => {
                debug!("No prior version of {}; creating it", path);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Read-only views used by the listing and identity endpoints.
#[async_trait]
pub trait RepositoryBrowser: Send + Sync {
    async fn check_repository(&self, credential: &Credential) -> Result<(), StoreError>;

    async fn authenticated_user(&self, credential: &Credential) -> Result<String, StoreError>;

    async fn list_directory(
        &self,
        credential: &Credential,
        path: &str,
    ) -> Result<Vec<DirectoryEntry>, StoreError>;

    async fn list_open_pull_requests(
        &self,
        credential: &Credential,
    ) -> Result<Vec<PullRequestSummary>, StoreError>;
}

//! Wire schemas for the GitHub REST calls the gateway makes.
//!
//! Every response is decoded into one of these structs so that a missing
//! required field surfaces as an error before the value is used.

use serde::{Deserialize, Serialize};

/// `GET /repos/{owner}/{repo}/contents/{path}` for a single file
#[derive(Debug, Deserialize)]
pub struct ContentResponse {
    pub path: String,
    pub sha: String,
    /// Absent for entries too large for the contents API or for non-file types.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

/// One element of a directory listing
#[derive(Debug, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sha: String,
}

/// Body of `PUT /repos/{owner}/{repo}/contents/{path}`
#[derive(Debug, Serialize)]
pub struct WriteFileRequest<'a> {
    pub message: &'a str,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct WriteFileResponse {
    pub content: WrittenContent,
}

#[derive(Debug, Deserialize)]
pub struct WrittenContent {
    pub path: String,
    pub sha: String,
}

/// Body of `POST /repos/{owner}/{repo}/git/refs`
#[derive(Debug, Serialize)]
pub struct CreateBranchRequest {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub struct RefResponse {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub object: RefObject,
}

#[derive(Debug, Deserialize)]
pub struct RefObject {
    pub sha: String,
}

/// Body of `POST /repos/{owner}/{repo}/pulls`
#[derive(Debug, Serialize)]
pub struct CreatePullRequest<'a> {
    pub title: &'a str,
    pub head: &'a str,
    pub base: &'a str,
    pub body: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestResponse {
    pub number: u64,
    pub html_url: String,
    pub state: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub merged: Option<bool>,
    #[serde(default)]
    pub merged_at: Option<String>,
    pub head: PullRequestRef,
    pub base: PullRequestRef,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
}

/// Body of `PUT /repos/{owner}/{repo}/pulls/{number}/merge`
#[derive(Debug, Serialize)]
pub struct MergePullRequest {
    pub commit_title: String,
    pub merge_method: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct MergeResponse {
    pub sha: String,
    pub merged: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct UserResponse {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryResponse {
    pub full_name: String,
}

use log::info;
use reqwest::Method;
use std::sync::Arc;

use super::api::{encode_path, GitHubClient};
use super::types::{
    CreateBranchRequest, CreatePullRequest, MergePullRequest, MergeResponse, PullRequestResponse,
    RefResponse,
};
use crate::services::content_store::{
    Branch, MergedPullRequest, PullRequest, PullRequestState, PullRequestSummary, StoreError,
};
use crate::utils::auth::Credential;

/// Handles GitHub ref and pull request operations
pub struct PullRequestAPI {
    client: Arc<GitHubClient>,
}

impl PullRequestAPI {
    pub fn new(client: Arc<GitHubClient>) -> Self {
        Self { client }
    }

    pub async fn branch_tip(&self, credential: &Credential, branch: &str) -> Result<String, StoreError> {
        let url = self.client.repo_url(&format!("/git/ref/heads/{}", encode_path(branch)));
        let reference: RefResponse = self
            .client
            .send_json(self.client.request(Method::GET, &url, credential), "branch lookup")
            .await?;
        Ok(reference.object.sha)
    }

    pub async fn create_branch(
        &self,
        credential: &Credential,
        name: &str,
        base_commit: &str,
    ) -> Result<Branch, StoreError> {
        let url = self.client.repo_url("/git/refs");
        let body = CreateBranchRequest {
            ref_name: format!("refs/heads/{}", name),
            sha: base_commit.to_string(),
        };

        let created: RefResponse = self
            .client
            .send_json(self.client.request(Method::POST, &url, credential).json(&body), "branch creation")
            .await?;

        info!("Created {} at {}", created.ref_name, created.object.sha);
        Ok(Branch {
            name: name.to_string(),
            base_commit: created.object.sha,
        })
    }

    pub async fn open_pull_request(
        &self,
        credential: &Credential,
        head_branch: &str,
        base_branch: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest, StoreError> {
        let url = self.client.repo_url("/pulls");
        let request = CreatePullRequest {
            title,
            head: head_branch,
            base: base_branch,
            body,
        };

        let pr: PullRequestResponse = self
            .client
            .send_json(self.client.request(Method::POST, &url, credential).json(&request), "pull request creation")
            .await?;

        info!("Created PR: {}", pr.html_url);
        Ok(to_pull_request(pr))
    }

    pub async fn merge_pull_request(
        &self,
        credential: &Credential,
        number: u64,
    ) -> Result<MergedPullRequest, StoreError> {
        let url = self.client.repo_url(&format!("/pulls/{}/merge", number));
        let body = MergePullRequest {
            commit_title: format!("Merge pull request #{}", number),
            merge_method: "merge",
        };

        let merged: MergeResponse = self
            .client
            .send_json(self.client.request(Method::PUT, &url, credential).json(&body), "pull request merge")
            .await?;

        if !merged.merged {
            return Err(StoreError::Unavailable(merged.message));
        }

        info!("Merged PR #{} as {}", number, merged.sha);
        Ok(MergedPullRequest {
            number,
            merge_commit: merged.sha,
            message: merged.message,
        })
    }

    pub async fn list_open_pull_requests(
        &self,
        credential: &Credential,
    ) -> Result<Vec<PullRequestSummary>, StoreError> {
        let url = self.client.repo_url("/pulls");
        let request = self
            .client
            .request(Method::GET, &url, credential)
            .query(&[("state", "open")]);

        let pulls: Vec<PullRequestResponse> = self.client.send_json(request, "pull request listing").await?;
        Ok(pulls
            .into_iter()
            .map(|pr| PullRequestSummary {
                number: pr.number,
                title: pr.title,
                url: pr.html_url,
                head: pr.head.ref_name,
            })
            .collect())
    }
}

fn to_pull_request(pr: PullRequestResponse) -> PullRequest {
    let state = match (pr.state.as_str(), pr.merged.unwrap_or(false) || pr.merged_at.is_some()) {
        (_, true) => PullRequestState::Merged,
        ("open", false) => PullRequestState::Open,
        _ => PullRequestState::ClosedUnmerged,
    };

    PullRequest {
        number: pr.number,
        url: pr.html_url,
        head_branch: pr.head.ref_name,
        base_branch: pr.base.ref_name,
        state,
    }
}

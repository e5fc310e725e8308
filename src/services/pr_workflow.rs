//! Publishes an edit as a pull request.
//!
//! The run is a fixed sequence of remote steps with no rollback:
//!
//! ```text
//! ResolveBase -> CreateBranch -> WriteOnBranch -> OpenPullRequest -> done
//! ```
//!
//! A failure stops the run where it happened. Anything created by earlier
//! steps stays on the remote: a failed write leaves the branch behind, a
//! failed pull request leaves the branch and its commit.

use chrono::Utc;
use log::{debug, error, info, warn};
use std::fmt;
use std::sync::Arc;

use crate::models::WorkflowResult;
use crate::services::content_store::{Branch, ContentStore, PullRequest, RemoteFile, StoreError};
use crate::utils::auth::Credential;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrStep {
    ResolveBase,
    CreateBranch,
    WriteOnBranch,
    OpenPullRequest,
}

impl fmt::Display for PrStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrStep::ResolveBase => "resolve base",
            PrStep::CreateBranch => "create branch",
            PrStep::WriteOnBranch => "write on branch",
            PrStep::OpenPullRequest => "open pull request",
        };
        f.write_str(name)
    }
}

/// Remote objects a failed run leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Orphan {
    Branch(String),
    Commit { branch: String, path: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrFailure {
    pub step: PrStep,
    pub orphans: Vec<Orphan>,
    pub source: StoreError,
}

#[derive(Debug, Clone)]
pub struct PrEdit<'a> {
    pub path: &'a str,
    pub content: &'a [u8],
    pub title: Option<&'a str>,
    pub body: Option<&'a str>,
}

enum PrState {
    ResolveBase,
    CreateBranch { base_commit: String },
    WriteOnBranch { branch: Branch },
    OpenPullRequest { branch: Branch, file: RemoteFile },
    Opened(PullRequest),
}

impl PrState {
    fn step(&self) -> Option<PrStep> {
        match self {
            PrState::ResolveBase => Some(PrStep::ResolveBase),
            PrState::CreateBranch { .. } => Some(PrStep::CreateBranch),
            PrState::WriteOnBranch { .. } => Some(PrStep::WriteOnBranch),
            PrState::OpenPullRequest { .. } => Some(PrStep::OpenPullRequest),
            PrState::Opened(_) => None,
        }
    }

    fn orphans(&self) -> Vec<Orphan> {
        match self {
            PrState::WriteOnBranch { branch } => vec![Orphan::Branch(branch.name.clone())],
            PrState::OpenPullRequest { branch, file } => vec![
                Orphan::Branch(branch.name.clone()),
                Orphan::Commit {
                    branch: branch.name.clone(),
                    path: file.path.clone(),
                },
            ],
            _ => Vec::new(),
        }
    }
}

pub struct PrWorkflow {
    store: Arc<dyn ContentStore>,
}

impl PrWorkflow {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    pub async fn create_pr(&self, credential: Option<&Credential>, edit: PrEdit<'_>) -> WorkflowResult {
        let Some(credential) = credential else {
            return StoreError::Unauthenticated.into();
        };

        match self.run_at(credential, &edit, Utc::now().timestamp_millis()).await {
            Ok(pr) => WorkflowResult::success(format!("PR created: {}", pr.url)),
            Err(failure) => failure.source.into(),
        }
    }

    /// Runs every step with a branch name derived from `timestamp_millis`.
    pub async fn run_at(
        &self,
        credential: &Credential,
        edit: &PrEdit<'_>,
        timestamp_millis: i64,
    ) -> Result<PullRequest, PrFailure> {
        let default_branch = self.store.default_branch().to_string();
        let mut state = PrState::ResolveBase;

        loop {
            let outcome = match &state {
                PrState::ResolveBase => self
                    .store
                    .branch_tip(credential, &default_branch)
                    .await
                    .map(|base_commit| {
                        debug!("{} is at {}", default_branch, base_commit);
                        PrState::CreateBranch { base_commit }
                    }),
                PrState::CreateBranch { base_commit } => {
                    let name = branch_name(edit.path, timestamp_millis);
                    self.store
                        .create_branch(credential, &name, base_commit)
                        .await
                        .map(|branch| PrState::WriteOnBranch { branch })
                }
                PrState::WriteOnBranch { branch } => self
                    .store
                    .write_file_on_branch(
                        credential,
                        edit.path,
                        edit.content,
                        &branch.name,
                        &format!("Update {}", edit.path),
                    )
                    .await
                    .map(|file| PrState::OpenPullRequest {
                        branch: branch.clone(),
                        file,
                    }),
                PrState::OpenPullRequest { branch, .. } => {
                    let title = edit
                        .title
                        .filter(|t| !t.trim().is_empty())
                        .map(str::to_string)
                        .unwrap_or_else(|| default_title(edit.path));
                    let body = edit
                        .body
                        .filter(|b| !b.trim().is_empty())
                        .map(str::to_string)
                        .unwrap_or_else(|| default_body(edit.path));
                    self.store
                        .open_pull_request(credential, &branch.name, &default_branch, &title, &body)
                        .await
                        .map(PrState::Opened)
                }
                PrState::Opened(pr) => {
                    info!("Created PR #{} from {}", pr.number, pr.head_branch);
                    return Ok(pr.clone());
                }
            };

            state = match outcome {
                Ok(next) => next,
                Err(source) => return Err(fail(&state, source)),
            };
        }
    }
}

fn fail(state: &PrState, source: StoreError) -> PrFailure {
    let step = state.step().unwrap_or(PrStep::OpenPullRequest);
    let orphans = state.orphans();
    error!("Pull request workflow failed at {}: {}", step, source);
    for orphan in &orphans {
        warn!("Left on remote after failed pull request workflow: {:?}", orphan);
    }
    PrFailure { step, orphans, source }
}

/// `update-<file stem>-<millis>`, restricted to characters valid in a ref name.
pub fn branch_name(path: &str, timestamp_millis: i64) -> String {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .filter(|stem| !stem.is_empty())
        .unwrap_or(file_name);

    let slug: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    let slug = slug.trim_matches('-');

    if slug.is_empty() {
        format!("update-{}", timestamp_millis)
    } else {
        format!("update-{}-{}", slug, timestamp_millis)
    }
}

fn default_title(path: &str) -> String {
    format!("Update {}", path)
}

fn default_body(path: &str) -> String {
    format!("Proposed changes to {}", path)
}

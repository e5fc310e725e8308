use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::{GitHubSettings, Settings};
use crate::services::content_store::{
    decode_content, encode_content, Branch, ContentStore, DirectoryEntry, MergedPullRequest,
    PullRequest, PullRequestState, PullRequestSummary, RemoteFile, RepositoryBrowser, StoreError,
    Version,
};
use crate::utils::auth::{Credential, TokenResolver};
use crate::AppState;

const DEFAULT_BRANCH: &str = "main";

#[derive(Clone)]
struct BranchState {
    base: String,
    head: String,
    /// path -> (base64 payload, version)
    files: HashMap<String, (String, Version)>,
}

struct StoredPullRequest {
    pr: PullRequest,
    title: String,
}

#[derive(Default)]
struct Inner {
    branches: HashMap<String, BranchState>,
    pulls: Vec<StoredPullRequest>,
    calls: Vec<String>,
    tokens: Vec<String>,
    failures: HashMap<String, StoreError>,
    counter: u64,
    login: String,
}

impl Inner {
    fn next_id(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{}{:04}", prefix, self.counter)
    }

    fn record(&mut self, credential: &Credential, op: &str, call: String) -> Result<(), StoreError> {
        self.calls.push(call);
        self.tokens.push(credential.as_str().to_string());
        match self.failures.remove(op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// In-memory stand-in for the remote store. Enforces version checks and
/// branch semantics the way the remote does, stores content base64-encoded,
/// and records every call in order.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let mut inner = Inner {
            login: "octocat".to_string(),
            ..Inner::default()
        };
        let head = inner.next_id("c");
        inner.branches.insert(
            DEFAULT_BRANCH.to_string(),
            BranchState {
                base: head.clone(),
                head,
                files: HashMap::new(),
            },
        );
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Places a file on `branch` without recording a call; returns its version.
    pub fn seed(&self, branch: &str, path: &str, content: &[u8]) -> Version {
        let mut inner = self.inner.lock().unwrap();
        let version = Version::new(inner.next_id("v"));
        let commit = inner.next_id("c");
        let state = inner.branches.get_mut(branch).expect("unknown branch");
        state.files.insert(path.to_string(), (encode_content(content), version.clone()));
        state.head = commit;
        version
    }

    pub fn seed_merged_pull_request(&self, number: u64) {
        let mut inner = self.inner.lock().unwrap();
        inner.pulls.push(StoredPullRequest {
            pr: PullRequest {
                number,
                url: format!("https://github.test/acme/site/pull/{}", number),
                head_branch: format!("update-old-{}", number),
                base_branch: DEFAULT_BRANCH.to_string(),
                state: PullRequestState::Merged,
            },
            title: "Old change".to_string(),
        });
    }

    /// Makes the next call of kind `op` (read, put, tip, branch, pull, merge,
    /// repo, user, list, pulls) fail with `err`.
    pub fn fail_next(&self, op: &str, err: StoreError) {
        self.inner.lock().unwrap().failures.insert(op.to_string(), err);
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Token presented with each recorded call, in order.
    pub fn tokens(&self) -> Vec<String> {
        self.inner.lock().unwrap().tokens.clone()
    }

    pub fn file(&self, branch: &str, path: &str) -> Option<(Vec<u8>, Version)> {
        let inner = self.inner.lock().unwrap();
        let (encoded, version) = inner.branches.get(branch)?.files.get(path)?;
        Some((decode_content(encoded).unwrap(), version.clone()))
    }

    pub fn tip(&self, branch: &str) -> String {
        self.inner.lock().unwrap().branches[branch].head.clone()
    }

    /// Commit a branch was created from, if the branch exists.
    pub fn branch_base(&self, branch: &str) -> Option<String> {
        self.inner.lock().unwrap().branches.get(branch).map(|b| b.base.clone())
    }

    pub fn pull_requests(&self) -> Vec<PullRequest> {
        self.inner.lock().unwrap().pulls.iter().map(|p| p.pr.clone()).collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn read_file_at(
        &self,
        credential: &Credential,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<RemoteFile, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let branch = git_ref.unwrap_or(DEFAULT_BRANCH);
        inner.record(credential, "read", format!("read {}@{}", path, branch))?;

        let (encoded, version) = inner
            .branches
            .get(branch)
            .and_then(|b| b.files.get(path))
            .ok_or_else(|| StoreError::NotFound(r#"{"message":"Not Found"}"#.to_string()))?;

        Ok(RemoteFile {
            path: path.to_string(),
            content: decode_content(encoded).map_err(|e| StoreError::Unavailable(e.to_string()))?,
            version: version.clone(),
        })
    }

    async fn put_file(
        &self,
        credential: &Credential,
        path: &str,
        content: &[u8],
        version: Option<&Version>,
        branch: Option<&str>,
        _message: &str,
    ) -> Result<RemoteFile, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let branch = branch.unwrap_or(DEFAULT_BRANCH).to_string();
        inner.record(
            credential,
            "put",
            format!("put {}@{} sha={}", path, branch, version.map(Version::as_str).unwrap_or("none")),
        )?;

        let current = inner
            .branches
            .get(&branch)
            .ok_or_else(|| StoreError::NotFound(format!(r#"{{"message":"Branch {} not found"}}"#, branch)))?
            .files
            .get(path)
            .map(|(_, v)| v.clone());

        match (current, version) {
            (Some(current), Some(supplied)) if &current != supplied => {
                return Err(StoreError::Conflict(format!(
                    r#"{{"message":"{} does not match {}"}}"#,
                    path, supplied
                )))
            }
            (Some(_), None) => {
                return Err(StoreError::Conflict(
                    r#"{"message":"Invalid request.\n\n\"sha\" wasn't supplied."}"#.to_string(),
                ))
            }
            (None, Some(supplied)) => {
                return Err(StoreError::Conflict(format!(
                    r#"{{"message":"{} does not match {}"}}"#,
                    path, supplied
                )))
            }
            _ => {}
        }

        let new_version = Version::new(inner.next_id("v"));
        let commit = inner.next_id("c");
        let state = inner.branches.get_mut(&branch).expect("branch checked above");
        state
            .files
            .insert(path.to_string(), (encode_content(content), new_version.clone()));
        state.head = commit;

        Ok(RemoteFile {
            path: path.to_string(),
            content: content.to_vec(),
            version: new_version,
        })
    }

    async fn branch_tip(&self, credential: &Credential, branch: &str) -> Result<String, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.record(credential, "tip", format!("tip {}", branch))?;
        inner
            .branches
            .get(branch)
            .map(|b| b.head.clone())
            .ok_or_else(|| StoreError::NotFound(r#"{"message":"Not Found"}"#.to_string()))
    }

    async fn create_branch(
        &self,
        credential: &Credential,
        name: &str,
        base_commit: &str,
    ) -> Result<Branch, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.record(credential, "branch", format!("branch {} from {}", name, base_commit))?;

        if inner.branches.contains_key(name) {
            return Err(StoreError::Conflict(r#"{"message":"Reference already exists"}"#.to_string()));
        }
        let source = inner
            .branches
            .values()
            .find(|b| b.head == base_commit)
            .cloned()
            .ok_or_else(|| StoreError::Unavailable(r#"{"message":"Object does not exist"}"#.to_string()))?;

        inner.branches.insert(
            name.to_string(),
            BranchState {
                base: base_commit.to_string(),
                head: base_commit.to_string(),
                files: source.files,
            },
        );
        Ok(Branch {
            name: name.to_string(),
            base_commit: base_commit.to_string(),
        })
    }

    async fn open_pull_request(
        &self,
        credential: &Credential,
        head_branch: &str,
        base_branch: &str,
        title: &str,
        _body: &str,
    ) -> Result<PullRequest, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.record(credential, "pull", format!("pull {}->{} title={}", head_branch, base_branch, title))?;

        if !inner.branches.contains_key(head_branch) || !inner.branches.contains_key(base_branch) {
            return Err(StoreError::Unavailable(r#"{"message":"Validation Failed"}"#.to_string()));
        }

        let number = inner.pulls.iter().map(|p| p.pr.number).max().unwrap_or(0) + 1;
        let pr = PullRequest {
            number,
            url: format!("https://github.test/acme/site/pull/{}", number),
            head_branch: head_branch.to_string(),
            base_branch: base_branch.to_string(),
            state: PullRequestState::Open,
        };
        inner.pulls.push(StoredPullRequest {
            pr: pr.clone(),
            title: title.to_string(),
        });
        Ok(pr)
    }

    async fn merge_pull_request(
        &self,
        credential: &Credential,
        number: u64,
    ) -> Result<MergedPullRequest, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.record(credential, "merge", format!("merge #{}", number))?;

        let index = inner
            .pulls
            .iter()
            .position(|p| p.pr.number == number)
            .ok_or_else(|| StoreError::NotFound(r#"{"message":"Not Found"}"#.to_string()))?;
        if inner.pulls[index].pr.state != PullRequestState::Open {
            return Err(StoreError::Unavailable(
                r#"{"message":"Pull Request is not mergeable"}"#.to_string(),
            ));
        }

        let head = inner.pulls[index].pr.head_branch.clone();
        let base = inner.pulls[index].pr.base_branch.clone();
        let files = inner.branches[&head].files.clone();
        let commit = inner.next_id("m");
        let target = inner.branches.get_mut(&base).expect("base branch exists");
        target.files.extend(files);
        target.head = commit.clone();
        inner.pulls[index].pr.state = PullRequestState::Merged;

        Ok(MergedPullRequest {
            number,
            merge_commit: commit,
            message: "Pull Request successfully merged".to_string(),
        })
    }

    fn default_branch(&self) -> &str {
        DEFAULT_BRANCH
    }
}

#[async_trait]
impl RepositoryBrowser for MemoryStore {
    async fn check_repository(&self, credential: &Credential) -> Result<(), StoreError> {
        self.inner.lock().unwrap().record(credential, "repo", "repo".to_string())
    }

    async fn authenticated_user(&self, credential: &Credential) -> Result<String, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.record(credential, "user", "user".to_string())?;
        Ok(inner.login.clone())
    }

    async fn list_directory(
        &self,
        credential: &Credential,
        path: &str,
    ) -> Result<Vec<DirectoryEntry>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.record(credential, "list", format!("list {}", path))?;

        let mut entries: Vec<DirectoryEntry> = inner.branches[DEFAULT_BRANCH]
            .files
            .iter()
            .filter(|(p, _)| !p.contains('/'))
            .map(|(p, (_, version))| DirectoryEntry {
                name: p.clone(),
                path: p.clone(),
                kind: "file".to_string(),
                sha: version.to_string(),
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn list_open_pull_requests(
        &self,
        credential: &Credential,
    ) -> Result<Vec<PullRequestSummary>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.record(credential, "pulls", "pulls".to_string())?;
        Ok(inner
            .pulls
            .iter()
            .filter(|p| p.pr.state == PullRequestState::Open)
            .map(|p| PullRequestSummary {
                number: p.pr.number,
                title: p.title.clone(),
                url: p.pr.url.clone(),
                head: p.pr.head_branch.clone(),
            })
            .collect())
    }
}

pub fn test_settings() -> Arc<Settings> {
    Arc::new(Settings {
        github: GitHubSettings {
            owner: "acme".to_string(),
            repo: "site".to_string(),
            ..GitHubSettings::default()
        },
        ..Settings::default()
    })
}

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub state: AppState,
}

impl TestContext {
    pub fn new(process_token: Option<&str>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(
            test_settings(),
            TokenResolver::new(process_token.map(str::to_string)),
            store.clone(),
            store.clone(),
        );
        Self { store, state }
    }
}

pub fn setup_test_context(process_token: Option<&str>) -> TestContext {
    TestContext::new(process_token)
}

use log::{error, info};
use std::sync::Arc;

use crate::models::WorkflowResult;
use crate::services::content_store::{ContentStore, RemoteFile, StoreError, Version};
use crate::utils::auth::Credential;

pub const COMMIT_SUCCESS: &str = "Committed successfully!";

/// Writes a single file straight onto the default branch.
pub struct CommitWorkflow {
    store: Arc<dyn ContentStore>,
}

impl CommitWorkflow {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    pub async fn commit(
        &self,
        credential: Option<&Credential>,
        path: &str,
        content: &[u8],
        supplied_version: Option<&str>,
    ) -> WorkflowResult {
        match self.execute(credential, path, content, supplied_version).await {
            Ok(file) => {
                info!("Committed {} (version {})", file.path, file.version);
                WorkflowResult::success(COMMIT_SUCCESS)
            }
            Err(e) => {
                error!("Commit of {} failed: {}", path, e);
                e.into()
            }
        }
    }

    pub async fn execute(
        &self,
        credential: Option<&Credential>,
        path: &str,
        content: &[u8],
        supplied_version: Option<&str>,
    ) -> Result<RemoteFile, StoreError> {
        let credential = credential.ok_or(StoreError::Unauthenticated)?;
        let version = supplied_version
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(Version::new);

        self.store
            .write_file(credential, path, content, version, &format!("Update {}", path))
            .await
    }
}

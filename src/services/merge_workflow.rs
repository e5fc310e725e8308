use log::{error, info};
use std::sync::Arc;

use crate::models::WorkflowResult;
use crate::services::content_store::{ContentStore, StoreError};
use crate::utils::auth::Credential;

/// Merges an open pull request. Mergeability is left entirely to the store.
pub struct MergeWorkflow {
    store: Arc<dyn ContentStore>,
}

impl MergeWorkflow {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    pub async fn merge(&self, credential: Option<&Credential>, pr_number: u64) -> WorkflowResult {
        let Some(credential) = credential else {
            return StoreError::Unauthenticated.into();
        };

        match self.store.merge_pull_request(credential, pr_number).await {
            Ok(merged) => {
                info!("PR #{} merged as {}", merged.number, merged.merge_commit);
                WorkflowResult::success(format!("PR #{} merged successfully!", merged.number))
            }
            Err(e) => {
                error!("Merge of PR #{} failed: {}", pr_number, e);
                e.into()
            }
        }
    }
}

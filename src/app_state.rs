use std::sync::Arc;

use crate::config::Settings;
use crate::services::{
    CommitWorkflow, ContentStore, ImageProxy, MergeWorkflow, PrWorkflow, RepositoryBrowser,
};
use crate::utils::auth::{Credential, TokenResolver};

/// Shared per-process state. Everything here is read-only after start-up.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub token_resolver: Arc<TokenResolver>,
    pub store: Arc<dyn ContentStore>,
    pub browser: Arc<dyn RepositoryBrowser>,
    pub commit_workflow: Arc<CommitWorkflow>,
    pub pr_workflow: Arc<PrWorkflow>,
    pub merge_workflow: Arc<MergeWorkflow>,
    pub image_proxy: Arc<ImageProxy>,
}

impl AppState {
    pub fn new(
        settings: Arc<Settings>,
        token_resolver: TokenResolver,
        store: Arc<dyn ContentStore>,
        browser: Arc<dyn RepositoryBrowser>,
    ) -> Self {
        Self {
            commit_workflow: Arc::new(CommitWorkflow::new(store.clone())),
            pr_workflow: Arc::new(PrWorkflow::new(store.clone())),
            merge_workflow: Arc::new(MergeWorkflow::new(store.clone())),
            image_proxy: Arc::new(ImageProxy::new(store.clone(), settings.clone())),
            settings,
            token_resolver: Arc::new(token_resolver),
            store,
            browser,
        }
    }

    pub fn resolve_credential(&self, body_token: Option<&str>, query_token: Option<&str>) -> Option<Credential> {
        self.token_resolver.resolve(body_token, query_token)
    }
}

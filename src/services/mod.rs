pub mod commit_workflow;
pub mod content_store;
pub mod github;
pub mod image_proxy;
pub mod merge_workflow;
pub mod pr_workflow;

pub use commit_workflow::CommitWorkflow;
pub use content_store::{ContentStore, RepositoryBrowser, StoreError};
pub use image_proxy::ImageProxy;
pub use merge_workflow::MergeWorkflow;
pub use pr_workflow::PrWorkflow;

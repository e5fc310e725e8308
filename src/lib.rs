extern crate log;

// Declare modules
pub mod app_state;
pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
pub mod tests;

// Public re-exports
pub use app_state::AppState;
pub use config::Settings;
pub use models::WorkflowResult;
pub use services::content_store::{ContentStore, RemoteFile, RepositoryBrowser, StoreError, Version};
pub use services::github::GitHubStore;
pub use utils::auth::{Credential, TokenResolver};

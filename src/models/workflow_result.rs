use serde::Serialize;

use crate::services::content_store::StoreError;

/// Outcome envelope returned by every mutating endpoint: exactly one of
/// `{"success": ...}` or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowResult {
    Success(String),
    Error(String),
}

impl WorkflowResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self::Success(message.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success(msg) | Self::Error(msg) => msg,
        }
    }
}

impl From<StoreError> for WorkflowResult {
    fn from(err: StoreError) -> Self {
        Self::Error(err.to_string())
    }
}

impl From<Result<String, StoreError>> for WorkflowResult {
    fn from(result: Result<String, StoreError>) -> Self {
        match result {
            Ok(message) => Self::Success(message),
            Err(err) => err.into(),
        }
    }
}

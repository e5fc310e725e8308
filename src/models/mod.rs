pub mod requests;
pub mod workflow_result;

pub use requests::{
    CommitRequest, CreatePrRequest, ImageQuery, MergePrRequest, TokenBody, TokenQuery,
    UploadImageRequest,
};
pub use workflow_result::WorkflowResult;

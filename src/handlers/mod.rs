pub mod auth_handler;
pub mod content_handler;
pub mod image_handler;
pub mod listing_handler;

use actix_web::{error, web, HttpResponse};
use log::warn;

use crate::models::WorkflowResult;
use crate::services::StoreError;

// Configure all routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.configure(auth_handler::config)
        .configure(content_handler::config)
        .configure(image_handler::config)
        .configure(listing_handler::config);
}

/// JSON extractor settings: the size limit, and malformed bodies answered
/// with the usual `{error}` envelope instead of a bare 400.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default().limit(limit).error_handler(|err, _req| {
        warn!("Rejected request body: {}", err);
        let response = HttpResponse::Ok().json(WorkflowResult::error(format!("Invalid request: {}", err)));
        error::InternalError::from_response(err, response).into()
    })
}

/// Status mapping for the read-only endpoints, which do use HTTP status codes.
pub(crate) fn store_error_response(err: &StoreError) -> HttpResponse {
    let body = WorkflowResult::error(err.to_string());
    match err {
        StoreError::Unauthenticated => HttpResponse::Unauthorized().json(body),
        StoreError::NotFound(_) => HttpResponse::NotFound().json(body),
        StoreError::Conflict(_) | StoreError::Unavailable(_) => HttpResponse::BadGateway().json(body),
    }
}

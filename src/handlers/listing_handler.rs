use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::handlers::store_error_response;
use crate::models::TokenQuery;
use crate::services::StoreError;
use crate::AppState;

pub async fn list_files(state: web::Data<AppState>, query: web::Query<TokenQuery>) -> HttpResponse {
    let Some(credential) = state.resolve_credential(None, query.token.as_deref()) else {
        return store_error_response(&StoreError::Unauthenticated);
    };

    match state.browser.list_directory(&credential, "").await {
        Ok(entries) => HttpResponse::Ok().json(entries),
        Err(e) => store_error_response(&e),
    }
}

pub async fn list_pull_requests(state: web::Data<AppState>, query: web::Query<TokenQuery>) -> HttpResponse {
    let Some(credential) = state.resolve_credential(None, query.token.as_deref()) else {
        return store_error_response(&StoreError::Unauthenticated);
    };

    match state.browser.list_open_pull_requests(&credential).await {
        Ok(pulls) => HttpResponse::Ok().json(pulls),
        Err(e) => store_error_response(&e),
    }
}

pub async fn get_file(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<TokenQuery>,
) -> HttpResponse {
    let Some(credential) = state.resolve_credential(None, query.token.as_deref()) else {
        return store_error_response(&StoreError::Unauthenticated);
    };

    match state.store.read_file(&credential, &path).await {
        Ok(file) => HttpResponse::Ok().json(json!({
            "path": file.path,
            "sha": file.version,
            "content": file.text()
        })),
        Err(e) => store_error_response(&e),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/files", web::get().to(list_files))
        .route("/prs", web::get().to(list_pull_requests))
        .route("/file/{path:.*}", web::get().to(get_file));
}

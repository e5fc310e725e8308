use actix_web::{web, HttpResponse};
use log::info;

use crate::models::{CommitRequest, CreatePrRequest, MergePrRequest, TokenQuery};
use crate::services::pr_workflow::PrEdit;
use crate::AppState;

pub async fn commit(
    state: web::Data<AppState>,
    query: web::Query<TokenQuery>,
    request: web::Json<CommitRequest>,
) -> HttpResponse {
    info!("Commit requested for {}", request.file_path);
    let credential = state.resolve_credential(request.token.as_deref(), query.token.as_deref());

    let result = state
        .commit_workflow
        .commit(
            credential.as_ref(),
            &request.file_path,
            request.content.as_bytes(),
            request.sha.as_deref(),
        )
        .await;
    HttpResponse::Ok().json(result)
}

pub async fn create_pr(
    state: web::Data<AppState>,
    query: web::Query<TokenQuery>,
    request: web::Json<CreatePrRequest>,
) -> HttpResponse {
    info!("Pull request requested for {}", request.file_path);
    let credential = state.resolve_credential(request.token.as_deref(), query.token.as_deref());

    let edit = PrEdit {
        path: &request.file_path,
        content: request.content.as_bytes(),
        title: request.title.as_deref(),
        body: request.body.as_deref(),
    };
    let result = state.pr_workflow.create_pr(credential.as_ref(), edit).await;
    HttpResponse::Ok().json(result)
}

pub async fn merge_pr(
    state: web::Data<AppState>,
    query: web::Query<TokenQuery>,
    request: web::Json<MergePrRequest>,
) -> HttpResponse {
    info!("Merge requested for PR #{}", request.pr_number);
    let credential = state.resolve_credential(request.token.as_deref(), query.token.as_deref());

    let result = state.merge_workflow.merge(credential.as_ref(), request.pr_number).await;
    HttpResponse::Ok().json(result)
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/commit", web::post().to(commit))
        .route("/create-pr", web::post().to(create_pr))
        .route("/merge-pr", web::post().to(merge_pr));
}

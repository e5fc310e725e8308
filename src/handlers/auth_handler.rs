use actix_web::{web, HttpResponse};
use log::{error, info};

use crate::models::{TokenBody, TokenQuery, WorkflowResult};
use crate::services::StoreError;
use crate::AppState;

fn body_token(body: &Option<web::Json<TokenBody>>) -> Option<&str> {
    body.as_ref().and_then(|b| b.token.as_deref())
}

/// Connectivity check: can the resolved credential see the repository?
pub async fn check_auth(
    state: web::Data<AppState>,
    query: web::Query<TokenQuery>,
    body: Option<web::Json<TokenBody>>,
) -> HttpResponse {
    let Some(credential) = state.resolve_credential(body_token(&body), query.token.as_deref()) else {
        return HttpResponse::Ok().json(WorkflowResult::from(StoreError::Unauthenticated));
    };

    let result = match state.browser.check_repository(&credential).await {
        Ok(()) => {
            info!("Repository connectivity check passed");
            WorkflowResult::success("Authenticated successfully")
        }
        Err(e) => {
            error!("Repository connectivity check failed: {}", e);
            e.into()
        }
    };
    HttpResponse::Ok().json(result)
}

/// Reports which account the resolved credential belongs to.
pub async fn test_token(
    state: web::Data<AppState>,
    query: web::Query<TokenQuery>,
    body: Option<web::Json<TokenBody>>,
) -> HttpResponse {
    let Some(credential) = state.resolve_credential(body_token(&body), query.token.as_deref()) else {
        return HttpResponse::Ok().json(WorkflowResult::from(StoreError::Unauthenticated));
    };

    let result = match state.browser.authenticated_user(&credential).await {
        Ok(login) => WorkflowResult::success(format!("Logged in as: {}", login)),
        Err(e) => {
            error!("Token check failed: {}", e);
            e.into()
        }
    };
    HttpResponse::Ok().json(result)
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth", web::post().to(check_auth))
        .route("/test-token", web::post().to(test_token));
}

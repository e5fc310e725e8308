use actix_web::{web, HttpResponse};
use log::error;
use serde_json::json;

use crate::models::{ImageQuery, TokenQuery, UploadImageRequest, WorkflowResult};
use crate::services::image_proxy::{ImageError, IMAGE_ROUTE};
use crate::AppState;

pub async fn get_image(state: web::Data<AppState>, query: web::Query<ImageQuery>) -> HttpResponse {
    let credential = state.resolve_credential(None, query.token.as_deref());
    let name = query.name.as_deref().unwrap_or_default();

    match state.image_proxy.fetch_image(credential.as_ref(), name).await {
        Ok(image) => {
            let mut response = HttpResponse::Ok();
            for (name, value) in image.headers {
                response.insert_header((name, value));
            }
            response.body(image.bytes)
        }
        Err(ImageError::Unauthenticated) => {
            HttpResponse::Unauthorized().json(WorkflowResult::error(ImageError::Unauthenticated.to_string()))
        }
        Err(e @ ImageError::NotFound(_)) => HttpResponse::NotFound().json(WorkflowResult::error(e.to_string())),
        Err(e) => {
            error!("Image proxy failed for {}: {}", name, e);
            HttpResponse::BadGateway().json(WorkflowResult::error(e.to_string()))
        }
    }
}

pub async fn upload_image(
    state: web::Data<AppState>,
    query: web::Query<TokenQuery>,
    request: web::Json<UploadImageRequest>,
) -> HttpResponse {
    let credential = state.resolve_credential(request.token.as_deref(), query.token.as_deref());

    match state
        .image_proxy
        .upload_image(credential.as_ref(), &request.filename, &request.content)
        .await
    {
        Ok(uploaded) => HttpResponse::Ok().json(json!({
            "success": "Image uploaded successfully!",
            "url": uploaded.url
        })),
        Err(e) => {
            error!("Image upload of {} failed: {}", request.filename, e);
            HttpResponse::Ok().json(WorkflowResult::from(e))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route(IMAGE_ROUTE, web::get().to(get_image))
        .route("/upload-image", web::post().to(upload_image));
}

//! Serves and stores image assets through the authoritative contents API.
//!
//! Raw CDN URLs for freshly pushed files lag behind the repository, so images
//! are always re-read from the store and returned with headers that forbid
//! caching anywhere along the way.

use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;
use thiserror::Error;

use crate::config::Settings;
use crate::services::content_store::{decode_content, ContentStore, StoreError};
use crate::utils::auth::Credential;

pub const IMAGE_ROUTE: &str = "/og-image.png";

pub const NO_CACHE_HEADERS: [(&str, &str); 3] = [
    ("Cache-Control", "no-cache, no-store, must-revalidate"),
    ("Pragma", "no-cache"),
    ("Expires", "0"),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Image not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Unavailable(String),
}

impl From<StoreError> for ImageError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unauthenticated => ImageError::Unauthenticated,
            StoreError::NotFound(msg) => ImageError::NotFound(msg),
            StoreError::Conflict(msg) | StoreError::Unavailable(msg) => ImageError::Unavailable(msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResponse {
    pub bytes: Vec<u8>,
    pub headers: Vec<(&'static str, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub path: String,
    pub url: String,
}

pub struct ImageProxy {
    store: Arc<dyn ContentStore>,
    settings: Arc<Settings>,
}

impl ImageProxy {
    pub fn new(store: Arc<dyn ContentStore>, settings: Arc<Settings>) -> Self {
        Self { store, settings }
    }

    pub async fn fetch_image(
        &self,
        credential: Option<&Credential>,
        name: &str,
    ) -> Result<ImageResponse, ImageError> {
        let credential = credential.ok_or(ImageError::Unauthenticated)?;
        let name = validate_asset_name(name).map_err(ImageError::NotFound)?;
        let path = self.settings.image_path(name);

        debug!("Proxying image {}", path);
        let file = self.store.read_file(credential, &path).await?;

        let mut headers = vec![("Content-Type", self.settings.github.image_content_type.clone())];
        headers.extend(NO_CACHE_HEADERS.iter().map(|(k, v)| (*k, v.to_string())));

        Ok(ImageResponse {
            bytes: file.content,
            headers,
        })
    }

    /// Stores a base64 (or data-URL) payload under the image directory on the
    /// default branch and returns a cache-busted URL for it.
    pub async fn upload_image(
        &self,
        credential: Option<&Credential>,
        filename: &str,
        encoded: &str,
    ) -> Result<UploadedImage, StoreError> {
        let credential = credential.ok_or(StoreError::Unauthenticated)?;
        let name = validate_asset_name(filename).map_err(StoreError::Unavailable)?;
        let bytes = decode_upload(encoded)
            .map_err(|e| StoreError::Unavailable(format!("Invalid image data: {}", e)))?;

        let path = self.settings.image_path(name);
        let written = self
            .store
            .write_file(credential, &path, &bytes, None, &format!("Upload image {}", name))
            .await?;

        info!("Uploaded {} ({} bytes, version {})", written.path, bytes.len(), written.version);
        Ok(UploadedImage {
            path: written.path,
            url: cache_busted_url(name, Utc::now().timestamp_millis()),
        })
    }
}

/// Rejects names that would escape the image directory.
pub fn validate_asset_name(name: &str) -> Result<&str, String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Image name is required".to_string());
    }
    if trimmed.starts_with('/') || trimmed.contains('\\') || trimmed.split('/').any(|s| s == ".." || s.is_empty()) {
        warn!("Rejected image name {:?}", name);
        return Err(format!("Invalid image name: {}", name));
    }
    Ok(trimmed)
}

pub fn cache_busted_url(name: &str, timestamp_millis: i64) -> String {
    format!("{}?name={}&t={}", IMAGE_ROUTE, urlencoding::encode(name), timestamp_millis)
}

fn decode_upload(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };
    decode_content(payload)
}

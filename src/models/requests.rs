use serde::Deserialize;

/// Query parameters accepted by every endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

/// Body of credential-only endpoints (`/auth`, `/test-token`).
#[derive(Debug, Default, Deserialize)]
pub struct TokenBody {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub content: String,
    pub file_path: String,
    pub sha: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub content: String,
    pub file_path: String,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergePrRequest {
    pub pr_number: u64,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadImageRequest {
    /// Base64 payload, optionally as a `data:<type>;base64,` URL.
    pub content: String,
    pub filename: String,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    /// Missing names are answered by the proxy, not rejected by the extractor.
    #[serde(default)]
    pub name: Option<String>,
    pub token: Option<String>,
}

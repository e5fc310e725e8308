use log::{debug, info};
use reqwest::Method;
use std::sync::Arc;

use super::api::GitHubClient;
use super::types::{ContentEntry, ContentResponse, WriteFileRequest, WriteFileResponse};
use crate::services::content_store::{
    decode_content, encode_content, DirectoryEntry, RemoteFile, StoreError, Version,
};
use crate::utils::auth::Credential;

/// Handles GitHub contents API operations
#[derive(Clone)]
pub struct ContentAPI {
    client: Arc<GitHubClient>,
}

impl ContentAPI {
    pub fn new(client: Arc<GitHubClient>) -> Self {
        Self { client }
    }

    async fn fetch_metadata(
        &self,
        credential: &Credential,
        path: &str,
        git_ref: Option<&str>,
        operation: &str,
    ) -> Result<ContentResponse, StoreError> {
        let url = self.client.contents_url(path);
        debug!("{} of {} at {}", operation, path, git_ref.unwrap_or(self.client.default_branch()));

        let mut request = self.client.request(Method::GET, &url, credential);
        if let Some(git_ref) = git_ref {
            request = request.query(&[("ref", git_ref)]);
        }

        self.client.send_json(request, operation).await
    }

    pub async fn read_file(
        &self,
        credential: &Credential,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<RemoteFile, StoreError> {
        let file = self.fetch_metadata(credential, path, git_ref, "file read").await?;
        let encoded = match (file.content, file.encoding.as_deref()) {
            (Some(content), Some("base64")) | (Some(content), None) => content,
            (_, encoding) => {
                return Err(StoreError::Unavailable(format!(
                    "File {} has no inline base64 content (encoding: {})",
                    path,
                    encoding.unwrap_or("none")
                )))
            }
        };

        let content = decode_content(&encoded)
            .map_err(|e| StoreError::Unavailable(format!("Invalid base64 content for {}: {}", path, e)))?;

        Ok(RemoteFile {
            path: file.path,
            content,
            version: Version::new(file.sha),
        })
    }

    /// Only the `sha` is used, so files served without inline content
    /// (over the contents API size limit) still resolve.
    pub async fn file_version(
        &self,
        credential: &Credential,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Version, StoreError> {
        let file = self.fetch_metadata(credential, path, git_ref, "version lookup").await?;
        Ok(Version::new(file.sha))
    }

    pub async fn put_file(
        &self,
        credential: &Credential,
        path: &str,
        content: &[u8],
        version: Option<&Version>,
        branch: Option<&str>,
        message: &str,
    ) -> Result<RemoteFile, StoreError> {
        let url = self.client.contents_url(path);
        let body = WriteFileRequest {
            message,
            content: encode_content(content),
            sha: version.map(Version::as_str),
            branch,
        };

        let written: WriteFileResponse = self
            .client
            .send_json(self.client.request(Method::PUT, &url, credential).json(&body), "file write")
            .await?;

        info!(
            "Wrote {} on {} (version {})",
            written.content.path,
            branch.unwrap_or(self.client.default_branch()),
            written.content.sha
        );

        Ok(RemoteFile {
            path: written.content.path,
            content: content.to_vec(),
            version: Version::new(written.content.sha),
        })
    }

    pub async fn list_directory(
        &self,
        credential: &Credential,
        path: &str,
    ) -> Result<Vec<DirectoryEntry>, StoreError> {
        let url = if path.trim_matches('/').is_empty() {
            self.client.repo_url("/contents")
        } else {
            self.client.contents_url(path)
        };

        let entries: Vec<ContentEntry> = self
            .client
            .send_json(self.client.request(Method::GET, &url, credential), "directory listing")
            .await?;

        Ok(entries
            .into_iter()
            .map(|entry| DirectoryEntry {
                name: entry.name,
                path: entry.path,
                kind: entry.kind,
                sha: entry.sha,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GitHubSettings;
    use mockito::Matcher;
    use serde_json::json;

    fn content_api(url: &str) -> ContentAPI {
        let settings = GitHubSettings {
            api_url: url.to_string(),
            owner: "acme".to_string(),
            repo: "site".to_string(),
            ..GitHubSettings::default()
        };
        ContentAPI::new(Arc::new(GitHubClient::new(&settings).unwrap()))
    }

    #[tokio::test]
    async fn test_read_file_decodes_wrapped_base64() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/acme/site/contents/docs/a.txt")
            .match_query(Matcher::UrlEncoded("ref".into(), "feature".into()))
            .with_status(200)
            .with_body(
                json!({"path": "docs/a.txt", "sha": "abc123", "content": "aGVs\nbG8=\n", "encoding": "base64"})
                    .to_string(),
            )
            .create_async()
            .await;

        let api = content_api(&server.url());
        let file = api
            .read_file(&Credential::new("t"), "docs/a.txt", Some("feature"))
            .await
            .unwrap();

        assert_eq!(file.content, b"hello");
        assert_eq!(file.version, Version::new("abc123"));
        assert_eq!(file.text(), "hello");
    }

    #[tokio::test]
    async fn test_read_missing_file_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/acme/site/contents/a.txt")
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;

        let err = content_api(&server.url())
            .read_file(&Credential::new("t"), "a.txt", None)
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound(r#"{"message":"Not Found"}"#.to_string()));
    }

    #[tokio::test]
    async fn test_version_lookup_ignores_missing_inline_content() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/acme/site/contents/images/big.png")
            .with_status(200)
            .with_body(json!({"path": "images/big.png", "sha": "v1", "content": "", "encoding": "none"}).to_string())
            .create_async()
            .await;

        let api = content_api(&server.url());
        let version = api
            .file_version(&Credential::new("t"), "images/big.png", None)
            .await
            .unwrap();
        assert_eq!(version, Version::new("v1"));

        let err = api
            .read_file(&Credential::new("t"), "images/big.png", None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_put_file_sends_version_and_branch() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PUT", "/repos/acme/site/contents/images/og.png")
            .match_body(Matcher::Json(json!({
                "message": "Upload og.png",
                "content": encode_content(&[0x89, 0x50, 0x00, 0xff]),
                "sha": "old",
                "branch": "update-og-1"
            })))
            .with_status(200)
            .with_body(json!({"content": {"path": "images/og.png", "sha": "new"}, "commit": {"sha": "c1"}}).to_string())
            .create_async()
            .await;

        let written = content_api(&server.url())
            .put_file(
                &Credential::new("t"),
                "images/og.png",
                &[0x89, 0x50, 0x00, 0xff],
                Some(&Version::new("old")),
                Some("update-og-1"),
                "Upload og.png",
            )
            .await
            .unwrap();

        assert_eq!(written.version, Version::new("new"));
        assert_eq!(written.content, vec![0x89, 0x50, 0x00, 0xff]);
    }

    #[tokio::test]
    async fn test_put_file_without_version_omits_sha() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PUT", "/repos/acme/site/contents/a.txt")
            .match_body(Matcher::Json(json!({"message": "Update a.txt", "content": "aGVsbG8="})))
            .with_status(201)
            .with_body(json!({"content": {"path": "a.txt", "sha": "v1"}}).to_string())
            .create_async()
            .await;

        let written = content_api(&server.url())
            .put_file(&Credential::new("t"), "a.txt", b"hello", None, None, "Update a.txt")
            .await
            .unwrap();
        assert_eq!(written.version.as_str(), "v1");
    }

    #[tokio::test]
    async fn test_stale_version_is_conflict() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"{"message":"a.txt does not match 1234"}"#;
        let _mock = server
            .mock("PUT", "/repos/acme/site/contents/a.txt")
            .with_status(409)
            .with_body(body)
            .create_async()
            .await;

        let err = content_api(&server.url())
            .put_file(&Credential::new("t"), "a.txt", b"x", Some(&Version::new("stale")), None, "m")
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Conflict(body.to_string()));
    }

    #[tokio::test]
    async fn test_list_root_directory() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/acme/site/contents")
            .with_status(200)
            .with_body(
                json!([
                    {"name": "index.html", "path": "index.html", "type": "file", "sha": "s1"},
                    {"name": "images", "path": "images", "type": "dir", "sha": "s2"}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let entries = content_api(&server.url())
            .list_directory(&Credential::new("t"), "")
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].kind, "dir");
    }
}

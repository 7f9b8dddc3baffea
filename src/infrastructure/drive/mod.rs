//! Google Drive remote store adapter
//!
//! Speaks the Drive v3 files API: list-by-name (non-trashed), create,
//! download with `alt=media`, and whole-content replace with
//! `uploadType=media`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::ports::{RemoteError, RemoteFileId, RemoteStore, TokenSource};

/// Drive metadata/API base URL
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Drive content-upload base URL
pub const DEFAULT_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Serialize)]
struct CreateFileRequest {
    name: String,
    #[serde(rename = "mimeType")]
    mime_type: String,
}

/// Remote store backed by Google Drive.
pub struct DriveStore {
    client: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
    api_base: String,
    upload_base: String,
}

impl DriveStore {
    pub fn new(tokens: Arc<dyn TokenSource>) -> Self {
        Self::with_base_urls(tokens, DEFAULT_API_BASE, DEFAULT_UPLOAD_BASE)
    }

    /// Create with custom base URLs (tests point these at a mock server)
    pub fn with_base_urls(
        tokens: Arc<dyn TokenSource>,
        api_base: impl Into<String>,
        upload_base: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            tokens,
            api_base: api_base.into(),
            upload_base: upload_base.into(),
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(RemoteError::Unauthorized);
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RemoteError::ApiError {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

fn request_failed(e: reqwest::Error) -> RemoteError {
    RemoteError::RequestFailed(e.to_string())
}

#[async_trait]
impl RemoteStore for DriveStore {
    async fn find_file(&self, name: &str) -> Result<Option<RemoteFileId>, RemoteError> {
        let token = self.tokens.token().await?;
        let query = format!("name='{name}' and trashed=false");

        let response = self
            .client
            .get(format!("{}/files", self.api_base))
            .query(&[
                ("q", query.as_str()),
                ("spaces", "drive"),
                ("fields", "files(id,name)"),
            ])
            .bearer_auth(&token)
            .send()
            .await
            .map_err(request_failed)?;
        let response = Self::check(response).await?;

        let list: FileList = response
            .json()
            .await
            .map_err(|e| RemoteError::ParseError(e.to_string()))?;
        Ok(list.files.into_iter().next().map(|f| RemoteFileId(f.id)))
    }

    async fn create_file(&self, name: &str) -> Result<RemoteFileId, RemoteError> {
        let token = self.tokens.token().await?;

        let response = self
            .client
            .post(format!("{}/files", self.api_base))
            .query(&[("fields", "id")])
            .bearer_auth(&token)
            .json(&CreateFileRequest {
                name: name.to_string(),
                mime_type: "text/plain".to_string(),
            })
            .send()
            .await
            .map_err(request_failed)?;
        let response = Self::check(response).await?;

        let file: DriveFile = response
            .json()
            .await
            .map_err(|e| RemoteError::ParseError(e.to_string()))?;
        let id = RemoteFileId(file.id);

        // Materialize empty content so the file exists with the right mime
        self.upload(&id, "").await?;
        Ok(id)
    }

    async fn download(&self, id: &RemoteFileId) -> Result<String, RemoteError> {
        let token = self.tokens.token().await?;

        let response = self
            .client
            .get(format!("{}/files/{}", self.api_base, id))
            .query(&[("alt", "media")])
            .bearer_auth(&token)
            .send()
            .await
            .map_err(request_failed)?;
        let response = Self::check(response).await?;

        response.text().await.map_err(request_failed)
    }

    async fn upload(&self, id: &RemoteFileId, content: &str) -> Result<(), RemoteError> {
        let token = self.tokens.token().await?;

        let response = self
            .client
            .patch(format!("{}/files/{}", self.upload_base, id))
            .query(&[("uploadType", "media")])
            .bearer_auth(&token)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(content.to_string())
            .send()
            .await
            .map_err(request_failed)?;
        Self::check(response).await?;
        Ok(())
    }
}

/// Token source handing out a fixed token from settings.
pub struct StaticTokenSource {
    token: Option<String>,
}

impl StaticTokenSource {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn token(&self) -> Result<String, RemoteError> {
        self.token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or(RemoteError::NoToken)
    }
}

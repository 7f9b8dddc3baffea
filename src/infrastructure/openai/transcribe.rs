//! OpenAI audio transcription adapter

use async_trait::async_trait;
use serde::Deserialize;

use crate::application::ports::{TranscribeError, Transcriber};

/// OpenAI-compatible API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Transcriber backed by the `/audio/transcriptions` endpoint.
pub struct OpenAiTranscriber {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiTranscriber {
    /// Create a new transcriber with the given API key and model
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    /// Create with a custom base URL (tests point this at a mock server)
    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/transcriptions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        file_name: &str,
    ) -> Result<String, TranscribeError> {
        if self.api_key.is_empty() {
            return Err(TranscribeError::MissingApiKey);
        }

        let part = reqwest::multipart::Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str("audio/flac")
            .map_err(|e| TranscribeError::RequestFailed(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .text("model", self.model.clone())
            .part("file", part);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscribeError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(TranscribeError::InvalidApiKey);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TranscribeError::RateLimited);
        }
        if status.is_server_error() {
            return Err(TranscribeError::ServerError(status.as_u16()));
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TranscribeError::ApiError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| TranscribeError::ParseError(e.to_string()))?;

        Ok(body.text)
    }
}

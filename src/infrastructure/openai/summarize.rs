//! OpenAI chat summarization adapter
//!
//! Asks the chat completions endpoint for a structured JSON response with
//! a short title and a summary body.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::ports::{SummarizeError, Summarizer};
use crate::domain::record::Summary;

use super::transcribe::DEFAULT_BASE_URL;

const SYSTEM_PROMPT: &str = "Summarise the following transcript. Respond ONLY in JSON with keys \
'title' (max 10 words) and 'summary'. Example: {\"title\":\"My Title\",\"summary\":\"The summary...\"}";

// Request types for the chat completions API

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

// Response types for the chat completions API

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// The structured payload the model is instructed to produce
#[derive(Debug, Deserialize)]
struct SummaryJson {
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
}

/// Summarizer backed by the `/chat/completions` endpoint.
pub struct OpenAiSummarizer {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiSummarizer {
    /// Create a new summarizer with the given API key and model
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
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn build_request(&self, transcript: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: transcript.to_string(),
                },
            ],
        }
    }

    fn parse_summary(content: &str) -> Result<Summary, SummarizeError> {
        let parsed: SummaryJson = serde_json::from_str(content)
            .map_err(|e| SummarizeError::ParseError(format!("summary is not JSON: {e}")))?;
        Ok(Summary::new(parsed.title, parsed.summary))
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, transcript: &str) -> Result<Summary, SummarizeError> {
        if self.api_key.is_empty() {
            return Err(SummarizeError::MissingApiKey);
        }

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.build_request(transcript))
            .send()
            .await
            .map_err(|e| SummarizeError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(SummarizeError::InvalidApiKey);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SummarizeError::RateLimited);
        }
        if status.is_server_error() {
            return Err(SummarizeError::ServerError(status.as_u16()));
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SummarizeError::ApiError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| SummarizeError::ParseError(e.to_string()))?;

        let content = body
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| SummarizeError::ParseError("response has no choices".to_string()))?;

        Self::parse_summary(content)
    }
}

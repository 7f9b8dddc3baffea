//! HTTP adapter tests against a mock server
//!
//! Exercises the OpenAI and Drive adapters' request shapes, response
//! parsing, and status-code classification.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lifelog::application::ports::{
    RemoteError, RemoteFileId, RemoteStore, SummarizeError, Summarizer, TokenSource,
    TranscribeError, Transcriber,
};
use lifelog::infrastructure::{DriveStore, OpenAiSummarizer, OpenAiTranscriber, StaticTokenSource};

fn tokens() -> Arc<dyn TokenSource> {
    Arc::new(StaticTokenSource::new(Some("drive-token".to_string())))
}

// ---------- transcription ----------

#[tokio::test]
async fn transcriber_returns_text_on_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "hello world"})))
        .expect(1)
        .mount(&server)
        .await;

    let transcriber = OpenAiTranscriber::with_base_url("sk-test", "gpt-4o-transcribe", server.uri());
    let text = transcriber
        .transcribe(b"fake flac".to_vec(), "rec_1.flac")
        .await
        .unwrap();
    assert_eq!(text, "hello world");
}

#[tokio::test]
async fn transcriber_classifies_auth_failure_as_permanent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let transcriber = OpenAiTranscriber::with_base_url("sk-bad", "gpt-4o-transcribe", server.uri());
    let err = transcriber
        .transcribe(b"audio".to_vec(), "rec_1.flac")
        .await
        .unwrap_err();
    assert!(matches!(err, TranscribeError::InvalidApiKey));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn transcriber_classifies_server_error_as_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let transcriber = OpenAiTranscriber::with_base_url("sk-test", "gpt-4o-transcribe", server.uri());
    let err = transcriber
        .transcribe(b"audio".to_vec(), "rec_1.flac")
        .await
        .unwrap_err();
    assert!(matches!(err, TranscribeError::ServerError(503)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn transcriber_classifies_rate_limit_as_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let transcriber = OpenAiTranscriber::with_base_url("sk-test", "gpt-4o-transcribe", server.uri());
    let err = transcriber
        .transcribe(b"audio".to_vec(), "rec_1.flac")
        .await
        .unwrap_err();
    assert!(matches!(err, TranscribeError::RateLimited));
    assert!(err.is_transient());
}

// ---------- summarization ----------

#[tokio::test]
async fn summarizer_parses_structured_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "content": "{\"title\":\"Morning notes\",\"summary\":\"Talked about plans.\"}"
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let summarizer = OpenAiSummarizer::with_base_url("sk-test", "gpt-4.1", server.uri());
    let summary = summarizer.summarize("the transcript").await.unwrap();
    assert_eq!(summary.title, "Morning notes");
    assert_eq!(summary.body, "Talked about plans.");
}

#[tokio::test]
async fn summarizer_rejects_unstructured_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "Here is your summary: plans."}}]
        })))
        .mount(&server)
        .await;

    let summarizer = OpenAiSummarizer::with_base_url("sk-test", "gpt-4.1", server.uri());
    let err = summarizer.summarize("the transcript").await.unwrap_err();
    assert!(matches!(err, SummarizeError::ParseError(_)));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn summarizer_classifies_server_error_as_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let summarizer = OpenAiSummarizer::with_base_url("sk-test", "gpt-4.1", server.uri());
    let err = summarizer.summarize("the transcript").await.unwrap_err();
    assert!(err.is_transient());
}

// ---------- remote store ----------

#[tokio::test]
async fn drive_find_file_returns_first_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("q", "name='summaries.txt' and trashed=false"))
        .and(query_param("spaces", "drive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{"id": "abc123", "name": "summaries.txt"}]
        })))
        .mount(&server)
        .await;

    let drive = DriveStore::with_base_urls(tokens(), server.uri(), server.uri());
    let id = drive.find_file("summaries.txt").await.unwrap();
    assert_eq!(id, Some(RemoteFileId("abc123".to_string())));
}

#[tokio::test]
async fn drive_find_file_returns_none_when_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"files": []})))
        .mount(&server)
        .await;

    let drive = DriveStore::with_base_urls(tokens(), server.uri(), server.uri());
    assert_eq!(drive.find_file("summaries.txt").await.unwrap(), None);
}

#[tokio::test]
async fn drive_create_file_materializes_empty_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "new-id"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/files/new-id"))
        .and(query_param("uploadType", "media"))
        .and(body_string(""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "new-id"})))
        .expect(1)
        .mount(&server)
        .await;

    let drive = DriveStore::with_base_urls(tokens(), server.uri(), server.uri());
    let id = drive.create_file("transcripts.txt").await.unwrap();
    assert_eq!(id, RemoteFileId("new-id".to_string()));
}

#[tokio::test]
async fn drive_download_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/abc"))
        .and(query_param("alt", "media"))
        .respond_with(ResponseTemplate::new(200).set_body_string("100,A|a\n200,B|b"))
        .mount(&server)
        .await;

    let drive = DriveStore::with_base_urls(tokens(), server.uri(), server.uri());
    let body = drive.download(&RemoteFileId("abc".to_string())).await.unwrap();
    assert_eq!(body, "100,A|a\n200,B|b");
}

#[tokio::test]
async fn drive_upload_replaces_content() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/files/abc"))
        .and(query_param("uploadType", "media"))
        .and(header("content-type", "text/plain"))
        .and(body_string("100,A|a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "abc"})))
        .expect(1)
        .mount(&server)
        .await;

    let drive = DriveStore::with_base_urls(tokens(), server.uri(), server.uri());
    drive
        .upload(&RemoteFileId("abc".to_string()), "100,A|a")
        .await
        .unwrap();
}

#[tokio::test]
async fn drive_unauthorized_maps_to_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/abc"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let drive = DriveStore::with_base_urls(tokens(), server.uri(), server.uri());
    let err = drive
        .download(&RemoteFileId("abc".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Unauthorized));
}

#[tokio::test]
async fn drive_without_token_never_hits_the_network() {
    let server = MockServer::start().await;
    // No mocks mounted: any request would 404 and fail the test through
    // the error variant below.
    let no_token: Arc<dyn TokenSource> = Arc::new(StaticTokenSource::new(None));
    let drive = DriveStore::with_base_urls(no_token, server.uri(), server.uri());

    let err = drive.find_file("summaries.txt").await.unwrap_err();
    assert!(matches!(err, RemoteError::NoToken));
}

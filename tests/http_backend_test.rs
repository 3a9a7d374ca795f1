//! HTTP backend integration tests
//!
//! Runs `HttpBackend` against a `wiremock` server and checks the request
//! shapes and the normalization of every failure mode into a
//! `TransportFailure`.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use docchat::transport::{AskRequest, Backend, FileUpload, HttpBackend, UNKNOWN_ERROR};

fn make_backend(base_url: &str) -> HttpBackend {
    HttpBackend::new(base_url, Duration::from_secs(5)).expect("valid backend url")
}

fn report() -> FileUpload {
    FileUpload::new("report.pdf", b"%PDF-1.4 fake".to_vec())
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_upload_sends_multipart_file_field() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header_exists("content-type"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"report.pdf\""))
        .and(body_string_contains("application/pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "PDF uploaded and processed successfully",
            "pdf_id": "3f2c",
            "filename": "report.pdf"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let receipt = make_backend(&server.uri())
        .upload(report())
        .await
        .expect("upload should succeed");

    assert_eq!(receipt.document_id, "3f2c");
    assert_eq!(receipt.filename.as_deref(), Some("report.pdf"));
}

#[tokio::test]
async fn test_upload_accepts_minimal_receipt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "pdf_id": "only-id" })))
        .mount(&server)
        .await;

    let receipt = make_backend(&server.uri()).upload(report()).await.unwrap();
    assert_eq!(receipt.document_id, "only-id");
    assert!(receipt.message.is_none());
}

#[tokio::test]
async fn test_upload_error_uses_detail() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "detail": "Only PDF files are allowed" })),
        )
        .mount(&server)
        .await;

    let failure = make_backend(&server.uri())
        .upload(report())
        .await
        .unwrap_err();

    assert_eq!(failure.message, "Only PDF files are allowed");
    assert_eq!(failure.status, Some(400));
}

#[tokio::test]
async fn test_error_body_not_json_is_unknown_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(
            ResponseTemplate::new(502)
                .set_body_raw(b"<html>Bad Gateway</html>".to_vec(), "text/html"),
        )
        .mount(&server)
        .await;

    let failure = make_backend(&server.uri())
        .upload(report())
        .await
        .unwrap_err();

    assert_eq!(failure.message, UNKNOWN_ERROR);
    assert_eq!(failure.status, Some(502));
}

#[tokio::test]
async fn test_error_json_without_detail_describes_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "boom" })))
        .mount(&server)
        .await;

    let failure = make_backend(&server.uri())
        .upload(report())
        .await
        .unwrap_err();

    assert_eq!(failure.message, "HTTP error! status: 500");
}

#[tokio::test]
async fn test_validation_error_list_detail_describes_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{ "loc": ["body", "question"], "msg": "field required" }]
        })))
        .mount(&server)
        .await;

    let failure = make_backend(&server.uri())
        .ask(AskRequest::new("doc-1", "q"))
        .await
        .unwrap_err();

    assert_eq!(failure.message, "HTTP error! status: 422");
}

// ---------------------------------------------------------------------------
// Ask
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_ask_sends_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ask"))
        .and(body_json(json!({
            "pdf_id": "3f2c",
            "question": "What is the total?"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "$500" })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = make_backend(&server.uri())
        .ask(AskRequest::new("3f2c", "What is the total?"))
        .await
        .expect("ask should succeed");

    assert_eq!(answer.answer, "$500");
}

#[tokio::test]
async fn test_ask_not_found_detail() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "detail": "PDF with ID 'gone' not found" })),
        )
        .mount(&server)
        .await;

    let failure = make_backend(&server.uri())
        .ask(AskRequest::new("gone", "anything"))
        .await
        .unwrap_err();

    assert_eq!(failure.message, "PDF with ID 'gone' not found");
    assert_eq!(failure.status, Some(404));
}

#[tokio::test]
async fn test_malformed_success_body_is_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "wrong field" })))
        .mount(&server)
        .await;

    let failure = make_backend(&server.uri())
        .ask(AskRequest::new("doc-1", "q"))
        .await
        .unwrap_err();

    assert!(failure.message.starts_with("Invalid response from server"));
}

#[tokio::test]
async fn test_base_url_with_trailing_slash() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = make_backend(&format!("{}/", server.uri()))
        .ask(AskRequest::new("doc-1", "q"))
        .await
        .unwrap();
    assert_eq!(answer.answer, "ok");
}

// ---------------------------------------------------------------------------
// Network failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_unreachable_server_is_network_failure() {
    // Nothing listens on port 9 (discard) on test machines.
    let failure = make_backend("http://127.0.0.1:9")
        .ask(AskRequest::new("doc-1", "q"))
        .await
        .unwrap_err();

    assert!(failure.status.is_none());
    assert!(!failure.message.is_empty());
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "answer": "late" }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&server.uri(), Duration::from_millis(200)).unwrap();
    let failure = backend
        .ask(AskRequest::new("doc-1", "q"))
        .await
        .unwrap_err();

    assert_eq!(failure.message, "Request timed out");
    assert!(failure.status.is_none());
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health_reports_configuration() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "groq_api_key_configured": true,
            "hf_token_configured": false
        })))
        .mount(&server)
        .await;

    let health = make_backend(&server.uri()).health().await.unwrap();
    assert!(health.is_healthy());
    assert_eq!(health.groq_api_key_configured, Some(true));
    assert_eq!(health.hf_token_configured, Some(false));
}

#[tokio::test]
async fn test_health_unhealthy_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "detail": "Health check failed: index unavailable"
        })))
        .mount(&server)
        .await;

    let failure = make_backend(&server.uri()).health().await.unwrap_err();
    assert_eq!(failure.message, "Health check failed: index unavailable");
}

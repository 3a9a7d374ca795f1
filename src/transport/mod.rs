//! Boundary to the document Q&A backend
//!
//! This module defines the [`Backend`] trait that the flow controllers use
//! to reach the remote service, along with the request and response types
//! of its two operations. The concrete HTTP implementation lives in
//! [`http::HttpBackend`].
//!
//! # Failure model
//!
//! Backend calls never return [`crate::error::DocChatError`]. Every failure
//! (unreachable host, timeout, non-2xx status, unexpected body) is turned
//! into a [`TransportFailure`] carrying a message fit to show to the user.
//! The flow controllers convert it into a chat message.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{DocChatError, Result};

pub mod http;

pub use http::HttpBackend;

/// Message used when an error body cannot be parsed
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Normalized failure of a backend call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportFailure {
    /// Human-readable reason
    pub message: String,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
}

impl TransportFailure {
    /// Failure without an HTTP response (connection refused, timeout, ...)
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    /// Failure carried by a non-success HTTP response
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Builds the failure for a non-success response from its raw body
    ///
    /// The body's `detail` string is preferred. A body that is not JSON at
    /// all yields [`UNKNOWN_ERROR`]; JSON without a usable `detail` yields
    /// a description of the status code.
    ///
    /// # Examples
    ///
    /// ```
    /// use docchat::transport::TransportFailure;
    ///
    /// let failure = TransportFailure::from_error_body(413, r#"{"detail":"file too large"}"#);
    /// assert_eq!(failure.message, "file too large");
    ///
    /// let failure = TransportFailure::from_error_body(502, "<html>Bad Gateway</html>");
    /// assert_eq!(failure.message, "Unknown error");
    ///
    /// let failure = TransportFailure::from_error_body(500, "{}");
    /// assert_eq!(failure.message, "HTTP error! status: 500");
    /// ```
    pub fn from_error_body(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<serde_json::Value>(body) {
            Err(_) => UNKNOWN_ERROR.to_string(),
            Ok(value) => value
                .get("detail")
                .and_then(|detail| detail.as_str())
                .filter(|detail| !detail.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP error! status: {}", status)),
        };
        Self::http(status, message)
    }
}

/// Result of a backend call
pub type TransportResult<T> = std::result::Result<T, TransportFailure>;

/// A local file ready to be sent to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// File name sent with the multipart part
    pub name: String,
    /// Size in bytes
    pub size_bytes: u64,
    /// Raw file contents
    pub bytes: Bytes,
}

impl FileUpload {
    /// Creates an upload from in-memory contents
    ///
    /// # Examples
    ///
    /// ```
    /// use docchat::transport::FileUpload;
    ///
    /// let file = FileUpload::new("report.pdf", b"%PDF-1.4".to_vec());
    /// assert_eq!(file.size_bytes, 8);
    /// ```
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size_bytes: bytes.len() as u64,
            bytes,
        }
    }

    /// Reads a file from disk
    ///
    /// # Errors
    ///
    /// Returns [`DocChatError::InvalidFile`] if the path has no file name
    /// or cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                DocChatError::InvalidFile(format!("{} is not a file", path.display()))
            })?;
        let contents = tokio::fs::read(path)
            .await
            .map_err(|e| DocChatError::InvalidFile(format!("{}: {}", path.display(), e)))?;
        Ok(Self::new(name, contents))
    }
}

/// Successful upload response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Identifier of the ingested document
    #[serde(rename = "pdf_id")]
    pub document_id: String,
    /// Status text from the backend
    #[serde(default)]
    pub message: Option<String>,
    /// File name as recorded by the backend
    #[serde(default)]
    pub filename: Option<String>,
}

/// Question about an ingested document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
    /// Identifier returned by the upload
    #[serde(rename = "pdf_id")]
    pub document_id: String,
    /// Question text
    pub question: String,
}

impl AskRequest {
    /// Creates a new request
    pub fn new(document_id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            question: question.into(),
        }
    }
}

/// Successful ask response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Generated answer text
    pub answer: String,
}

/// Health report of the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `healthy` or `unhealthy`
    pub status: String,
    /// Whether the LLM key is configured on the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groq_api_key_configured: Option<bool>,
    /// Whether the embedding model token is configured on the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hf_token_configured: Option<bool>,
    /// Reason reported by an unhealthy server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthStatus {
    /// Whether the server reported itself healthy
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// The two operations of the document Q&A backend
///
/// Implementations must not panic and must report every failure as a
/// [`TransportFailure`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Ingests a document and returns its identifier
    async fn upload(&self, file: FileUpload) -> TransportResult<UploadReceipt>;

    /// Asks a question about a previously ingested document
    async fn ask(&self, request: AskRequest) -> TransportResult<Answer>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_detail_is_used() {
        let failure = TransportFailure::from_error_body(400, r#"{"detail":"File must be a PDF"}"#);
        assert_eq!(failure.message, "File must be a PDF");
        assert_eq!(failure.status, Some(400));
        assert_eq!(failure.to_string(), "File must be a PDF");
    }

    #[test]
    fn test_error_body_not_json_is_unknown() {
        let failure = TransportFailure::from_error_body(502, "Bad Gateway");
        assert_eq!(failure.message, UNKNOWN_ERROR);
    }

    #[test]
    fn test_error_body_without_string_detail_uses_status() {
        let validation = r#"{"detail":[{"loc":["body","question"],"msg":"field required"}]}"#;
        assert_eq!(
            TransportFailure::from_error_body(422, validation).message,
            "HTTP error! status: 422"
        );
        assert_eq!(
            TransportFailure::from_error_body(500, r#"{"detail":""}"#).message,
            "HTTP error! status: 500"
        );
    }

    #[test]
    fn test_ask_request_uses_wire_field_names() {
        let json = serde_json::to_value(AskRequest::new("doc-1", "What is the total?")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"pdf_id": "doc-1", "question": "What is the total?"})
        );
    }

    #[test]
    fn test_upload_receipt_optional_fields() {
        let receipt: UploadReceipt = serde_json::from_str(r#"{"pdf_id":"doc-1"}"#).unwrap();
        assert_eq!(receipt.document_id, "doc-1");
        assert!(receipt.message.is_none());
        assert!(receipt.filename.is_none());
    }

    #[tokio::test]
    async fn test_file_upload_from_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.4 test").unwrap();

        let file = FileUpload::from_path(&path).await.unwrap();
        assert_eq!(file.name, "report.pdf");
        assert_eq!(file.size_bytes, 13);
    }

    #[tokio::test]
    async fn test_file_upload_missing_file() {
        let err = FileUpload::from_path("/definitely/not/here.pdf")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid file"));
    }
}

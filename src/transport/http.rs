//! HTTP implementation of the backend operations
//!
//! - `POST {base}/upload`: multipart form, raw file under the `file` field
//! - `POST {base}/ask`: JSON `{ "pdf_id", "question" }`
//! - `GET {base}/health`: server self-check, used by the `health` command
//!
//! Non-success responses are decoded with
//! [`TransportFailure::from_error_body`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::BackendConfig;
use crate::error::{DocChatError, Result};
use crate::transport::{
    Answer, AskRequest, Backend, FileUpload, HealthStatus, TransportFailure, TransportResult,
    UploadReceipt,
};

/// Content type sent with uploaded documents
const DOCUMENT_MIME: &str = "application/pdf";

/// Backend reached over HTTP
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use docchat::transport::HttpBackend;
///
/// let backend = HttpBackend::new("http://localhost:8000", Duration::from_secs(30)).unwrap();
/// assert_eq!(backend.base_url().as_str(), "http://localhost:8000/");
/// ```
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Creates a backend client for `base_url`
    ///
    /// # Errors
    ///
    /// Returns error if the URL is invalid or the HTTP client cannot be
    /// built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            DocChatError::Config(format!("Invalid backend URL '{}': {}", base_url, e))
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("docchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(DocChatError::Http)?;

        tracing::info!("Initialized HTTP backend: base_url={}", base_url);

        Ok(Self { client, base_url })
    }

    /// Creates a backend client from configuration
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.timeout_seconds),
        )
    }

    /// Base URL every endpoint is resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Queries the backend health endpoint
    pub async fn health(&self) -> TransportResult<HealthStatus> {
        let url = self.endpoint("health");
        tracing::debug!("Checking backend health at {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| request_failure("health", &e))?;

        read_json("health", response).await
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn upload(&self, file: FileUpload) -> TransportResult<UploadReceipt> {
        let url = self.endpoint("upload");
        tracing::info!(
            file = %file.name,
            size_bytes = file.size_bytes,
            "Uploading document to {}",
            url
        );

        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(DOCUMENT_MIME)
            .map_err(|e| TransportFailure::network(format!("Failed to build upload: {}", e)))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| request_failure("upload", &e))?;

        let receipt: UploadReceipt = read_json("upload", response).await?;
        tracing::info!(document_id = %receipt.document_id, "Document ingested");
        Ok(receipt)
    }

    async fn ask(&self, request: AskRequest) -> TransportResult<Answer> {
        let url = self.endpoint("ask");
        tracing::info!(document_id = %request.document_id, "Asking question");
        tracing::debug!("Question: {}", request.question);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| request_failure("ask", &e))?;

        read_json("ask", response).await
    }
}

fn request_failure(operation: &str, err: &reqwest::Error) -> TransportFailure {
    tracing::error!("{} request failed: {}", operation, err);
    if err.is_timeout() {
        TransportFailure::network("Request timed out")
    } else if err.is_connect() {
        TransportFailure::network(format!("Could not connect to server: {}", err))
    } else {
        TransportFailure::network(format!("Request failed: {}", err))
    }
}

async fn read_json<T: DeserializeOwned>(operation: &str, response: Response) -> TransportResult<T> {
    let status = response.status();
    let body = response.text().await.map_err(|e| {
        tracing::error!("Failed to read {} response body: {}", operation, e);
        TransportFailure::network(format!("Failed to read response: {}", e))
    })?;

    if !status.is_success() {
        let failure = TransportFailure::from_error_body(status.as_u16(), &body);
        tracing::error!(
            status = status.as_u16(),
            "{} returned error: {}",
            operation,
            failure.message
        );
        return Err(failure);
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!("Failed to parse {} response: {}", operation, e);
        TransportFailure::http(
            status.as_u16(),
            format!("Invalid response from server: {}", e),
        )
    })
}

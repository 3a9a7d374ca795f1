//! Test utilities for DocChat
//!
//! Provides a backend whose responses are released by the test, so tests
//! can interleave user actions with outstanding requests, and helpers to
//! build sessions in a known state.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};

use crate::session::{Document, InFlight, Message, SessionStore, Transition};
use crate::transport::{
    Answer, AskRequest, Backend, FileUpload, TransportFailure, TransportResult, UploadReceipt,
};

/// How long `wait_for_*` waits before failing the test
const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct CallLog {
    uploads: Mutex<Vec<FileUpload>>,
    asks: Mutex<Vec<AskRequest>>,
    notify: Notify,
}

/// Backend that blocks every call until the test supplies a response
///
/// Responses are consumed in order. Create with [`DeferredBackend::new`]
/// and drive it through the returned [`DeferredHandle`].
pub struct DeferredBackend {
    uploads: tokio::sync::Mutex<mpsc::UnboundedReceiver<TransportResult<UploadReceipt>>>,
    asks: tokio::sync::Mutex<mpsc::UnboundedReceiver<TransportResult<Answer>>>,
    log: Arc<CallLog>,
}

/// Test side of a [`DeferredBackend`]
pub struct DeferredHandle {
    upload_tx: mpsc::UnboundedSender<TransportResult<UploadReceipt>>,
    ask_tx: mpsc::UnboundedSender<TransportResult<Answer>>,
    log: Arc<CallLog>,
}

impl DeferredBackend {
    /// Creates a backend and the handle controlling it
    pub fn new() -> (Self, DeferredHandle) {
        let (upload_tx, upload_rx) = mpsc::unbounded_channel();
        let (ask_tx, ask_rx) = mpsc::unbounded_channel();
        let log = Arc::new(CallLog::default());

        let backend = Self {
            uploads: tokio::sync::Mutex::new(upload_rx),
            asks: tokio::sync::Mutex::new(ask_rx),
            log: Arc::clone(&log),
        };
        let handle = DeferredHandle {
            upload_tx,
            ask_tx,
            log,
        };
        (backend, handle)
    }
}

#[async_trait]
impl Backend for DeferredBackend {
    async fn upload(&self, file: FileUpload) -> TransportResult<UploadReceipt> {
        self.log.uploads.lock().expect("call log poisoned").push(file);
        self.log.notify.notify_waiters();
        let mut responses = self.uploads.lock().await;
        responses
            .recv()
            .await
            .unwrap_or_else(|| Err(TransportFailure::network("deferred backend closed")))
    }

    async fn ask(&self, request: AskRequest) -> TransportResult<Answer> {
        self.log.asks.lock().expect("call log poisoned").push(request);
        self.log.notify.notify_waiters();
        let mut responses = self.asks.lock().await;
        responses
            .recv()
            .await
            .unwrap_or_else(|| Err(TransportFailure::network("deferred backend closed")))
    }
}

impl DeferredHandle {
    /// Releases the next pending (or future) upload call
    pub fn respond_upload(&self, response: TransportResult<UploadReceipt>) {
        self.upload_tx
            .send(response)
            .expect("deferred backend dropped");
    }

    /// Releases the next pending (or future) ask call
    pub fn respond_ask(&self, response: TransportResult<Answer>) {
        self.ask_tx.send(response).expect("deferred backend dropped");
    }

    /// Number of upload calls received so far
    pub fn upload_count(&self) -> usize {
        self.log.uploads.lock().expect("call log poisoned").len()
    }

    /// Number of ask calls received so far
    pub fn ask_count(&self) -> usize {
        self.log.asks.lock().expect("call log poisoned").len()
    }

    /// Questions received so far
    pub fn asked(&self) -> Vec<AskRequest> {
        self.log.asks.lock().expect("call log poisoned").clone()
    }

    /// Waits until at least `n` upload calls were received
    pub async fn wait_for_uploads(&self, n: usize) {
        self.wait_until(|| self.upload_count() >= n).await;
    }

    /// Waits until at least `n` ask calls were received
    pub async fn wait_for_asks(&self, n: usize) {
        self.wait_until(|| self.ask_count() >= n).await;
    }

    async fn wait_until(&self, done: impl Fn() -> bool) {
        let wait = async {
            loop {
                let notified = self.log.notify.notified();
                if done() {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(WAIT_TIMEOUT, wait)
            .await
            .expect("timed out waiting for backend call");
    }
}

/// Creates a store with `name` already uploaded as `document_id`
pub fn bound_store(name: &str, document_id: &str) -> SessionStore {
    let store = SessionStore::new();
    store.apply(Transition::BeginUpload(InFlight::Release));
    store.apply(Transition::CompleteUploadSuccess {
        document: Document::new(name, 1024, document_id),
        welcome: Message::welcome(name),
    });
    store
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deferred_backend_releases_in_order() {
        let (backend, handle) = DeferredBackend::new();
        handle.respond_ask(Ok(Answer {
            answer: "first".to_string(),
        }));
        handle.respond_ask(Err(TransportFailure::network("second")));

        let a = backend.ask(AskRequest::new("d", "1")).await;
        let b = backend.ask(AskRequest::new("d", "2")).await;
        assert_eq!(a.unwrap().answer, "first");
        assert_eq!(b.unwrap_err().message, "second");
        assert_eq!(handle.ask_count(), 2);
        assert_eq!(handle.asked()[1].question, "2");
    }

    #[test]
    fn test_bound_store_has_document() {
        let store = bound_store("a.pdf", "doc-a");
        let session = store.snapshot();
        assert_eq!(session.document().unwrap().document_id, "doc-a");
        assert_eq!(session.messages().len(), 1);
    }
}

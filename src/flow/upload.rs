//! Document upload flow
//!
//! Starting an upload replaces the current session wholesale. A second
//! upload is refused while one is still running. Under
//! [`CompletionPolicy::ApplyAlways`] that holds across removals too: the
//! upload flag survives `remove` until the outstanding response lands.

use std::sync::Arc;

use crate::flow::metrics::{Operation, RequestTimer};
use crate::flow::{complete, CompletionPolicy, FlowOutcome};
use crate::session::{Document, Message, SessionStore, Transition};
use crate::transport::{Backend, FileUpload, TransportFailure};

/// Coordinates the upload of one document
#[derive(Clone)]
pub struct UploadFlow {
    store: SessionStore,
    backend: Arc<dyn Backend>,
    policy: CompletionPolicy,
}

impl UploadFlow {
    /// Creates a flow writing to `store` and talking to `backend`
    pub fn new(store: SessionStore, backend: Arc<dyn Backend>, policy: CompletionPolicy) -> Self {
        Self {
            store,
            backend,
            policy,
        }
    }

    /// Uploads `file`, replacing the current session
    ///
    /// On success the document is bound and a welcome message naming the
    /// file is appended. On failure an assistant message carrying the
    /// reason is appended and no document is bound.
    ///
    /// Returns [`FlowOutcome::Ignored`] without touching the session if an
    /// upload is already in flight.
    pub async fn upload(&self, file: FileUpload) -> FlowOutcome {
        let in_flight = self.policy.in_flight();
        let begun = self.store.transact(|session| {
            if session.upload_in_flight() {
                None
            } else {
                Some((Transition::BeginUpload(in_flight), ()))
            }
        });
        let Some((epoch, ())) = begun else {
            tracing::debug!(file = %file.name, "Upload already in flight, ignoring");
            return FlowOutcome::Ignored;
        };

        let name = file.name.clone();
        let size_bytes = file.size_bytes;
        tracing::info!(file = %name, size_bytes, epoch, "Starting upload");

        let timer = RequestTimer::start(Operation::Upload);
        let result = self.backend.upload(file).await.and_then(|receipt| {
            if receipt.document_id.trim().is_empty() {
                Err(TransportFailure::network(
                    "Invalid response from server: missing document identifier",
                ))
            } else {
                Ok(receipt)
            }
        });

        match result {
            Ok(receipt) => {
                timer.finish("success");
                let transition = Transition::CompleteUploadSuccess {
                    document: Document::new(name.clone(), size_bytes, receipt.document_id),
                    welcome: Message::welcome(&name),
                };
                if complete(&self.store, self.policy, epoch, Operation::Upload, transition) {
                    tracing::info!(file = %name, "Upload complete");
                    FlowOutcome::Completed
                } else {
                    FlowOutcome::Stale
                }
            }
            Err(failure) => {
                timer.finish("failure");
                tracing::warn!(file = %name, "Upload failed: {}", failure);
                let transition = Transition::CompleteUploadFailure {
                    error: Message::upload_error(&failure.message),
                };
                if complete(&self.store, self.policy, epoch, Operation::Upload, transition) {
                    FlowOutcome::Failed(failure)
                } else {
                    FlowOutcome::Stale
                }
            }
        }
    }

    /// Removes the current document and its conversation
    pub fn remove(&self) {
        let epoch = self
            .store
            .apply(Transition::RemoveDocument(self.policy.in_flight()));
        tracing::info!(epoch, "Document removed");
    }
}

//! Flow controllers sequencing requests against the backend
//!
//! Each controller runs one multi-step interaction:
//!
//! 1. check preconditions and apply the begin transition atomically,
//!    remembering the session epoch it produced
//! 2. await the backend (the only suspension point)
//! 3. turn the outcome into a message and apply the completion transition
//!
//! Whether a completion is applied to a session that was replaced or
//! removed in the meantime is decided by the [`CompletionPolicy`]. The same
//! policy decides whether replacing the session releases the in-flight
//! flags: a policy that still applies late responses must let those
//! responses clear the flags they own.

pub mod conversation;
pub mod metrics;
pub mod upload;

pub use conversation::ConversationFlow;
pub use upload::UploadFlow;

use std::sync::Arc;

use crate::config::SessionConfig;
use crate::session::{Epoch, InFlight, SessionStore, Transition};
use crate::transport::{Backend, FileUpload, TransportFailure};

use self::metrics::{record_stale, Operation};

/// What happened to a user intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// The request succeeded and its result was applied
    Completed,
    /// The request failed and the failure was recorded as a message
    Failed(TransportFailure),
    /// Preconditions were not met; nothing was sent
    Ignored,
    /// The response belonged to a session that no longer exists and was
    /// dropped
    Stale,
}

impl FlowOutcome {
    /// Whether a request was sent to the backend
    pub fn was_sent(&self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// Handling of responses that outlive their session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPolicy {
    /// Drop the response if the session epoch changed
    DiscardStale,
    /// Apply the response to whatever the current session is
    ApplyAlways,
}

impl From<&SessionConfig> for CompletionPolicy {
    fn from(config: &SessionConfig) -> Self {
        if config.discard_stale_responses {
            Self::DiscardStale
        } else {
            Self::ApplyAlways
        }
    }
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        Self::DiscardStale
    }
}

impl CompletionPolicy {
    /// In-flight rule for transitions that replace the session
    pub fn in_flight(self) -> InFlight {
        match self {
            Self::DiscardStale => InFlight::Release,
            Self::ApplyAlways => InFlight::Keep,
        }
    }
}

/// Applies a completion transition according to `policy`
///
/// Returns false if the transition was dropped as stale.
fn complete(
    store: &SessionStore,
    policy: CompletionPolicy,
    epoch: Epoch,
    operation: Operation,
    transition: Transition,
) -> bool {
    match policy {
        CompletionPolicy::ApplyAlways => {
            store.apply(transition);
            true
        }
        CompletionPolicy::DiscardStale => {
            if store.apply_if_current(epoch, transition) {
                true
            } else {
                tracing::warn!(
                    operation = %operation,
                    started_epoch = epoch,
                    current_epoch = store.epoch(),
                    "Discarding response for a session that no longer exists"
                );
                record_stale(operation);
                false
            }
        }
    }
}

/// Both flow controllers bound to one store and backend
///
/// This is what the presentation layer holds: it forwards the three user
/// intents (upload, ask, remove) and renders from [`Self::store`].
#[derive(Clone)]
pub struct SessionController {
    store: SessionStore,
    uploads: UploadFlow,
    conversation: ConversationFlow,
}

impl SessionController {
    /// Wires both controllers to `store` and `backend`
    pub fn new(store: SessionStore, backend: Arc<dyn Backend>, policy: CompletionPolicy) -> Self {
        Self {
            uploads: UploadFlow::new(store.clone(), Arc::clone(&backend), policy),
            conversation: ConversationFlow::new(store.clone(), backend, policy),
            store,
        }
    }

    /// Store the controllers write to
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// See [`UploadFlow::upload`]
    pub async fn upload(&self, file: FileUpload) -> FlowOutcome {
        self.uploads.upload(file).await
    }

    /// See [`UploadFlow::remove`]
    pub fn remove(&self) {
        self.uploads.remove();
    }

    /// See [`ConversationFlow::stage`]
    pub fn stage(&self, text: impl Into<String>) -> bool {
        self.conversation.stage(text)
    }

    /// See [`ConversationFlow::send`]
    pub async fn send(&self) -> FlowOutcome {
        self.conversation.send().await
    }

    /// See [`ConversationFlow::ask`]
    pub async fn ask(&self, text: impl Into<String>) -> FlowOutcome {
        self.conversation.ask(text).await
    }
}

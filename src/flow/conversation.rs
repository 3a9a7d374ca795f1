//! Question and answer flow
//!
//! At most one question is outstanding at a time. The question is echoed
//! into the log exactly as staged; only the emptiness check trims it.
//! Under [`CompletionPolicy::ApplyAlways`] a replaced or removed session
//! keeps the answer flag, so the late answer is the one that clears it.

use std::sync::Arc;

use crate::flow::metrics::{Operation, RequestTimer};
use crate::flow::{complete, CompletionPolicy, FlowOutcome};
use crate::session::{Message, SessionStore, Transition};
use crate::transport::{AskRequest, Backend};

/// Coordinates one question/answer exchange at a time
#[derive(Clone)]
pub struct ConversationFlow {
    store: SessionStore,
    backend: Arc<dyn Backend>,
    policy: CompletionPolicy,
}

impl ConversationFlow {
    /// Creates a flow writing to `store` and talking to `backend`
    pub fn new(store: SessionStore, backend: Arc<dyn Backend>, policy: CompletionPolicy) -> Self {
        Self {
            store,
            backend,
            policy,
        }
    }

    /// Stages question text, replacing whatever was staged before
    ///
    /// Returns false if the text was rejected because an answer is in
    /// flight.
    pub fn stage(&self, text: impl Into<String>) -> bool {
        let text = text.into();
        self.store
            .transact(|session| {
                if session.answer_in_flight() {
                    None
                } else {
                    Some((Transition::StageQuestion(text), ()))
                }
            })
            .is_some()
    }

    /// Sends the staged question
    ///
    /// Does nothing and returns [`FlowOutcome::Ignored`] if the staged
    /// text is blank, no document is bound, or an answer is already in
    /// flight.
    pub async fn send(&self) -> FlowOutcome {
        let begun = self.store.transact(|session| {
            if !session.can_begin_answer() {
                return None;
            }
            let document = session.document()?;
            let question = session.pending_question().to_string();
            let request = AskRequest::new(document.document_id.clone(), question.clone());
            Some((
                Transition::BeginAnswer {
                    question: Message::user(question),
                },
                request,
            ))
        });
        let Some((epoch, request)) = begun else {
            tracing::debug!("Question not sent: blank, no document, or answer in flight");
            return FlowOutcome::Ignored;
        };

        tracing::info!(document_id = %request.document_id, epoch, "Sending question");

        let timer = RequestTimer::start(Operation::Ask);
        match self.backend.ask(request).await {
            Ok(answer) => {
                timer.finish("success");
                let transition = Transition::CompleteAnswerSuccess {
                    answer: Message::assistant(answer.answer),
                };
                if complete(&self.store, self.policy, epoch, Operation::Ask, transition) {
                    FlowOutcome::Completed
                } else {
                    FlowOutcome::Stale
                }
            }
            Err(failure) => {
                timer.finish("failure");
                tracing::warn!("Question failed: {}", failure);
                let transition = Transition::CompleteAnswerFailure {
                    error: Message::answer_error(&failure.message),
                };
                if complete(&self.store, self.policy, epoch, Operation::Ask, transition) {
                    FlowOutcome::Failed(failure)
                } else {
                    FlowOutcome::Stale
                }
            }
        }
    }

    /// Stages `text` and sends it
    pub async fn ask(&self, text: impl Into<String>) -> FlowOutcome {
        self.stage(text);
        self.send().await
    }
}

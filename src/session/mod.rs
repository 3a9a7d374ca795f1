//! Session state for one uploaded document and its conversation
//!
//! [`Session`] is the aggregate root. Every state change goes through one
//! of its transition methods, each of which consumes the current value and
//! returns the next one without side effects. [`SessionStore`] holds the
//! single shared instance and publishes snapshots to whoever renders them.
//!
//! # Transitions
//!
//! | transition                | effect                                                  |
//! |---------------------------|---------------------------------------------------------|
//! | `begin_upload`            | new epoch, empty log, upload in flight                  |
//! | `complete_upload_success` | bind document, append welcome, upload done              |
//! | `complete_upload_failure` | append error, upload done, no document                  |
//! | `remove_document`         | new epoch, document, log and pending text cleared       |
//! | `stage_question`          | set pending text (ignored while an answer is running)   |
//! | `begin_answer`            | append question, clear pending text, answer in flight   |
//! | `complete_answer_*`       | append answer or error, answer done                     |
//!
//! The two replacing transitions take an [`InFlight`] rule. With
//! [`InFlight::Release`] they drop the in-flight flags and the caller must
//! discard late responses by epoch. With [`InFlight::Keep`] the flags stay
//! set until the request that raised them completes, so no second request
//! of the same kind can start while the first is still outstanding.

pub mod message;
pub mod store;

pub use message::{Message, Role};
pub use store::SessionStore;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binding between the session and a document ingested by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// File name as shown to the user
    pub name: String,
    /// File size in bytes
    pub size_bytes: u64,
    /// Opaque identifier returned by the backend
    pub document_id: String,
}

impl Document {
    /// Creates a new document binding
    pub fn new(name: impl Into<String>, size_bytes: u64, document_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            document_id: document_id.into(),
        }
    }
}

/// Identity of one session instance
///
/// Bumped whenever the session is replaced or destroyed. A flow that
/// remembers the epoch it started in can tell whether its response still
/// belongs to the current session.
pub type Epoch = u64;

/// What a session-replacing transition does with outstanding requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InFlight {
    /// Clear the in-flight flags along with the old session
    #[default]
    Release,
    /// Carry the in-flight flags over to the new session
    Keep,
}

/// Returns true for empty or whitespace-only text
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Aggregate state of the document chat
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    document: Option<Document>,
    messages: Vec<Message>,
    upload_in_flight: bool,
    answer_in_flight: bool,
    pending_question: String,
    epoch: Epoch,
}

impl Session {
    /// Creates an empty session with no document bound
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently bound document, if any
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Conversation log in insertion order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether an upload request is outstanding
    pub fn upload_in_flight(&self) -> bool {
        self.upload_in_flight
    }

    /// Whether a question request is outstanding
    pub fn answer_in_flight(&self) -> bool {
        self.answer_in_flight
    }

    /// Text staged in the input
    pub fn pending_question(&self) -> &str {
        &self.pending_question
    }

    /// Identity of this session instance
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Whether `begin_answer` would currently be accepted
    pub fn can_begin_answer(&self) -> bool {
        self.document.is_some()
            && !self.answer_in_flight
            && !self.upload_in_flight
            && !is_blank(&self.pending_question)
    }

    /// Starts a new upload, discarding the previous session
    ///
    /// An outstanding answer survives only under [`InFlight::Keep`].
    pub fn begin_upload(self, in_flight: InFlight) -> Self {
        Self {
            upload_in_flight: true,
            answer_in_flight: in_flight == InFlight::Keep && self.answer_in_flight,
            epoch: self.epoch.wrapping_add(1),
            pending_question: self.pending_question,
            ..Self::default()
        }
    }

    /// Binds the ingested document and greets the user
    pub fn complete_upload_success(mut self, document: Document, welcome: Message) -> Self {
        self.document = Some(document);
        self.messages.clear();
        self.pending_question.clear();
        self.messages.push(welcome);
        self.upload_in_flight = false;
        self
    }

    /// Records a failed upload; the document stays unbound
    pub fn complete_upload_failure(mut self, error: Message) -> Self {
        self.messages.push(error);
        self.upload_in_flight = false;
        self
    }

    /// Destroys the session, whatever state it is in
    ///
    /// Under [`InFlight::Keep`] the in-flight flags carry over until their
    /// requests complete.
    pub fn remove_document(self, in_flight: InFlight) -> Self {
        let keep = in_flight == InFlight::Keep;
        Self {
            upload_in_flight: keep && self.upload_in_flight,
            answer_in_flight: keep && self.answer_in_flight,
            epoch: self.epoch.wrapping_add(1),
            ..Self::default()
        }
    }

    /// Replaces the staged question text
    ///
    /// Ignored while an answer is in flight.
    pub fn stage_question(mut self, text: impl Into<String>) -> Self {
        if !self.answer_in_flight {
            self.pending_question = text.into();
        }
        self
    }

    /// Appends the user's question and marks the answer as in flight
    ///
    /// Requires a bound document, a non-blank staged question and no
    /// outstanding answer. Otherwise the session is returned unchanged.
    pub fn begin_answer(mut self, question: Message) -> Self {
        if !self.can_begin_answer() {
            return self;
        }
        self.messages.push(question);
        self.pending_question.clear();
        self.answer_in_flight = true;
        self
    }

    /// Appends the backend's answer
    pub fn complete_answer_success(self, answer: Message) -> Self {
        self.complete_answer(answer)
    }

    /// Appends the error notice for a failed question
    pub fn complete_answer_failure(self, error: Message) -> Self {
        self.complete_answer(error)
    }

    fn complete_answer(mut self, message: Message) -> Self {
        self.messages.push(message);
        self.answer_in_flight = false;
        self
    }

    /// Applies a [`Transition`] value
    pub fn apply(self, transition: Transition) -> Self {
        match transition {
            Transition::BeginUpload(in_flight) => self.begin_upload(in_flight),
            Transition::CompleteUploadSuccess { document, welcome } => {
                self.complete_upload_success(document, welcome)
            }
            Transition::CompleteUploadFailure { error } => self.complete_upload_failure(error),
            Transition::RemoveDocument(in_flight) => self.remove_document(in_flight),
            Transition::StageQuestion(text) => self.stage_question(text),
            Transition::BeginAnswer { question } => self.begin_answer(question),
            Transition::CompleteAnswerSuccess { answer } => self.complete_answer_success(answer),
            Transition::CompleteAnswerFailure { error } => self.complete_answer_failure(error),
        }
    }
}

/// A state change of the [`Session`], as data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// See [`Session::begin_upload`]
    BeginUpload(InFlight),
    /// See [`Session::complete_upload_success`]
    CompleteUploadSuccess {
        /// Document returned by the backend
        document: Document,
        /// Greeting to append
        welcome: Message,
    },
    /// See [`Session::complete_upload_failure`]
    CompleteUploadFailure {
        /// Error notice to append
        error: Message,
    },
    /// See [`Session::remove_document`]
    RemoveDocument(InFlight),
    /// See [`Session::stage_question`]
    StageQuestion(String),
    /// See [`Session::begin_answer`]
    BeginAnswer {
        /// The user's question
        question: Message,
    },
    /// See [`Session::complete_answer_success`]
    CompleteAnswerSuccess {
        /// The backend's answer
        answer: Message,
    },
    /// See [`Session::complete_answer_failure`]
    CompleteAnswerFailure {
        /// Error notice to append
        error: Message,
    },
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BeginUpload(_) => "begin_upload",
            Self::CompleteUploadSuccess { .. } => "complete_upload_success",
            Self::CompleteUploadFailure { .. } => "complete_upload_failure",
            Self::RemoveDocument(_) => "remove_document",
            Self::StageQuestion(_) => "stage_question",
            Self::BeginAnswer { .. } => "begin_answer",
            Self::CompleteAnswerSuccess { .. } => "complete_answer_success",
            Self::CompleteAnswerFailure { .. } => "complete_answer_failure",
        };
        write!(f, "{}", name)
    }
}

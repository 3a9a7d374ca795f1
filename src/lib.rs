//! DocChat - document question-answering client library
//!
//! This library keeps the state of a chat session about one uploaded
//! document and sequences the requests to the backend that ingests the
//! document and answers questions about it.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: session state, its transitions, and the shared store
//! - `flow`: upload and conversation controllers driving the backend
//! - `transport`: backend abstraction and its HTTP implementation
//! - `commands`: terminal front end (interactive chat, one-shot ask, health)
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use docchat::flow::{CompletionPolicy, SessionController};
//! use docchat::session::SessionStore;
//! use docchat::transport::{FileUpload, HttpBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = HttpBackend::new("http://localhost:8000", std::time::Duration::from_secs(60))?;
//!     let controller = SessionController::new(
//!         SessionStore::new(),
//!         Arc::new(backend),
//!         CompletionPolicy::default(),
//!     );
//!
//!     controller.upload(FileUpload::from_path("report.pdf").await?).await;
//!     controller.ask("What is the total?").await;
//!
//!     for message in controller.store().snapshot().messages() {
//!         println!("{}: {}", message.role, message.content);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod flow;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use error::{DocChatError, Result};
pub use flow::{CompletionPolicy, FlowOutcome, SessionController};
pub use session::{Document, InFlight, Message, Role, Session, SessionStore};
pub use transport::{Backend, HttpBackend, TransportFailure};

#[cfg(test)]
pub mod test_utils;

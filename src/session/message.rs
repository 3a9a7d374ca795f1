//! Conversation messages
//!
//! Messages are immutable once created. Content is opaque text: emphasis
//! and bullet markers are only interpreted by the renderer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Text typed by the person using the client
    User,
    /// Text produced by the client or the backend (answers, welcome and
    /// error notices)
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single entry of the conversation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier within the session
    pub id: Uuid,
    /// Who wrote the message
    pub role: Role,
    /// Message text
    pub content: String,
    /// Creation instant
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a message with a fresh id and the current time
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use docchat::session::{Message, Role};
    ///
    /// let msg = Message::user("What is the total?");
    /// assert_eq!(msg.role, Role::User);
    /// assert_eq!(msg.content, "What is the total?");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Welcome notice appended after a document was ingested
    ///
    /// # Examples
    ///
    /// ```
    /// use docchat::session::Message;
    ///
    /// let msg = Message::welcome("report.pdf");
    /// assert!(msg.content.contains("report.pdf"));
    /// ```
    pub fn welcome(file_name: &str) -> Self {
        Self::assistant(format!(
            "**{}** has been uploaded and processed. Ask me anything about its content!",
            file_name
        ))
    }

    /// Notice appended when an upload failed
    pub fn upload_error(reason: &str) -> Self {
        Self::assistant(format!("Error uploading document: {}", reason))
    }

    /// Notice appended when a question could not be answered
    pub fn answer_error(reason: &str) -> Self {
        Self::assistant(format!("Sorry, I couldn't answer that: {}", reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_ids_are_unique() {
        let a = Message::user("same");
        let b = Message::user("same");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_error_messages_embed_reason() {
        assert!(Message::upload_error("file too large")
            .content
            .contains("file too large"));
        assert!(Message::answer_error("timeout").content.contains("timeout"));
        assert_eq!(Message::answer_error("x").role, Role::Assistant);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}

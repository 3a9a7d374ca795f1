//! Terminal rendering of the session
//!
//! Messages are rendered from store snapshots. [`TranscriptView`] remembers
//! how much of the current session was already printed so that each
//! snapshot only prints what is new.

use chrono::Local;
use colored::Colorize;
use regex::Regex;

use crate::error::Result;
use crate::session::{Epoch, Message, Role, Session};

/// Formats messages and session status for the terminal
#[derive(Debug, Clone)]
pub struct Renderer {
    bold: Regex,
    show_timestamps: bool,
}

impl Renderer {
    /// Creates a renderer
    ///
    /// # Errors
    ///
    /// Returns error if the markup pattern fails to compile
    pub fn new(show_timestamps: bool) -> Result<Self> {
        let bold = Regex::new(r"\*\*(.+?)\*\*")
            .map_err(|e| anyhow::anyhow!("Invalid markup pattern: {}", e))?;
        Ok(Self {
            bold,
            show_timestamps,
        })
    }

    /// Applies the light markup used in answers
    ///
    /// `**text**` becomes bold and lines starting with `* ` or `- ` become
    /// bullets.
    pub fn format_content(&self, content: &str) -> String {
        let lines: Vec<String> = content
            .lines()
            .map(|line| {
                let body = line.trim_start();
                match body.strip_prefix("* ").or_else(|| body.strip_prefix("- ")) {
                    Some(item) => format!("  • {}", item),
                    None => line.to_string(),
                }
            })
            .collect();

        self.bold
            .replace_all(&lines.join("\n"), |caps: &regex::Captures| {
                caps[1].bold().to_string()
            })
            .into_owned()
    }

    /// Formats one message with its role tag
    pub fn format_message(&self, message: &Message) -> String {
        let tag = match message.role {
            Role::User => "You".cyan().bold(),
            Role::Assistant => "DocChat".green().bold(),
        };

        let timestamp = if self.show_timestamps {
            format!(
                "{} ",
                message
                    .timestamp
                    .with_timezone(&Local)
                    .format("%H:%M:%S")
                    .to_string()
                    .dimmed()
            )
        } else {
            String::new()
        };

        format!(
            "{}{}: {}",
            timestamp,
            tag,
            self.format_content(&message.content)
        )
    }

    /// Summarizes the session for `/status`
    pub fn format_status(&self, session: &Session) -> String {
        let mut out = match session.document() {
            Some(doc) => format!(
                "Document: {} ({})\nMessages: {}",
                doc.name.bold(),
                format_size(doc.size_bytes),
                session.messages().len()
            ),
            None => "No document uploaded. Use /upload <path> to add one.".to_string(),
        };

        if session.upload_in_flight() {
            out.push_str(&format!("\n{}", "Upload in progress".yellow()));
        }
        if session.answer_in_flight() {
            out.push_str(&format!("\n{}", "Waiting for an answer".yellow()));
        }
        out
    }
}

/// Human-readable file size
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let value = bytes as f64;
    if value >= MB {
        format!("{:.2} MB", value / MB)
    } else if value >= KB {
        format!("{:.1} KB", value / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Tracks which messages of the current session were already printed
#[derive(Debug, Default)]
pub struct TranscriptView {
    epoch: Option<Epoch>,
    rendered: usize,
}

impl TranscriptView {
    /// Creates a view that has printed nothing yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages of `session` not printed yet, marking them printed
    ///
    /// A new session (different epoch) or a shorter log starts over from
    /// the first message.
    pub fn take_new<'a>(&mut self, session: &'a Session) -> &'a [Message] {
        let messages = session.messages();
        if self.epoch != Some(session.epoch()) || messages.len() < self.rendered {
            self.epoch = Some(session.epoch());
            self.rendered = 0;
        }

        let new = &messages[self.rendered..];
        self.rendered = messages.len();
        new
    }
}

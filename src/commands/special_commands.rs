//! Special commands parser for interactive chat mode
//!
//! Special commands act on the session instead of being sent as a
//! question. They allow users to:
//! - Upload a new document, replacing the current one
//! - Remove the current document and its conversation
//! - Inspect the session and the transcript
//! - Display help information
//! - Exit the session
//!
//! Commands are prefixed with `/`. The command word is case-insensitive;
//! arguments keep their case since they may be file paths.

use std::path::PathBuf;
use thiserror::Error;

/// Every command word accepted by [`parse_special_command`]
const KNOWN_COMMANDS: &[&str] = &["/upload", "/remove", "/status", "/history", "/help", "/exit"];

/// Largest edit distance for which an unknown command gets a suggestion
const MAX_SUGGESTION_DISTANCE: usize = 2;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {command}{}\n\nType '/help' to see available commands", suggestion_hint(.suggestion))]
    UnknownCommand {
        command: String,
        suggestion: Option<String>,
    },

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean {}?)", s),
        None => String::new(),
    }
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Upload the file at the given path
    ///
    /// Replaces the current document and clears the conversation.
    Upload(PathBuf),

    /// Remove the current document and its conversation
    Remove,

    /// Show the bound document and whether a request is running
    ShowStatus,

    /// Reprint the whole transcript
    ShowHistory,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent as a question.
    None,
}

/// Parse user input into a special command
///
/// # Errors
///
/// Returns [`CommandError`] for unknown commands, missing arguments, or
/// arguments given to commands that take none.
///
/// # Examples
///
/// ```
/// use docchat::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/remove").unwrap(), SpecialCommand::Remove);
/// assert_eq!(
///     parse_special_command("What is the total?").unwrap(),
///     SpecialCommand::None
/// );
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (trimmed, ""),
    };
    let word = word.to_lowercase();

    match word.as_str() {
        "/upload" => {
            if rest.is_empty() {
                Err(CommandError::MissingArgument {
                    command: "/upload".to_string(),
                    usage: "/upload <path/to/document.pdf>".to_string(),
                })
            } else {
                Ok(SpecialCommand::Upload(PathBuf::from(unquote(rest))))
            }
        }

        "/remove" => no_argument("/remove", rest, SpecialCommand::Remove),
        "/status" => no_argument("/status", rest, SpecialCommand::ShowStatus),
        "/history" => no_argument("/history", rest, SpecialCommand::ShowHistory),
        "/help" | "/?" => Ok(SpecialCommand::Help),

        // Exit commands
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        "exit" | "quit" if rest.is_empty() => Ok(SpecialCommand::Exit),

        // Unknown command starting with "/"
        cmd if cmd.starts_with('/') => Err(CommandError::UnknownCommand {
            command: cmd.to_string(),
            suggestion: suggest_command(cmd),
        }),

        // Not a special command
        _ => Ok(SpecialCommand::None),
    }
}

fn no_argument(
    command: &str,
    rest: &str,
    parsed: SpecialCommand,
) -> Result<SpecialCommand, CommandError> {
    if rest.is_empty() {
        Ok(parsed)
    } else {
        Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: rest.to_string(),
        })
    }
}

/// Strips one pair of matching surrounding quotes
fn unquote(arg: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = arg
            .strip_prefix(quote)
            .and_then(|s| s.strip_suffix(quote))
        {
            return inner;
        }
    }
    arg
}

/// Closest known command to `input`, if it is close enough to be a typo
pub fn suggest_command(input: &str) -> Option<String> {
    KNOWN_COMMANDS
        .iter()
        .map(|known| (known, strsim::levenshtein(input, known)))
        .filter(|(_, distance)| *distance <= MAX_SUGGESTION_DISTANCE)
        .min_by_key(|(_, distance)| *distance)
        .map(|(known, _)| known.to_string())
}

/// Display help text for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
===========================================

DOCUMENT:
  /upload <path>  - Upload a PDF, replacing the current document
  /remove         - Remove the document and clear the conversation

SESSION:
  /status         - Show the current document and pending requests
  /history        - Reprint the whole conversation

OTHER:
  /help           - Show this help message
  /exit, exit     - Leave the chat (also /quit, quit)

Anything else is sent as a question about the current document.
"#
    );
}

/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `chat`   : interactive session over one document at a time
- `ask`    : upload a document, ask one question, print the transcript
- `health` : probe the backend health endpoint

All of them drive a [`SessionController`] and render from its store.
*/

use std::sync::Arc;

use colored::Colorize;

use crate::config::Config;
use crate::error::{DocChatError, Result};
use crate::flow::{CompletionPolicy, SessionController};
use crate::session::SessionStore;
use crate::transport::HttpBackend;

// Terminal formatting of messages and status
pub mod render;

// Special commands parser for the interactive loop
pub mod special_commands;

/// Builds a controller talking HTTP to the configured backend
///
/// # Errors
///
/// Returns error if the backend URL is invalid or the HTTP client cannot
/// be created
pub fn build_controller(config: &Config) -> Result<SessionController> {
    let backend = HttpBackend::from_config(&config.backend)?;
    let policy = CompletionPolicy::from(&config.session);
    tracing::debug!(?policy, "Completion policy");
    Ok(SessionController::new(
        SessionStore::new(),
        Arc::new(backend),
        policy,
    ))
}

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Reads lines with rustyline. Uploads and questions run as background
    //! tasks so that the prompt stays usable while a request is pending:
    //! the user can remove the document or start another upload meanwhile.
    //! A render task prints new messages as the store changes.

    use super::render::{format_size, Renderer, TranscriptView};
    use super::special_commands::{parse_special_command, print_help, SpecialCommand};
    use super::*;
    use crate::flow::FlowOutcome;
    use crate::session::Session;
    use crate::transport::FileUpload;
    use directories::ProjectDirs;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::path::{Path, PathBuf};
    use tokio::task::JoinHandle;

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `file` - Optional document to upload before the first prompt
    ///
    /// # Errors
    ///
    /// Returns error if the backend client or the line editor cannot be
    /// created
    pub async fn run_chat(config: Config, file: Option<PathBuf>) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        let controller = build_controller(&config)?;
        let renderer = Renderer::new(config.chat.show_timestamps)?;
        let printer = spawn_printer(controller.store().clone(), renderer.clone());

        let mut rl = DefaultEditor::new().map_err(DocChatError::from)?;
        let history_path = history_file(&config);
        if let Some(path) = &history_path {
            if let Err(e) = rl.load_history(path) {
                tracing::debug!("No readline history loaded from {}: {}", path.display(), e);
            }
        }

        print_welcome_banner(&config);

        if let Some(path) = file {
            if let Some(upload) = read_document(&path).await {
                report_outcome(controller.upload(upload).await);
            }
        }

        loop {
            match rl.readline("docchat> ") {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)
                        .map_err(DocChatError::from)?;

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().red());
                            continue;
                        }
                    };

                    match command {
                        SpecialCommand::Upload(path) => {
                            start_upload(&controller, &path).await;
                        }
                        SpecialCommand::Remove => {
                            controller.remove();
                            println!("{}\n", "Document removed.".yellow());
                        }
                        SpecialCommand::ShowStatus => {
                            println!("\n{}\n", renderer.format_status(&controller.store().snapshot()));
                        }
                        SpecialCommand::ShowHistory => {
                            print_history(&renderer, &controller.store().snapshot());
                        }
                        SpecialCommand::Help => print_help(),
                        SpecialCommand::Exit => break,
                        SpecialCommand::None => {
                            // Untrimmed: the question is echoed as typed
                            start_question(&controller, line);
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(path) = &history_path {
            if let Err(e) = rl.save_history(path) {
                tracing::warn!("Failed to save readline history to {}: {}", path.display(), e);
            }
        }

        printer.abort();
        println!("Goodbye!");
        Ok(())
    }

    async fn start_upload(controller: &SessionController, path: &Path) {
        if controller.store().snapshot().upload_in_flight() {
            println!(
                "{}\n",
                "An upload is already in progress, wait for it to finish.".yellow()
            );
            return;
        }

        let Some(upload) = read_document(path).await else {
            return;
        };

        let controller = controller.clone();
        tokio::spawn(async move {
            report_outcome(controller.upload(upload).await);
        });
    }

    fn start_question(controller: &SessionController, text: String) {
        let session = controller.store().snapshot();
        if session.document().is_none() {
            let hint = if session.upload_in_flight() {
                "The document is still being processed, please wait."
            } else {
                "Upload a document first with /upload <path>."
            };
            println!("{}\n", hint.yellow());
            return;
        }
        if session.answer_in_flight() {
            println!(
                "{}\n",
                "Still waiting for the previous answer.".yellow()
            );
            return;
        }

        let controller = controller.clone();
        tokio::spawn(async move {
            report_outcome(controller.ask(text).await);
        });
    }

    /// Reads a local file, reporting problems to the user
    async fn read_document(path: &Path) -> Option<FileUpload> {
        match FileUpload::from_path(path).await {
            Ok(upload) => {
                println!(
                    "{}",
                    format!(
                        "Uploading {} ({})...",
                        upload.name,
                        format_size(upload.size_bytes)
                    )
                    .cyan()
                );
                Some(upload)
            }
            Err(e) => {
                eprintln!("{}\n", format!("Error: {}", e).red());
                None
            }
        }
    }

    fn report_outcome(outcome: FlowOutcome) {
        match outcome {
            FlowOutcome::Failed(failure) => tracing::debug!("Request failed: {}", failure),
            FlowOutcome::Stale => tracing::debug!("Response arrived after the session changed"),
            FlowOutcome::Completed | FlowOutcome::Ignored => {}
        }
    }

    /// Prints new messages whenever the session changes
    fn spawn_printer(store: SessionStore, renderer: Renderer) -> JoinHandle<()> {
        let mut rx = store.subscribe();
        tokio::spawn(async move {
            let mut view = TranscriptView::new();
            let mut was_answering = false;
            loop {
                let session = rx.borrow_and_update().clone();
                for message in view.take_new(&session) {
                    println!("\n{}\n", renderer.format_message(message));
                }
                if session.answer_in_flight() && !was_answering {
                    println!("{}", "Thinking...".dimmed());
                }
                was_answering = session.answer_in_flight();

                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    fn print_history(renderer: &Renderer, session: &Session) {
        if session.messages().is_empty() {
            println!("{}\n", "No messages yet.".dimmed());
            return;
        }
        println!();
        for message in session.messages() {
            println!("{}\n", renderer.format_message(message));
        }
    }

    fn history_file(config: &Config) -> Option<PathBuf> {
        if let Some(path) = &config.chat.history_file {
            return Some(path.clone());
        }

        let dirs = ProjectDirs::from("com", "docchat", "docchat")?;
        let data_dir = dirs.data_dir();
        if let Err(e) = std::fs::create_dir_all(data_dir) {
            tracing::warn!("Cannot create {}: {}", data_dir.display(), e);
            return None;
        }
        Some(data_dir.join("history.txt"))
    }

    /// Display welcome banner at the start of interactive chat mode
    fn print_welcome_banner(config: &Config) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║            DocChat - Ask questions about a PDF              ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Backend: {}", config.backend.base_url.cyan());
        println!("Type '/upload <path>' to add a document, '/help' for commands, 'exit' to quit\n");
    }

}

// One-shot ask command handler
pub mod ask {
    //! Upload a document, ask one question and print the result.

    use super::render::Renderer;
    use super::*;
    use crate::flow::FlowOutcome;
    use crate::transport::FileUpload;
    use std::path::PathBuf;

    /// Run a single upload and question
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `file` - Document to upload
    /// * `question` - Question to ask once the upload succeeded
    /// * `json` - Print the final session as JSON instead of a transcript
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, or if the upload or the
    /// question failed. The transcript is printed before the error is
    /// returned.
    pub async fn run_ask(config: Config, file: PathBuf, question: String, json: bool) -> Result<()> {
        let controller = build_controller(&config)?;
        let upload = FileUpload::from_path(&file).await?;

        let mut failure = match controller.upload(upload).await {
            FlowOutcome::Failed(f) => Some(format!("Upload failed: {}", f)),
            _ => None,
        };

        if failure.is_none() {
            failure = match controller.ask(question).await {
                FlowOutcome::Failed(f) => Some(format!("Question failed: {}", f)),
                FlowOutcome::Ignored => Some("Question is empty".to_string()),
                _ => None,
            };
        }

        let session = controller.store().snapshot();
        if json {
            let rendered = serde_json::to_string_pretty(&session).map_err(DocChatError::from)?;
            println!("{}", rendered);
        } else {
            let renderer = Renderer::new(config.chat.show_timestamps)?;
            for message in session.messages() {
                println!("{}\n", renderer.format_message(message));
            }
        }

        match failure {
            Some(reason) => Err(anyhow::anyhow!(reason)),
            None => Ok(()),
        }
    }
}

// Health command handler
pub mod health {
    //! Probe the backend and report whether it can serve requests.

    use super::*;

    /// Check backend health
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unreachable or reports itself
    /// unhealthy
    pub async fn run_health(config: Config, json: bool) -> Result<()> {
        let backend = HttpBackend::from_config(&config.backend)?;
        let status = backend.health().await.map_err(|failure| {
            anyhow::anyhow!(
                "Backend at {} is unreachable: {}",
                config.backend.base_url,
                failure
            )
        })?;

        if json {
            println!("{}", serde_json::to_string_pretty(&status)?);
        } else {
            let label = if status.is_healthy() {
                status.status.green()
            } else {
                status.status.red()
            };
            println!("Backend: {}", config.backend.base_url);
            println!("Status:  {}", label);
            if let Some(configured) = status.groq_api_key_configured {
                println!("LLM key configured:       {}", yes_no(configured));
            }
            if let Some(configured) = status.hf_token_configured {
                println!("Embedding token configured: {}", yes_no(configured));
            }
            if let Some(error) = &status.error {
                println!("Error:   {}", error.red());
            }
        }

        if status.is_healthy() {
            Ok(())
        } else {
            Err(anyhow::anyhow!("Backend reported status '{}'", status.status))
        }
    }

    fn yes_no(value: bool) -> &'static str {
        if value {
            "yes"
        } else {
            "no"
        }
    }
}

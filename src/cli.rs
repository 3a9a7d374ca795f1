//! Command-line interface definition for DocChat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot questions and a
//! backend health check.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// DocChat - ask questions about a document
///
/// Upload a PDF to a document Q&A service and hold a conversation
/// about its content.
#[derive(Parser, Debug, Clone)]
#[command(name = "docchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Override the backend base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for DocChat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Document to upload before the first prompt
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Upload a document and ask a single question
    Ask {
        /// Document to upload
        #[arg(short, long)]
        file: PathBuf,

        /// Question to ask about the document
        #[arg(short, long)]
        question: String,

        /// Print the resulting session as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the backend is reachable and configured
    Health {
        /// Print the raw health report as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

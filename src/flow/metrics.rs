//! Request metrics for the upload and conversation flows
//!
//! # Metrics
//!
//! - `docchat_uploads_total{status}`: uploads by outcome
//! - `docchat_questions_total{status}`: questions by outcome
//! - `docchat_request_duration_seconds{operation,status}`: backend latency
//! - `docchat_stale_responses_total{operation}`: responses dropped because
//!   their session was gone
//!
//! Nothing is exported unless the embedding application installs a
//! recorder.

use metrics::{histogram, increment_counter};
use std::fmt;
use std::time::Instant;

/// Backend operation being measured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Document upload
    Upload,
    /// Question
    Ask,
}

impl Operation {
    /// Label value used in metrics and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Ask => "ask",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Times one backend request
#[derive(Debug)]
pub struct RequestTimer {
    operation: Operation,
    start: Instant,
}

impl RequestTimer {
    /// Starts timing a request
    pub fn start(operation: Operation) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }

    /// Records duration and outcome ("success" or "failure")
    pub fn finish(self, status: &'static str) {
        histogram!(
            "docchat_request_duration_seconds",
            self.start.elapsed().as_secs_f64(),
            "operation" => self.operation.as_str(),
            "status" => status
        );

        match self.operation {
            Operation::Upload => increment_counter!("docchat_uploads_total", "status" => status),
            Operation::Ask => increment_counter!("docchat_questions_total", "status" => status),
        }
    }
}

/// Counts a response dropped because its session was replaced
pub fn record_stale(operation: Operation) {
    increment_counter!(
        "docchat_stale_responses_total",
        "operation" => operation.as_str()
    );
}

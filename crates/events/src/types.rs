//! Event types for deck generation progress

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Source label used for pipeline-level messages.
pub const SYSTEM_SOURCE: &str = "System";

/// Envelope wrapping all events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// Run this event belongs to
    pub run_id: Uuid,
    /// Position within the run, starting at 0
    pub sequence: u64,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: ProgressEvent,
}

impl ProgressEnvelope {
    pub fn new(run_id: Uuid, sequence: u64, event: ProgressEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_id,
            sequence,
            timestamp: Utc::now(),
            event,
        }
    }
}

/// All events a run can emit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Free-form progress line from an agent or the pipeline
    #[serde(rename = "progress.message")]
    Message { source: String, message: String },

    /// Pipeline moved to another phase
    #[serde(rename = "progress.phase_changed")]
    PhaseChanged { from: String, to: String },

    /// Run reached a terminal status
    #[serde(rename = "progress.finished")]
    Finished {
        status: String,
        error: Option<String>,
    },
}

impl ProgressEvent {
    pub fn message(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Message {
            source: source.into(),
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }

    pub fn source(&self) -> &str {
        match self {
            Self::Message { source, .. } => source,
            Self::PhaseChanged { .. } | Self::Finished { .. } => SYSTEM_SOURCE,
        }
    }

    /// One-line rendering for terminals and logs.
    pub fn summary(&self) -> String {
        match self {
            Self::Message { source, message } => format!("[{}] {}", source, message),
            Self::PhaseChanged { from, to } => format!("[{}] phase {} -> {}", SYSTEM_SOURCE, from, to),
            Self::Finished { status, error } => match error {
                Some(e) => format!("[{}] finished: {} ({})", SYSTEM_SOURCE, status, e),
                None => format!("[{}] finished: {}", SYSTEM_SOURCE, status),
            },
        }
    }
}

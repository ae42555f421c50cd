use deck_core::CoreError;
use thiserror::Error;
use uuid::Uuid;

use crate::state_machine::DeckPhase;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Invalid phase transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Commander specifier is empty")]
    EmptySpecifier,

    #[error("Deck count {0} is outside 1..=4")]
    InvalidDeckCount(usize),

    #[error("Run not found: {0}")]
    RunNotFound(Uuid),

    #[error("Phase {phase} failed: {reason}")]
    PhaseFailed { phase: DeckPhase, reason: String },

    #[error("Inventory unavailable: {0}")]
    Inventory(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Run task failed: {0}")]
    Join(String),
}

impl OrchestratorError {
    pub fn phase_failed(phase: DeckPhase, reason: impl Into<String>) -> Self {
        Self::PhaseFailed {
            phase,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

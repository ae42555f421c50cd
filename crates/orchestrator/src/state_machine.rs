use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{OrchestratorError, Result};

/// Phases of a single deck generation run, in execution order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeckPhase {
    Setup,
    Discovery,
    Voting,
    LandFill,
    Validate,
    ComboExtract,
    Done,
}

impl DeckPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Discovery => "discovery",
            Self::Voting => "voting",
            Self::LandFill => "land_fill",
            Self::Validate => "validate",
            Self::ComboExtract => "combo_extract",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for DeckPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct DeckStateMachine;

impl DeckStateMachine {
    pub fn validate_transition(from: &DeckPhase, to: &DeckPhase) -> Result<()> {
        if Self::next_phase(from).as_ref() == Some(to) {
            Ok(())
        } else {
            Err(OrchestratorError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }

    pub fn can_transition(from: &DeckPhase, to: &DeckPhase) -> bool {
        Self::validate_transition(from, to).is_ok()
    }

    pub fn next_phase(current: &DeckPhase) -> Option<DeckPhase> {
        match current {
            DeckPhase::Setup => Some(DeckPhase::Discovery),
            DeckPhase::Discovery => Some(DeckPhase::Voting),
            DeckPhase::Voting => Some(DeckPhase::LandFill),
            DeckPhase::LandFill => Some(DeckPhase::Validate),
            DeckPhase::Validate => Some(DeckPhase::ComboExtract),
            DeckPhase::ComboExtract => Some(DeckPhase::Done),
            DeckPhase::Done => None,
        }
    }
}

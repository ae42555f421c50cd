use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::card::CardRecord;

pub const MIN_AGENTS: usize = 1;
pub const MAX_AGENTS: usize = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeckStatus {
    #[default]
    Pending,
    Generating,
    Completed,
    Failed,
}

impl DeckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "generating" => Some(Self::Generating),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Whether the pipeline researches a strategy before voting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    #[default]
    Fast,
    Thinking,
}

impl GenerationMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Some(Self::Fast),
            "thinking" => Some(Self::Thinking),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckSettings {
    /// One commander name, or partners joined with `+`.
    pub commander_specifier: String,
    #[serde(default = "default_agent_count")]
    pub agent_count: usize,
    #[serde(default)]
    pub use_owned_cards: bool,
    #[serde(default)]
    pub mode: GenerationMode,
}

fn default_agent_count() -> usize {
    MIN_AGENTS
}

impl DeckSettings {
    pub fn new(commander_specifier: impl Into<String>) -> Self {
        Self {
            commander_specifier: commander_specifier.into(),
            agent_count: MIN_AGENTS,
            use_owned_cards: false,
            mode: GenerationMode::default(),
        }
    }

    pub fn with_agents(mut self, agent_count: usize) -> Self {
        self.agent_count = agent_count;
        self
    }

    pub fn with_owned_cards(mut self, use_owned_cards: bool) -> Self {
        self.use_owned_cards = use_owned_cards;
        self
    }

    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Agent count limited to the supported range.
    pub fn clamped_agent_count(&self) -> usize {
        self.agent_count.clamp(MIN_AGENTS, MAX_AGENTS)
    }
}

/// A known interaction between cards of the finished deck.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComboRecord {
    pub cards: Vec<Arc<CardRecord>>,
    pub result: String,
    pub instructions: String,
}

impl ComboRecord {
    pub fn card_names(&self) -> Vec<&str> {
        self.cards.iter().map(|c| c.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckResult {
    pub id: Uuid,
    /// Commander label as requested, e.g. `Tymna the Weaver + Thrasios, Triton Hero`.
    pub commander: String,
    /// Commander records that resolved during lookup.
    #[serde(default)]
    pub commanders: Vec<Arc<CardRecord>>,
    /// Number of commanders counted against the deck size, resolved or not.
    #[serde(default)]
    pub commander_count: usize,
    pub cards: Vec<Arc<CardRecord>>,
    #[serde(default)]
    pub combos: Vec<ComboRecord>,
    pub status: DeckStatus,
    pub created_at: DateTime<Utc>,
}

impl DeckResult {
    pub fn pending(commander: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            commander: commander.into(),
            commanders: Vec::new(),
            commander_count: 0,
            cards: Vec::new(),
            combos: Vec::new(),
            status: DeckStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Commanders plus the quantity of every card entry.
    pub fn total_entries(&self) -> usize {
        self.commander_count + self.cards.iter().map(|c| c.quantity as usize).sum::<usize>()
    }

    pub fn non_land_count(&self) -> usize {
        self.cards.iter().filter(|c| !c.is_land()).count()
    }

    pub fn count_named(&self, name: &str) -> usize {
        self.cards.iter().filter(|c| c.name == name).count()
    }
}

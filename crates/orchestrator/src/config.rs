//! Pipeline tuning knobs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Sizes, thresholds and timeouts for one deck generation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Total entries in a finished deck, commanders included.
    pub deck_size: usize,
    /// Voting stops once this many non-land cards are confirmed.
    pub non_land_target: usize,
    /// Candidates shown to an agent per oracle call.
    pub batch_size: usize,
    /// Result bound for each search term.
    pub term_result_limit: usize,
    /// Pools smaller than this trigger one identity-only search.
    pub pool_floor: usize,
    pub broaden_limit: usize,
    /// Characters of rules text included per candidate in agent prompts.
    pub oracle_text_preview: usize,
    pub oracle_timeout_secs: u64,
    pub lookup_timeout_secs: u64,
    /// Fixed seed for shuffling and personality sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shuffle_seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            deck_size: 100,
            non_land_target: 63,
            batch_size: 10,
            term_result_limit: 25,
            pool_floor: 100,
            broaden_limit: 175,
            oracle_text_preview: 160,
            oracle_timeout_secs: 120,
            lookup_timeout_secs: 20,
            shuffle_seed: None,
        }
    }
}

impl PipelineConfig {
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    /// Batch size that never stalls the voting loop.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}

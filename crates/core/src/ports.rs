//! Contracts for the external collaborators the orchestrator depends on.
//!
//! Adapters live in their own crates (`scryfall`, `oracle`); the orchestrator
//! only ever sees these traits, wrapped in timeouts and fallbacks.

use async_trait::async_trait;

use crate::domain::CardRecord;
use crate::error::CoreResult;

/// Free-text completion. Output is non-deterministic and may be off-format.
#[async_trait]
pub trait TextOracle: Send + Sync {
    async fn generate(&self, prompt: &str) -> CoreResult<String>;
}

/// Fuzzy single-card lookup by name.
#[async_trait]
pub trait CardLookup: Send + Sync {
    async fn lookup(&self, name: &str) -> CoreResult<Option<CardRecord>>;
}

/// Ranked search using the service's query grammar.
#[async_trait]
pub trait CardSearch: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> CoreResult<Vec<CardRecord>>;
}

/// Lookup and search offered by one service.
pub trait CardCatalog: CardLookup + CardSearch {}

impl<T: CardLookup + CardSearch> CardCatalog for T {}

/// Cards the user owns.
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn list(&self) -> CoreResult<Vec<CardRecord>>;
}

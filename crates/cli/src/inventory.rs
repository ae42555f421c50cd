use std::path::PathBuf;

use async_trait::async_trait;
use deck_core::{CardRecord, CoreError, CoreResult, InventorySource};
use tracing::debug;

/// Owned cards stored as a JSON array of card records.
pub struct JsonInventory {
    path: PathBuf,
}

impl JsonInventory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl InventorySource for JsonInventory {
    async fn list(&self) -> CoreResult<Vec<CardRecord>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            CoreError::collaborator("inventory", format!("{}: {}", self.path.display(), e))
        })?;

        let cards: Vec<CardRecord> = serde_json::from_str(&content).map_err(|e| {
            CoreError::collaborator("inventory", format!("{}: {}", self.path.display(), e))
        })?;

        debug!(path = %self.path.display(), cards = cards.len(), "Loaded inventory");
        Ok(cards)
    }
}

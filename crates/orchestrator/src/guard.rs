//! Timeout and fallback wrapper around the external collaborators.
//!
//! Nothing past this layer sees a collaborator error: oracle failures become
//! empty text, lookup failures become "not found" and search failures become
//! an empty result list.

use std::sync::Arc;
use std::time::Duration;

use deck_core::{CardCatalog, CardRecord, TextOracle};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::PipelineConfig;

#[derive(Clone)]
pub struct Collaborators {
    oracle: Arc<dyn TextOracle>,
    catalog: Arc<dyn CardCatalog>,
    oracle_timeout: Duration,
    lookup_timeout: Duration,
}

impl Collaborators {
    pub fn new(
        oracle: Arc<dyn TextOracle>,
        catalog: Arc<dyn CardCatalog>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            oracle,
            catalog,
            oracle_timeout: config.oracle_timeout(),
            lookup_timeout: config.lookup_timeout(),
        }
    }

    /// Oracle completion, or an empty string on error or timeout.
    pub async fn generate(&self, prompt: &str) -> String {
        match timeout(self.oracle_timeout, self.oracle.generate(prompt)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(error = %e, "Oracle request failed");
                String::new()
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.oracle_timeout.as_secs(),
                    "Oracle request timed out"
                );
                String::new()
            }
        }
    }

    pub async fn lookup(&self, name: &str) -> Option<CardRecord> {
        match timeout(self.lookup_timeout, self.catalog.lookup(name)).await {
            Ok(Ok(card)) => card,
            Ok(Err(e)) => {
                warn!(name = %name, error = %e, "Card lookup failed");
                None
            }
            Err(_) => {
                warn!(name = %name, "Card lookup timed out");
                None
            }
        }
    }

    pub async fn search(&self, query: &str, limit: usize) -> Vec<CardRecord> {
        match timeout(self.lookup_timeout, self.catalog.search(query, limit)).await {
            Ok(Ok(cards)) => {
                debug!(query = %query, count = cards.len(), "Search returned");
                cards
            }
            Ok(Err(e)) => {
                warn!(query = %query, error = %e, "Card search failed");
                Vec::new()
            }
            Err(_) => {
                warn!(query = %query, "Card search timed out");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use deck_core::{CardLookup, CardSearch, CoreError, CoreResult};

    struct FailingOracle;

    #[async_trait]
    impl TextOracle for FailingOracle {
        async fn generate(&self, _prompt: &str) -> CoreResult<String> {
            Err(CoreError::collaborator("oracle", "connection refused"))
        }
    }

    struct HangingOracle;

    #[async_trait]
    impl TextOracle for HangingOracle {
        async fn generate(&self, _prompt: &str) -> CoreResult<String> {
            std::future::pending::<()>().await;
            Ok("never".to_string())
        }
    }

    struct BrokenCatalog;

    #[async_trait]
    impl CardLookup for BrokenCatalog {
        async fn lookup(&self, _name: &str) -> CoreResult<Option<CardRecord>> {
            Err(CoreError::collaborator("scryfall", "503"))
        }
    }

    #[async_trait]
    impl CardSearch for BrokenCatalog {
        async fn search(&self, _query: &str, _limit: usize) -> CoreResult<Vec<CardRecord>> {
            Err(CoreError::collaborator("scryfall", "503"))
        }
    }

    fn collaborators(oracle: Arc<dyn TextOracle>) -> Collaborators {
        Collaborators::new(oracle, Arc::new(BrokenCatalog), &PipelineConfig::default())
    }

    #[tokio::test]
    async fn test_oracle_error_becomes_empty_text() {
        let guarded = collaborators(Arc::new(FailingOracle));
        assert_eq!(guarded.generate("anything").await, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_oracle_timeout_becomes_empty_text() {
        let guarded = collaborators(Arc::new(HangingOracle));
        assert_eq!(guarded.generate("anything").await, "");
    }

    #[tokio::test]
    async fn test_catalog_errors_become_misses() {
        let guarded = collaborators(Arc::new(FailingOracle));
        assert!(guarded.lookup("Sol Ring").await.is_none());
        assert!(guarded.search("t:artifact", 10).await.is_empty());
    }
}

//! In-memory collaborators for exercising the pipeline without network access.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use deck_core::{
    name_key, CardLookup, CardRecord, CardSearch, CoreResult, InventorySource, TextOracle,
};

type Handler = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

#[derive(Default)]
struct OracleScript {
    handlers: Vec<Handler>,
    fallback: String,
    prompts: Vec<String>,
}

/// Oracle answering from a list of rules. The first rule that returns a
/// reply wins; otherwise the fallback text (empty by default) is returned.
/// Clones share rules and the prompt log.
#[derive(Clone, Default)]
pub struct ScriptedOracle {
    script: Arc<Mutex<OracleScript>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `reply` to any prompt containing `needle`.
    pub fn respond_to(self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
        let needle = needle.into();
        let reply = reply.into();
        self.respond_with(move |prompt| prompt.contains(&needle).then(|| reply.clone()))
    }

    pub fn respond_with<F>(self, handler: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.lock().handlers.push(Arc::new(handler));
        self
    }

    /// Reply used when no rule matches.
    pub fn with_fallback(self, reply: impl Into<String>) -> Self {
        self.lock().fallback = reply.into();
        self
    }

    /// Every prompt received so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.lock().prompts.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, OracleScript> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TextOracle for ScriptedOracle {
    async fn generate(&self, prompt: &str) -> CoreResult<String> {
        let mut script = self.lock();
        script.prompts.push(prompt.to_string());
        let reply = script
            .handlers
            .iter()
            .find_map(|handler| handler(prompt))
            .unwrap_or_else(|| script.fallback.clone());
        Ok(reply)
    }
}

/// Card catalog backed by fixed lookup entries and canned search results.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    cards: HashMap<String, CardRecord>,
    searches: Vec<(String, Vec<CardRecord>)>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `card` findable by case-insensitive name.
    pub fn with_card(mut self, card: CardRecord) -> Self {
        self.cards.insert(name_key(&card.name), card);
        self
    }

    /// Any query containing `fragment` returns `results`. Earlier
    /// registrations take precedence.
    pub fn with_search_results(mut self, fragment: impl Into<String>, results: Vec<CardRecord>) -> Self {
        self.searches.push((fragment.into(), results));
        self
    }

    /// Every search query received so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl CardLookup for InMemoryCatalog {
    async fn lookup(&self, name: &str) -> CoreResult<Option<CardRecord>> {
        Ok(self.cards.get(&name_key(name)).cloned())
    }
}

#[async_trait]
impl CardSearch for InMemoryCatalog {
    async fn search(&self, query: &str, limit: usize) -> CoreResult<Vec<CardRecord>> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(query.to_string());

        Ok(self
            .searches
            .iter()
            .find(|(fragment, _)| query.contains(fragment.as_str()))
            .map(|(_, results)| results.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

/// Fixed owned-card list.
#[derive(Clone, Default)]
pub struct InMemoryInventory {
    cards: Vec<CardRecord>,
}

impl InMemoryInventory {
    pub fn new(cards: Vec<CardRecord>) -> Self {
        Self { cards }
    }
}

#[async_trait]
impl InventorySource for InMemoryInventory {
    async fn list(&self) -> CoreResult<Vec<CardRecord>> {
        Ok(self.cards.clone())
    }
}

//! Entry point for callers: starts runs, tracks their results and exposes
//! their progress.

use std::collections::HashMap;
use std::sync::Arc;

use deck_core::{
    CardCatalog, CommanderSuggestion, DeckResult, DeckSettings, DeckStatus, InventorySource,
    TextOracle,
};
use events::{RunRegistry, RunReplay, RunSubscription};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::{OrchestratorError, Result};
use crate::guard::Collaborators;
use crate::pipeline::SelectionPipeline;
use crate::progress::RunProgress;
use crate::services::CommanderAdvisor;

pub const MAX_DECKS_PER_REQUEST: usize = 4;

type SharedResults = Arc<RwLock<HashMap<Uuid, DeckResult>>>;

/// A run started in the background.
pub struct RunHandle {
    pub run_id: Uuid,
    pub task: JoinHandle<DeckResult>,
    /// Attached before the run was spawned, so it sees every event.
    pub progress: RunReplay,
}

#[derive(Clone)]
pub struct DeckService {
    collaborators: Collaborators,
    inventory: Option<Arc<dyn InventorySource>>,
    config: PipelineConfig,
    registry: RunRegistry,
    results: SharedResults,
}

impl DeckService {
    pub fn new(
        oracle: Arc<dyn TextOracle>,
        catalog: Arc<dyn CardCatalog>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            collaborators: Collaborators::new(oracle, catalog, &config),
            inventory: None,
            config,
            registry: RunRegistry::new(),
            results: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_inventory(mut self, inventory: Arc<dyn InventorySource>) -> Self {
        self.inventory = Some(inventory);
        self
    }

    pub fn with_registry(mut self, registry: RunRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &RunRegistry {
        &self.registry
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Starts `deck_count` independent runs for the same settings.
    ///
    /// Each run gets its own progress channel. The handle's replay is
    /// attached before the task is spawned, so even a run that finishes
    /// immediately can still be read in full.
    pub async fn start(&self, settings: DeckSettings, deck_count: usize) -> Result<Vec<RunHandle>> {
        if !(1..=MAX_DECKS_PER_REQUEST).contains(&deck_count) {
            return Err(OrchestratorError::InvalidDeckCount(deck_count));
        }

        let mut handles = Vec::with_capacity(deck_count);
        for _ in 0..deck_count {
            let deck = self.register(&settings).await;
            let run_id = deck.id;
            let progress = self
                .registry
                .replay(run_id)
                .ok_or(OrchestratorError::RunNotFound(run_id))?;

            let service = self.clone();
            let settings = settings.clone();
            let task = tokio::spawn(async move { service.execute(settings, deck).await });

            info!(run_id = %run_id, "Deck generation started");
            handles.push(RunHandle {
                run_id,
                task,
                progress,
            });
        }

        Ok(handles)
    }

    /// Generates one deck and waits for it.
    pub async fn generate_deck(&self, settings: DeckSettings) -> DeckResult {
        let deck = self.register(&settings).await;
        self.execute(settings, deck).await
    }

    async fn register(&self, settings: &DeckSettings) -> DeckResult {
        let deck = DeckResult::pending(settings.commander_specifier.trim());
        self.registry.get_or_create(deck.id);
        self.results.write().await.insert(deck.id, deck.clone());
        deck
    }

    async fn execute(&self, settings: DeckSettings, deck: DeckResult) -> DeckResult {
        let run_id = deck.id;
        let channel = self.registry.get_or_create(run_id);
        let progress = RunProgress::new(channel);

        self.set_status(run_id, DeckStatus::Generating).await;

        let pipeline = SelectionPipeline::new(
            self.collaborators.clone(),
            self.inventory.clone(),
            self.config.clone(),
            progress.clone(),
        );
        let fallback = deck.clone();
        let run = tokio::spawn(async move { pipeline.run(&settings, deck).await });

        let (deck, error) = match run.await {
            Ok(outcome) => (outcome.deck, outcome.error.map(|e| e.to_string())),
            Err(join_error) => {
                let e = OrchestratorError::Join(join_error.to_string());
                error!(run_id = %run_id, error = %e, "Deck generation task aborted");
                progress.system(format!("Deck generation failed: {}", e));
                (
                    DeckResult {
                        status: DeckStatus::Failed,
                        ..fallback
                    },
                    Some(e.to_string()),
                )
            }
        };

        self.results.write().await.insert(run_id, deck.clone());
        progress.finished(deck.status.as_str(), error);
        self.registry.release_if_idle(&run_id);

        deck
    }

    async fn set_status(&self, run_id: Uuid, status: DeckStatus) {
        if let Some(deck) = self.results.write().await.get_mut(&run_id) {
            deck.status = status;
        }
    }

    /// Latest known state of a run.
    pub async fn result(&self, run_id: Uuid) -> Option<DeckResult> {
        self.results.read().await.get(&run_id).cloned()
    }

    pub async fn results(&self) -> Vec<DeckResult> {
        let mut decks: Vec<DeckResult> = self.results.read().await.values().cloned().collect();
        decks.sort_by_key(|d| d.created_at);
        decks
    }

    /// Live events of a running deck.
    pub fn subscribe(&self, run_id: Uuid) -> Option<RunSubscription> {
        self.registry.subscribe(run_id)
    }

    /// Everything the run has reported so far, followed by live events.
    /// The channel is released once the run is over and the replay dropped.
    pub fn history_plus_stream(&self, run_id: Uuid) -> Result<RunReplay> {
        self.registry
            .replay(run_id)
            .ok_or(OrchestratorError::RunNotFound(run_id))
    }

    pub async fn suggest_commander(&self, description: &str) -> CommanderSuggestion {
        CommanderAdvisor::new(self.collaborators.clone())
            .suggest(description)
            .await
    }
}

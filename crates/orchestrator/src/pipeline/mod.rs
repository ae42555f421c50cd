//! The deck generation pipeline for a single run.

pub mod selection;

use std::sync::Arc;

use deck_core::{
    CardRecord, ComboRecord, CommanderIdentity, DeckResult, DeckSettings, DeckStatus,
    GenerationMode, InventorySource,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};

use crate::config::PipelineConfig;
use crate::error::{OrchestratorError, Result};
use crate::guard::Collaborators;
use crate::progress::RunProgress;
use crate::prompts::DeckPrompts;
use crate::services::{
    AgentRoster, CandidatePool, CandidateSource, ColorIdentityResolver, ComboExtractor,
    LandBaseFiller, Personality, Validator, VotingAgent,
};
use crate::state_machine::{DeckPhase, DeckStateMachine};

pub use selection::SelectionState;

/// Deck produced by a run, plus the error that ended it early, if any.
#[derive(Debug)]
pub struct RunOutcome {
    pub deck: DeckResult,
    pub error: Option<OrchestratorError>,
}

/// Drives one run from commander lookup to a validated deck.
///
/// The pipeline owns all mutable run state. Phases and batches run strictly
/// one after another; only [`run`](Self::run) is public.
pub struct SelectionPipeline {
    collaborators: Collaborators,
    inventory: Option<Arc<dyn InventorySource>>,
    config: PipelineConfig,
    progress: RunProgress,
    phase: DeckPhase,
    rng: StdRng,
    identity: Option<CommanderIdentity>,
    commanders: Vec<Arc<CardRecord>>,
    state: SelectionState,
    combos: Vec<ComboRecord>,
}

impl SelectionPipeline {
    pub fn new(
        collaborators: Collaborators,
        inventory: Option<Arc<dyn InventorySource>>,
        config: PipelineConfig,
        progress: RunProgress,
    ) -> Self {
        let rng = match config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            collaborators,
            inventory,
            config,
            progress,
            phase: DeckPhase::Setup,
            rng,
            identity: None,
            commanders: Vec::new(),
            state: SelectionState::new(),
            combos: Vec::new(),
        }
    }

    pub fn phase(&self) -> DeckPhase {
        self.phase
    }

    /// Runs every phase. Failures are reported on the progress channel and
    /// yield a failed deck holding whatever was picked so far.
    pub async fn run(mut self, settings: &DeckSettings, deck: DeckResult) -> RunOutcome {
        let run_id = self.progress.run_id();
        info!(
            run_id = %run_id,
            commander = %settings.commander_specifier,
            agents = settings.clamped_agent_count(),
            mode = ?settings.mode,
            "Starting deck generation"
        );

        let outcome = self.execute(settings).await;

        let status = match &outcome {
            Ok(()) => DeckStatus::Completed,
            Err(e) => {
                error!(run_id = %run_id, phase = %self.phase, error = %e, "Deck generation failed");
                self.progress
                    .system(format!("Deck generation failed: {}", e));
                DeckStatus::Failed
            }
        };

        let deck = self.into_result(deck, status);
        info!(
            run_id = %run_id,
            status = deck.status.as_str(),
            cards = deck.cards.len(),
            total = deck.total_entries(),
            combos = deck.combos.len(),
            "Deck generation finished"
        );
        RunOutcome {
            deck,
            error: outcome.err(),
        }
    }

    fn into_result(self, deck: DeckResult, status: DeckStatus) -> DeckResult {
        DeckResult {
            commanders: self.commanders,
            commander_count: self.identity.as_ref().map_or(0, CommanderIdentity::count),
            cards: self.state.into_cards(),
            combos: self.combos,
            status,
            ..deck
        }
    }

    fn transition(&mut self, to: DeckPhase) -> Result<()> {
        DeckStateMachine::validate_transition(&self.phase, &to)?;
        self.progress.phase_changed(self.phase, to);
        self.phase = to;
        Ok(())
    }

    async fn execute(&mut self, settings: &DeckSettings) -> Result<()> {
        let label = settings.commander_specifier.trim().to_string();
        if label.is_empty() {
            return Err(OrchestratorError::EmptySpecifier);
        }
        self.progress.system(format!(
            "Starting deck generation for {} in {:?} mode.",
            label, settings.mode
        ));

        // Setup
        let identity = ColorIdentityResolver::new(self.collaborators.clone())
            .resolve(&label, &self.progress)
            .await;
        let mut roster = self.build_roster(settings.clamped_agent_count());
        self.commanders = identity.commanders.iter().cloned().map(Arc::new).collect();
        self.identity = Some(identity.clone());

        self.transition(DeckPhase::Discovery)?;
        let strategy = self.research_strategy(&identity, settings.mode).await;
        let pool = self.discover(&identity, &strategy, settings).await?;

        self.transition(DeckPhase::Voting)?;
        self.vote(pool, &mut roster, &strategy).await;

        self.transition(DeckPhase::LandFill)?;
        let lands = LandBaseFiller::fill(&mut self.state, &identity, self.config.deck_size);
        self.progress.system(format!("Adding {} basic lands.", lands));

        self.transition(DeckPhase::Validate)?;
        let report = Validator::finalize(&mut self.state, &identity, self.config.deck_size);
        if !report.is_clean() {
            self.progress.system(format!(
                "Validation adjusted the deck: {} commander duplicates removed, {} padded, {} pruned.",
                report.removed_commanders, report.padded, report.pruned
            ));
        }

        self.transition(DeckPhase::ComboExtract)?;
        self.combos = ComboExtractor::new(self.collaborators.clone())
            .extract(&identity.label(), &self.commanders, self.state.cards(), &self.progress)
            .await;

        self.transition(DeckPhase::Done)?;
        self.progress.system("Deck generation complete.");
        Ok(())
    }

    fn build_roster(&mut self, agent_count: usize) -> AgentRoster {
        let agents: Vec<VotingAgent> = Personality::sample(agent_count, &mut self.rng)
            .into_iter()
            .enumerate()
            .map(|(i, personality)| {
                let agent = VotingAgent::new(
                    format!("Agent-{}", i + 1),
                    personality,
                    self.collaborators.clone(),
                    self.config.oracle_text_preview,
                );
                self.progress.publish(
                    agent.name(),
                    format!("Joined with personality: {}", personality),
                );
                agent
            })
            .collect();
        AgentRoster::new(agents)
    }

    /// Base strategy line, extended with oracle research in thinking mode.
    async fn research_strategy(&self, identity: &CommanderIdentity, mode: GenerationMode) -> String {
        let base = format!("We are building a Commander deck for {}.", identity.label());
        if mode != GenerationMode::Thinking {
            return base;
        }

        self.progress.system("Researching strategy...");
        let research = self
            .collaborators
            .generate(&DeckPrompts::strategy(&identity.label()))
            .await;
        let research = research.trim();
        if research.is_empty() {
            return base;
        }

        self.progress.system(format!("Strategy research: {}", research));
        format!("{} Research suggests: {}", base, research)
    }

    async fn discover(
        &mut self,
        identity: &CommanderIdentity,
        strategy: &str,
        settings: &DeckSettings,
    ) -> Result<CandidatePool> {
        let source = CandidateSource::new(self.collaborators.clone(), self.config.clone());

        let terms = source
            .derive_search_terms(&identity.label(), strategy, &self.progress)
            .await;
        let mut pool = source.build_pool(&terms, identity).await;
        source
            .broaden_if_sparse(&mut pool, identity, &self.progress)
            .await;
        pool.shuffle(&mut self.rng);

        if settings.use_owned_cards {
            match &self.inventory {
                Some(inventory) => {
                    let owned = inventory
                        .list()
                        .await
                        .map_err(|e| OrchestratorError::Inventory(e.to_string()))?;
                    if owned.is_empty() {
                        self.progress
                            .system("Inventory is empty. Ignoring owned cards.");
                    } else {
                        let added = CandidateSource::inject_owned(&mut pool, owned, identity);
                        self.progress
                            .system(format!("Added {} owned cards to the front of the pool.", added));
                    }
                }
                None => self
                    .progress
                    .system("No inventory configured. Ignoring owned cards."),
            }
        }

        self.progress
            .system(format!("Candidate pool: {} cards.", pool.len()));
        Ok(pool)
    }

    /// One sweep over the pool. Stops at the non-land target or when the pool
    /// runs out.
    async fn vote(&mut self, pool: CandidatePool, roster: &mut AgentRoster, strategy: &str) {
        let target = self.config.non_land_target;
        let cards = pool.into_cards();

        for batch in cards.chunks(self.config.effective_batch_size()) {
            if self.state.non_land_count() >= target {
                break;
            }
            let Some((primary, reviewer)) = roster.next_pair() else {
                break;
            };

            self.progress
                .publish(primary.name(), format!("Reviewing {} candidates.", batch.len()));
            let proposal = primary.analyze(batch, strategy, None).await;
            self.progress.publish(primary.name(), proposal.reasoning.clone());

            let feedback = proposal.as_feedback(primary.name());
            let verdict = reviewer.analyze(batch, strategy, Some(&feedback)).await;
            self.progress.publish(reviewer.name(), verdict.reasoning.clone());

            let mut confirmed = Vec::new();
            for card in batch {
                if self.state.contains(&card.name) || !verdict.approves(&card.name) {
                    continue;
                }
                if self.state.confirm(card.clone()) {
                    confirmed.push(card.name.as_str());
                }
            }

            if !confirmed.is_empty() {
                self.progress.publish(
                    reviewer.name(),
                    format!("Approved: {}", confirmed.join(", ")),
                );
            }
            info!(
                run_id = %self.progress.run_id(),
                primary = primary.name(),
                reviewer = reviewer.name(),
                confirmed = confirmed.len(),
                non_land = self.state.non_land_count(),
                "Batch voted"
            );
        }

        self.progress.system(format!(
            "Voting complete: {} non-land cards confirmed.",
            self.state.non_land_count()
        ));
    }
}

use std::collections::HashSet;

use deck_core::{name_key, CardRecord, ColorIdentity, CommanderIdentity};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::guard::Collaborators;
use crate::progress::RunProgress;
use crate::prompts::DeckPrompts;
use crate::services::response_parser::ResponseParser;

/// Cards waiting for a vote, with the names already offered.
#[derive(Debug, Default)]
pub struct CandidatePool {
    cards: Vec<CardRecord>,
    seen: HashSet<String>,
}

impl CandidatePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn has_seen(&self, name: &str) -> bool {
        self.seen.contains(&name_key(name))
    }

    pub fn cards(&self) -> &[CardRecord] {
        &self.cards
    }

    pub fn into_cards(self) -> Vec<CardRecord> {
        self.cards
    }

    fn push(&mut self, card: CardRecord) -> bool {
        if self.seen.insert(name_key(&card.name)) {
            self.cards.push(card);
            true
        } else {
            false
        }
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Puts `cards` in front of the current order, keeping their order.
    fn prepend(&mut self, cards: Vec<CardRecord>) {
        let rest = std::mem::take(&mut self.cards);
        self.cards = cards;
        self.cards.extend(rest);
    }
}

/// Discovers candidates through the oracle and the card search service.
pub struct CandidateSource {
    collaborators: Collaborators,
    config: PipelineConfig,
}

impl CandidateSource {
    pub fn new(collaborators: Collaborators, config: PipelineConfig) -> Self {
        Self {
            collaborators,
            config,
        }
    }

    /// Search fragments suggested by the oracle. Fragments are not validated;
    /// a malformed one just finds nothing.
    pub async fn derive_search_terms(
        &self,
        label: &str,
        strategy: &str,
        progress: &RunProgress,
    ) -> Vec<String> {
        let response = self
            .collaborators
            .generate(&DeckPrompts::search_terms(label, strategy))
            .await;
        let terms = ResponseParser::parse_search_terms(&response);

        info!(run_id = %progress.run_id(), terms = terms.len(), "Derived search terms");
        if terms.is_empty() {
            progress.system("No search terms suggested.");
        } else {
            progress.system(format!("Search terms: {}", terms.join("; ")));
        }
        terms
    }

    /// Scoped query for one term: identity bound, no basics, paper only.
    pub fn scoped_query(term: &str, colors: &ColorIdentity) -> String {
        format!(
            "({}) id<={} -t:basic game:paper",
            term,
            colors.query_symbols()
        )
    }

    /// Query used when the term searches came back thin.
    pub fn identity_query(colors: &ColorIdentity) -> String {
        format!("id<={} -t:basic game:paper", colors.query_symbols())
    }

    /// Adds search results that are new, not a commander and inside the
    /// identity. Returns how many were added.
    fn merge(
        pool: &mut CandidatePool,
        results: Vec<CardRecord>,
        identity: &CommanderIdentity,
    ) -> usize {
        let mut added = 0;
        for card in results {
            if pool.has_seen(&card.name) || identity.is_commander(&card.name) {
                continue;
            }
            if !card.fits_identity(&identity.colors) {
                debug!(
                    card = %card.name,
                    card_identity = %card.color_identity,
                    "Dropping search result outside color identity"
                );
                continue;
            }
            if pool.push(card) {
                added += 1;
            }
        }
        added
    }

    pub async fn build_pool(&self, terms: &[String], identity: &CommanderIdentity) -> CandidatePool {
        let mut pool = CandidatePool::new();

        for term in terms {
            let query = Self::scoped_query(term, &identity.colors);
            let results = self
                .collaborators
                .search(&query, self.config.term_result_limit)
                .await;
            let added = Self::merge(&mut pool, results, identity);
            debug!(term = %term, added, pool_size = pool.len(), "Merged search term");
        }

        pool
    }

    /// One identity-only search when the pool is below the floor. Returns
    /// whether the extra search ran.
    pub async fn broaden_if_sparse(
        &self,
        pool: &mut CandidatePool,
        identity: &CommanderIdentity,
        progress: &RunProgress,
    ) -> bool {
        if pool.len() >= self.config.pool_floor {
            return false;
        }

        progress.system(format!(
            "Only {} candidates found, broadening the search.",
            pool.len()
        ));
        let results = self
            .collaborators
            .search(&Self::identity_query(&identity.colors), self.config.broaden_limit)
            .await;
        let added = Self::merge(pool, results, identity);
        info!(run_id = %progress.run_id(), added, pool_size = pool.len(), "Broadened candidate pool");
        true
    }

    /// Prepends owned cards the pool has not seen yet.
    ///
    /// Owned cards are NOT checked against the color identity. Out-of-identity
    /// cards are logged and kept.
    pub fn inject_owned(
        pool: &mut CandidatePool,
        owned: Vec<CardRecord>,
        identity: &CommanderIdentity,
    ) -> usize {
        let mut fresh = Vec::new();
        for card in owned {
            let key = name_key(&card.name);
            if key.is_empty() || !pool.seen.insert(key) {
                continue;
            }
            if !card.fits_identity(&identity.colors) {
                warn!(
                    card = %card.name,
                    card_identity = %card.color_identity,
                    commander_identity = %identity.colors,
                    "Owned card is outside the commander's color identity"
                );
            }
            fresh.push(card.with_quantity(1));
        }

        let added = fresh.len();
        pool.prepend(fresh);
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{InMemoryCatalog, ScriptedOracle};
    use deck_core::ManaColor;
    use std::sync::Arc;

    fn identity(symbols: &[&str], names: &[&str]) -> CommanderIdentity {
        CommanderIdentity {
            names: names.iter().map(|n| n.to_string()).collect(),
            commanders: Vec::new(),
            colors: ColorIdentity::from_symbols(symbols),
        }
    }

    fn card(name: &str, symbols: &[&str]) -> CardRecord {
        CardRecord::new(name).with_identity(ColorIdentity::from_symbols(symbols))
    }

    fn source(oracle: ScriptedOracle, catalog: InMemoryCatalog, config: PipelineConfig) -> CandidateSource {
        let collaborators = Collaborators::new(Arc::new(oracle), Arc::new(catalog), &config);
        CandidateSource::new(collaborators, config)
    }

    #[test]
    fn test_scoped_query() {
        let colors = ColorIdentity::from_symbols(["W", "U", "B", "G"]);
        assert_eq!(
            CandidateSource::scoped_query("o:proliferate", &colors),
            "(o:proliferate) id<=wubg -t:basic game:paper"
        );
        assert_eq!(
            CandidateSource::identity_query(&ColorIdentity::colorless()),
            "id<=c -t:basic game:paper"
        );
    }

    #[tokio::test]
    async fn test_derive_search_terms() {
        let oracle = ScriptedOracle::new().respond_to("search fragments", "t:angel; o:proliferate\n`t:artifact`");
        let source = source(oracle, InMemoryCatalog::new(), PipelineConfig::default());
        let progress = RunProgress::detached();

        let terms = source.derive_search_terms("Atraxa", "", &progress).await;
        assert_eq!(terms, vec!["t:angel", "o:proliferate", "t:artifact"]);
    }

    #[tokio::test]
    async fn test_build_pool_filters_and_dedups() {
        let catalog = InMemoryCatalog::new()
            .with_search_results(
                "t:angel",
                vec![card("Serra Angel", &["W"]), card("Atraxa, Praetors' Voice", &["W", "U", "B", "G"])],
            )
            .with_search_results(
                "o:proliferate",
                vec![
                    card("Serra Angel", &["W"]),
                    card("Contagion Engine", &[]),
                    card("Volt Charge", &["R"]),
                ],
            );
        let source = source(ScriptedOracle::new(), catalog, PipelineConfig::default());
        let identity = identity(&["W", "U", "B", "G"], &["Atraxa, Praetors' Voice"]);

        let pool = source
            .build_pool(&["t:angel".to_string(), "o:proliferate".to_string()], &identity)
            .await;

        let names: Vec<&str> = pool.cards().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Serra Angel", "Contagion Engine"]);
        assert!(pool.cards().iter().all(|c| !c.color_identity.contains(ManaColor::R)));
    }

    #[tokio::test]
    async fn test_colorless_identity_admits_only_colorless() {
        let catalog = InMemoryCatalog::new().with_search_results(
            "t:artifact",
            vec![card("Sol Ring", &[]), card("Swords to Plowshares", &["W"])],
        );
        let source = source(ScriptedOracle::new(), catalog, PipelineConfig::default());
        let pool = source
            .build_pool(&["t:artifact".to_string()], &identity(&[], &["Nobody"]))
            .await;

        assert_eq!(pool.len(), 1);
        assert_eq!(pool.cards()[0].name, "Sol Ring");
    }

    #[tokio::test]
    async fn test_broaden_only_when_sparse() {
        let catalog = InMemoryCatalog::new().with_search_results(
            "id<=g -t:basic",
            vec![card("Cultivate", &["G"]), card("Kodama's Reach", &["G"])],
        );
        let config = PipelineConfig {
            pool_floor: 2,
            ..Default::default()
        };
        let source = source(ScriptedOracle::new(), catalog, config);
        let identity = identity(&["G"], &["Omnath, Locus of Mana"]);
        let progress = RunProgress::detached();

        let mut pool = CandidatePool::new();
        assert!(source.broaden_if_sparse(&mut pool, &identity, &progress).await);
        assert_eq!(pool.len(), 2);

        assert!(!source.broaden_if_sparse(&mut pool, &identity, &progress).await);
    }

    #[test]
    fn test_inject_owned_prepends_without_identity_check() {
        let identity = identity(&["G"], &["Omnath, Locus of Mana"]);
        let mut pool = CandidatePool::new();
        pool.push(card("Cultivate", &["G"]));

        let owned = vec![
            card("Lightning Bolt", &["R"]).with_quantity(4),
            card("Cultivate", &["G"]),
            card("Llanowar Elves", &["G"]),
            card("Lightning Bolt", &["R"]),
        ];
        let added = CandidateSource::inject_owned(&mut pool, owned, &identity);

        assert_eq!(added, 2);
        let names: Vec<&str> = pool.cards().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Lightning Bolt", "Llanowar Elves", "Cultivate"]);
        assert_eq!(pool.cards()[0].quantity, 1);
    }
}

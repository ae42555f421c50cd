use std::collections::HashMap;
use std::sync::Arc;

use deck_core::{CardRecord, ComboRecord};
use tracing::{debug, info};

use crate::guard::Collaborators;
use crate::progress::RunProgress;
use crate::prompts::DeckPrompts;
use crate::services::response_parser::{RawCombo, ResponseParser};

/// Asks the oracle for combos in the finished deck and keeps only those
/// whose pieces are really in it.
pub struct ComboExtractor {
    collaborators: Collaborators,
}

impl ComboExtractor {
    pub fn new(collaborators: Collaborators) -> Self {
        Self { collaborators }
    }

    pub async fn extract(
        &self,
        commander_label: &str,
        commanders: &[Arc<CardRecord>],
        cards: &[Arc<CardRecord>],
        progress: &RunProgress,
    ) -> Vec<ComboRecord> {
        let index = Self::index(commanders, cards);
        let mut names: Vec<&str> = commanders
            .iter()
            .chain(cards.iter().filter(|c| !c.is_basic_land()))
            .map(|c| c.name.as_str())
            .collect();
        names.dedup();

        let response = self
            .collaborators
            .generate(&DeckPrompts::combos(commander_label, &names))
            .await;

        let combos = Self::resolve(ResponseParser::parse_combo_lines(&response), &index);
        for combo in &combos {
            progress.system(format!(
                "Found combo: {} -> {}",
                combo.card_names().join(" + "),
                combo.result
            ));
        }
        info!(run_id = %progress.run_id(), combos = combos.len(), "Combo extraction complete");
        combos
    }

    /// Exact-name index over the final selection, commanders included.
    fn index(
        commanders: &[Arc<CardRecord>],
        cards: &[Arc<CardRecord>],
    ) -> HashMap<String, Arc<CardRecord>> {
        let mut index = HashMap::new();
        for card in commanders.iter().chain(cards) {
            index
                .entry(card.name.trim().to_string())
                .or_insert_with(|| Arc::clone(card));
        }
        index
    }

    /// Keeps combos with at least two distinct participants found by exact
    /// name. Unknown names are dropped silently.
    pub fn resolve(
        raw: Vec<RawCombo>,
        index: &HashMap<String, Arc<CardRecord>>,
    ) -> Vec<ComboRecord> {
        raw.into_iter()
            .filter_map(|combo| {
                let mut participants: Vec<Arc<CardRecord>> = Vec::new();
                for name in &combo.names {
                    match index.get(name.trim()) {
                        Some(card) if !participants.iter().any(|p| Arc::ptr_eq(p, card)) => {
                            participants.push(Arc::clone(card));
                        }
                        Some(_) => {}
                        None => debug!(name = %name, "Combo piece not in deck"),
                    }
                }

                (participants.len() >= 2).then(|| ComboRecord {
                    cards: participants,
                    result: combo.result,
                    instructions: combo.instructions,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::test_support::{InMemoryCatalog, ScriptedOracle};

    fn deck() -> (Vec<Arc<CardRecord>>, Vec<Arc<CardRecord>>) {
        let commanders = vec![Arc::new(CardRecord::new("Kiki-Jiki, Mirror Breaker"))];
        let cards = vec![
            Arc::new(CardRecord::new("Zealous Conscripts")),
            Arc::new(CardRecord::new("Sol Ring")),
        ];
        (commanders, cards)
    }

    fn extractor(oracle: ScriptedOracle) -> ComboExtractor {
        ComboExtractor::new(Collaborators::new(
            Arc::new(oracle),
            Arc::new(InMemoryCatalog::new()),
            &PipelineConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_fabricated_names_yield_nothing() {
        let oracle = ScriptedOracle::new().respond_to(
            "combos",
            "Made Up Card + Another Fake | Infinite damage | Just do it",
        );
        let (commanders, cards) = deck();
        let combos = extractor(oracle)
            .extract("Kiki-Jiki", &commanders, &cards, &RunProgress::detached())
            .await;
        assert!(combos.is_empty());
    }

    #[tokio::test]
    async fn test_real_names_yield_one_combo_sharing_records() {
        let oracle = ScriptedOracle::new().respond_to(
            "combos",
            "Combo: Kiki-Jiki, Mirror Breaker + Zealous Conscripts | Result: Infinite hasty tokens | Instructions: Copy Conscripts, untap Kiki, repeat.",
        );
        let (commanders, cards) = deck();
        let progress = RunProgress::detached();
        let combos = extractor(oracle)
            .extract("Kiki-Jiki", &commanders, &cards, &progress)
            .await;

        assert_eq!(combos.len(), 1);
        assert_eq!(
            combos[0].card_names(),
            vec!["Kiki-Jiki, Mirror Breaker", "Zealous Conscripts"]
        );
        assert_eq!(combos[0].result, "Infinite hasty tokens");
        assert!(Arc::ptr_eq(&combos[0].cards[1], &cards[0]));
        assert_eq!(progress.channel().history_len(), 1);
    }

    #[test]
    fn test_resolution_is_exact_and_deduplicated() {
        let (commanders, cards) = deck();
        let index = ComboExtractor::index(&commanders, &cards);
        let raw = vec![
            RawCombo {
                names: vec!["zealous conscripts".to_string(), "Sol Ring".to_string()],
                result: "r".to_string(),
                instructions: "i".to_string(),
            },
            RawCombo {
                names: vec!["Sol Ring".to_string(), "Sol Ring".to_string()],
                result: "r".to_string(),
                instructions: "i".to_string(),
            },
        ];
        assert!(ComboExtractor::resolve(raw, &index).is_empty());
    }

    #[tokio::test]
    async fn test_empty_oracle_reply() {
        let (commanders, cards) = deck();
        let combos = extractor(ScriptedOracle::new())
            .extract("Kiki-Jiki", &commanders, &cards, &RunProgress::detached())
            .await;
        assert!(combos.is_empty());
    }
}

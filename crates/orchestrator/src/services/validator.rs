use deck_core::{CardRecord, CommanderIdentity};
use serde::Serialize;
use tracing::{info, warn};

use crate::pipeline::selection::SelectionState;

/// What the validator had to change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub removed_commanders: usize,
    pub padded: usize,
    pub pruned: usize,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.removed_commanders == 0 && self.padded == 0 && self.pruned == 0
    }
}

/// Last line of defense for the deck size.
pub struct Validator;

impl Validator {
    /// Brings commanders plus confirmed entries to exactly `deck_size`:
    /// commander duplicates are dropped, shortfalls are padded with the most
    /// common basic and overflow is pruned from the tail.
    pub fn finalize(
        state: &mut SelectionState,
        identity: &CommanderIdentity,
        deck_size: usize,
    ) -> ValidationReport {
        let mut report = ValidationReport {
            removed_commanders: state.remove_commanders(identity),
            ..Default::default()
        };

        let commander_count = identity.count();
        loop {
            let total = state.total(commander_count);
            if total > deck_size {
                match state.pop() {
                    Some(card) => {
                        report.pruned += 1;
                        info!(card = %card.name, total, "Pruned card over deck size");
                    }
                    None => {
                        warn!(commander_count, deck_size, "Commanders alone exceed deck size");
                        break;
                    }
                }
            } else if total < deck_size {
                let basic = Self::padding_basic(state, identity);
                let card = CardRecord::basic_land_named(basic)
                    .unwrap_or_else(|| CardRecord::basic_land(None));
                state.confirm(card);
                report.padded += 1;
            } else {
                break;
            }
        }

        report
    }

    fn padding_basic(state: &SelectionState, identity: &CommanderIdentity) -> &'static str {
        state
            .dominant_basic()
            .or_else(|| identity.colors.basic_land_names().first().copied())
            .unwrap_or(deck_core::COLORLESS_BASIC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::{ColorIdentity, ManaColor};

    fn identity(names: &[&str], symbols: &[&str]) -> CommanderIdentity {
        CommanderIdentity {
            names: names.iter().map(|n| n.to_string()).collect(),
            commanders: Vec::new(),
            colors: ColorIdentity::from_symbols(symbols),
        }
    }

    #[test]
    fn test_pads_with_dominant_basic() {
        let mut state = SelectionState::new();
        state.confirm(CardRecord::basic_land(Some(ManaColor::U)));
        state.confirm(CardRecord::basic_land(Some(ManaColor::U)));
        state.confirm(CardRecord::basic_land(Some(ManaColor::B)));

        let report = Validator::finalize(&mut state, &identity(&["Dimir"], &["U", "B"]), 10);
        assert_eq!(report.padded, 6);
        assert_eq!(state.total(1), 10);
        assert_eq!(state.cards().iter().filter(|c| c.name == "Island").count(), 8);
    }

    #[test]
    fn test_pads_empty_list_with_identity_basic() {
        let mut state = SelectionState::new();
        Validator::finalize(&mut state, &identity(&["Krenko"], &["R"]), 5);
        assert!(state.cards().iter().all(|c| c.name == "Mountain"));
        assert_eq!(state.total(1), 5);

        let mut state = SelectionState::new();
        Validator::finalize(&mut state, &identity(&["Karn"], &[]), 3);
        assert!(state.cards().iter().all(|c| c.name == "Wastes"));
    }

    #[test]
    fn test_prunes_from_tail() {
        let mut state = SelectionState::new();
        for name in ["A", "B", "C", "D"] {
            state.confirm(CardRecord::new(name));
        }
        state.confirm(CardRecord::basic_land(Some(ManaColor::W)));

        let report = Validator::finalize(&mut state, &identity(&["Cmd"], &["W"]), 4);
        assert_eq!(report.pruned, 2);
        let names: Vec<&str> = state.cards().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_removes_commander_collision_then_pads() {
        let mut state = SelectionState::new();
        state.confirm(CardRecord::new("Krenko, Mob Boss"));
        state.confirm(CardRecord::new("Goblin Bombardment"));

        let report = Validator::finalize(&mut state, &identity(&["Krenko, Mob Boss"], &["R"]), 4);
        assert_eq!(report.removed_commanders, 1);
        assert_eq!(report.padded, 2);
        assert_eq!(state.total(1), 4);
        assert!(!report.is_clean());
    }
}

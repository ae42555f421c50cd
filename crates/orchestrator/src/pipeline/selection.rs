use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use deck_core::{name_key, CardRecord, CommanderIdentity, BASIC_LAND_NAMES};

/// Confirmed picks for one run. Single writer; grows during voting and land
/// fill, then is padded or pruned once by the validator.
#[derive(Debug, Default)]
pub struct SelectionState {
    cards: Vec<Arc<CardRecord>>,
    /// Names of confirmed non-basic cards.
    names: HashSet<String>,
    non_land: usize,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `card` unless a non-basic card of the same name is already
    /// confirmed. Basic lands always go in.
    pub fn confirm(&mut self, card: CardRecord) -> bool {
        if !card.is_basic_land() && !self.names.insert(name_key(&card.name)) {
            return false;
        }
        if !card.is_land() {
            self.non_land += 1;
        }
        self.cards.push(Arc::new(card));
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name_key(name))
    }

    pub fn non_land_count(&self) -> usize {
        self.non_land
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Commanders plus every confirmed entry's quantity.
    pub fn total(&self, commander_count: usize) -> usize {
        commander_count + self.cards.iter().map(|c| c.quantity as usize).sum::<usize>()
    }

    pub fn cards(&self) -> &[Arc<CardRecord>] {
        &self.cards
    }

    pub fn into_cards(self) -> Vec<Arc<CardRecord>> {
        self.cards
    }

    /// Removes the most recently confirmed entry.
    pub fn pop(&mut self) -> Option<Arc<CardRecord>> {
        let card = self.cards.pop()?;
        self.forget(&card);
        Some(card)
    }

    /// Drops entries named like a commander. Returns how many were removed.
    pub fn remove_commanders(&mut self, identity: &CommanderIdentity) -> usize {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.cards)
            .into_iter()
            .partition(|card| identity.is_commander(&card.name));

        self.cards = kept;
        for card in &removed {
            self.forget(card);
        }
        removed.len()
    }

    fn forget(&mut self, card: &CardRecord) {
        if !card.is_basic_land() {
            self.names.remove(&name_key(&card.name));
        }
        if !card.is_land() {
            self.non_land -= 1;
        }
    }

    /// Most frequent basic land name, ties going to WUBRG order.
    pub fn dominant_basic(&self) -> Option<&'static str> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for card in self.cards.iter().filter(|c| c.is_basic_land()) {
            *counts.entry(card.name.as_str()).or_default() += 1;
        }

        BASIC_LAND_NAMES
            .iter()
            .filter_map(|name| counts.get(name).map(|count| (*name, *count)))
            .fold(None, |best: Option<(&'static str, usize)>, (name, count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((name, count)),
            })
            .map(|(name, _)| name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::{ColorIdentity, ManaColor};

    #[test]
    fn test_singleton_rule_exempts_basics() {
        let mut state = SelectionState::new();
        assert!(state.confirm(CardRecord::new("Sol Ring")));
        assert!(!state.confirm(CardRecord::new("sol ring")));
        assert!(state.confirm(CardRecord::basic_land(Some(ManaColor::G))));
        assert!(state.confirm(CardRecord::basic_land(Some(ManaColor::G))));

        assert_eq!(state.len(), 3);
        assert_eq!(state.non_land_count(), 1);
        assert_eq!(state.total(1), 4);
        assert!(state.contains("Sol Ring"));
    }

    #[test]
    fn test_pop_keeps_counters_consistent() {
        let mut state = SelectionState::new();
        state.confirm(CardRecord::new("Sol Ring"));
        state.confirm(CardRecord::new("Command Tower").with_type_line("Land"));

        let popped = state.pop().unwrap();
        assert_eq!(popped.name, "Command Tower");
        state.pop();
        assert_eq!(state.non_land_count(), 0);
        assert!(!state.contains("Sol Ring"));
        assert!(state.confirm(CardRecord::new("Sol Ring")));
    }

    #[test]
    fn test_remove_commanders() {
        let identity = CommanderIdentity {
            names: vec!["Atraxa, Praetors' Voice".to_string()],
            commanders: Vec::new(),
            colors: ColorIdentity::from_symbols(["W", "U", "B", "G"]),
        };
        let mut state = SelectionState::new();
        state.confirm(CardRecord::new("Atraxa, Praetors' Voice"));
        state.confirm(CardRecord::new("Doubling Season"));

        assert_eq!(state.remove_commanders(&identity), 1);
        assert_eq!(state.len(), 1);
        assert_eq!(state.non_land_count(), 1);
        assert!(!state.contains("Atraxa, Praetors' Voice"));
    }

    #[test]
    fn test_dominant_basic() {
        let mut state = SelectionState::new();
        assert_eq!(state.dominant_basic(), None);

        state.confirm(CardRecord::basic_land(Some(ManaColor::G)));
        state.confirm(CardRecord::basic_land(Some(ManaColor::W)));
        assert_eq!(state.dominant_basic(), Some("Plains"));

        state.confirm(CardRecord::basic_land(Some(ManaColor::G)));
        assert_eq!(state.dominant_basic(), Some("Forest"));
    }
}

use deck_core::{CardRecord, CommanderIdentity};

use crate::pipeline::selection::SelectionState;

/// Fills the rest of the deck with basic lands.
pub struct LandBaseFiller;

impl LandBaseFiller {
    /// Basics still needed once non-land picks and commanders are counted.
    pub fn needed(deck_size: usize, non_land: usize, commander_count: usize) -> usize {
        deck_size.saturating_sub(non_land + commander_count)
    }

    /// Appends basics one at a time, cycling through the identity's colors in
    /// WUBRG order. Colorless identities get Wastes. Returns how many were
    /// added.
    pub fn fill(
        state: &mut SelectionState,
        identity: &CommanderIdentity,
        deck_size: usize,
    ) -> usize {
        let needed = Self::needed(deck_size, state.non_land_count(), identity.count());
        if needed == 0 {
            return 0;
        }

        let colors: Vec<_> = if identity.colors.is_colorless() {
            vec![None]
        } else {
            identity.colors.colors().map(Some).collect()
        };

        let mut added = 0;
        for color in colors.iter().cycle().take(needed) {
            if state.confirm(CardRecord::basic_land(*color)) {
                added += 1;
            }
        }
        added
    }
}

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One of the five colored mana symbols, ordered W, U, B, R, G.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ManaColor {
    W,
    U,
    B,
    R,
    G,
}

impl ManaColor {
    pub const ALL: [ManaColor; 5] = [Self::W, Self::U, Self::B, Self::R, Self::G];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::W => "W",
            Self::U => "U",
            Self::B => "B",
            Self::R => "R",
            Self::G => "G",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "W" => Some(Self::W),
            "U" => Some(Self::U),
            "B" => Some(Self::B),
            "R" => Some(Self::R),
            "G" => Some(Self::G),
            _ => None,
        }
    }

    /// Name of the basic land that produces this color.
    pub fn basic_land_name(&self) -> &'static str {
        match self {
            Self::W => "Plains",
            Self::U => "Island",
            Self::B => "Swamp",
            Self::R => "Mountain",
            Self::G => "Forest",
        }
    }
}

impl fmt::Display for ManaColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ManaColor {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value).ok_or_else(|| CoreError::UnknownColor(value.to_string()))
    }
}

/// The basic land used for colorless identities.
pub const COLORLESS_BASIC: &str = "Wastes";

/// Names that are exempt from the singleton rule.
pub const BASIC_LAND_NAMES: [&str; 6] = ["Plains", "Island", "Swamp", "Mountain", "Forest", "Wastes"];

/// A set of color symbols. An empty identity is colorless.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ColorIdentity(BTreeSet<ManaColor>);

impl ColorIdentity {
    pub fn colorless() -> Self {
        Self::default()
    }

    /// Build an identity from loosely formatted symbols, ignoring anything
    /// outside W/U/B/R/G.
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            symbols
                .into_iter()
                .filter_map(|s| ManaColor::parse(s.as_ref()))
                .collect(),
        )
    }

    pub fn insert(&mut self, color: ManaColor) {
        self.0.insert(color);
    }

    pub fn extend(&mut self, other: &ColorIdentity) {
        self.0.extend(other.0.iter().copied());
    }

    pub fn union(&self, other: &ColorIdentity) -> ColorIdentity {
        Self(self.0.union(&other.0).copied().collect())
    }

    pub fn is_subset(&self, other: &ColorIdentity) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn contains(&self, color: ManaColor) -> bool {
        self.0.contains(&color)
    }

    pub fn is_colorless(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Colors in WUBRG order.
    pub fn colors(&self) -> impl Iterator<Item = ManaColor> + '_ {
        self.0.iter().copied()
    }

    /// Basic land names for this identity in WUBRG order, or `Wastes` alone
    /// when colorless.
    pub fn basic_land_names(&self) -> Vec<&'static str> {
        if self.is_colorless() {
            return vec![COLORLESS_BASIC];
        }
        self.colors().map(|c| c.basic_land_name()).collect()
    }

    /// Fragment for an "at most these colors" search filter, e.g. `wubg`, or
    /// `c` for colorless.
    pub fn query_symbols(&self) -> String {
        if self.is_colorless() {
            return "c".to_string();
        }
        self.colors()
            .map(|c| c.as_str().to_ascii_lowercase())
            .collect()
    }
}

impl fmt::Display for ColorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_colorless() {
            return f.write_str("Colorless");
        }
        for color in self.colors() {
            f.write_str(color.as_str())?;
        }
        Ok(())
    }
}

impl FromIterator<ManaColor> for ColorIdentity {
    fn from_iter<T: IntoIterator<Item = ManaColor>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

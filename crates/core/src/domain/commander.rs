use serde::{Deserialize, Serialize};

use super::card::CardRecord;
use super::color::ColorIdentity;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommanderDetails {
    pub name: String,
    pub image_uri: Option<String>,
}

/// A commander (or partner pair) picked for a free-text deck description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommanderSuggestion {
    pub name: String,
    pub reasoning: String,
    pub image_uri: Option<String>,
    #[serde(default)]
    pub commanders: Vec<CommanderDetails>,
}

impl CommanderSuggestion {
    /// The specifier to feed back into deck generation.
    pub fn specifier(&self) -> &str {
        &self.name
    }
}

/// Resolved commander names and the union of their color identities.
///
/// Computed once per run and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommanderIdentity {
    /// Names as requested, in order. Unresolved names stay in the list.
    pub names: Vec<String>,
    /// Records for the names the lookup service recognised.
    pub commanders: Vec<CardRecord>,
    pub colors: ColorIdentity,
}

impl CommanderIdentity {
    /// Split a specifier on the partner separators `+` and ` // `.
    pub fn split_specifier(specifier: &str) -> Vec<String> {
        specifier
            .split('+')
            .flat_map(|part| part.split(" // "))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Number of commander slots counted against the deck size.
    pub fn count(&self) -> usize {
        self.names.len()
    }

    pub fn label(&self) -> String {
        self.names.join(" + ")
    }

    /// True when `name` matches a requested or resolved commander.
    pub fn is_commander(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.trim().eq_ignore_ascii_case(name.trim()))
            || self.commanders.iter().any(|c| c.same_name(name))
    }
}

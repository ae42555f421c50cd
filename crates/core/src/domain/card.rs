use serde::{Deserialize, Serialize};

use super::color::{ColorIdentity, ManaColor, BASIC_LAND_NAMES, COLORLESS_BASIC};

fn default_quantity() -> u32 {
    1
}

/// Normalized card metadata as returned by the lookup/search service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardRecord {
    pub name: String,
    #[serde(default)]
    pub set_code: Option<String>,
    #[serde(default)]
    pub collector_number: Option<String>,
    #[serde(default)]
    pub type_line: String,
    #[serde(default)]
    pub oracle_text: String,
    #[serde(default)]
    pub mana_cost: String,
    #[serde(default)]
    pub mana_value: f64,
    #[serde(default)]
    pub colors: Vec<ManaColor>,
    #[serde(default)]
    pub color_identity: ColorIdentity,
    #[serde(default)]
    pub image_uri: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

impl CardRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            set_code: None,
            collector_number: None,
            type_line: String::new(),
            oracle_text: String::new(),
            mana_cost: String::new(),
            mana_value: 0.0,
            colors: Vec::new(),
            color_identity: ColorIdentity::colorless(),
            image_uri: None,
            quantity: 1,
        }
    }

    /// A single basic land producing `color`, or `Wastes` for colorless.
    pub fn basic_land(color: Option<ManaColor>) -> Self {
        let (name, type_line, identity) = match color {
            Some(c) => (
                c.basic_land_name(),
                format!("Basic Land — {}", c.basic_land_name()),
                [c].into_iter().collect(),
            ),
            None => (COLORLESS_BASIC, "Basic Land".to_string(), ColorIdentity::colorless()),
        };
        Self {
            type_line,
            color_identity: identity,
            ..Self::new(name)
        }
    }

    /// Basic land record looked up by its land name.
    pub fn basic_land_named(name: &str) -> Option<Self> {
        if name == COLORLESS_BASIC {
            return Some(Self::basic_land(None));
        }
        ManaColor::ALL
            .into_iter()
            .find(|c| c.basic_land_name() == name)
            .map(|c| Self::basic_land(Some(c)))
    }

    pub fn with_type_line(mut self, type_line: impl Into<String>) -> Self {
        self.type_line = type_line.into();
        self
    }

    pub fn with_oracle_text(mut self, oracle_text: impl Into<String>) -> Self {
        self.oracle_text = oracle_text.into();
        self
    }

    pub fn with_identity(mut self, identity: ColorIdentity) -> Self {
        self.color_identity = identity;
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn is_land(&self) -> bool {
        self.type_line.to_ascii_lowercase().contains("land")
    }

    /// Basic lands are exempt from the singleton rule.
    pub fn is_basic_land(&self) -> bool {
        let type_line = self.type_line.to_ascii_lowercase();
        (type_line.contains("basic") && type_line.contains("land"))
            || BASIC_LAND_NAMES.contains(&self.name.as_str())
    }

    pub fn fits_identity(&self, identity: &ColorIdentity) -> bool {
        self.color_identity.is_subset(identity)
    }

    /// Case-insensitive name comparison used for dedup and commander collisions.
    pub fn same_name(&self, other: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(other.trim())
    }
}

/// Key used for seen-name sets.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_defaults() {
        let card = CardRecord::new("Sol Ring");
        assert_eq!(card.quantity, 1);
        assert!(card.color_identity.is_colorless());
        assert!(!card.is_land());
        assert!(!card.is_basic_land());
    }

    #[test]
    fn test_basic_land_construction() {
        let forest = CardRecord::basic_land(Some(ManaColor::G));
        assert_eq!(forest.name, "Forest");
        assert!(forest.is_land());
        assert!(forest.is_basic_land());
        assert_eq!(forest.color_identity.to_string(), "G");

        let wastes = CardRecord::basic_land(None);
        assert_eq!(wastes.name, "Wastes");
        assert!(wastes.is_basic_land());
        assert!(wastes.color_identity.is_colorless());

        assert_eq!(CardRecord::basic_land_named("Island").unwrap().name, "Island");
        assert!(CardRecord::basic_land_named("Command Tower").is_none());
    }

    #[test]
    fn test_nonbasic_land_is_not_basic() {
        let tower = CardRecord::new("Command Tower").with_type_line("Land");
        assert!(tower.is_land());
        assert!(!tower.is_basic_land());
    }

    #[test]
    fn test_snow_basic_is_basic() {
        let snow = CardRecord::new("Snow-Covered Forest").with_type_line("Basic Snow Land — Forest");
        assert!(snow.is_basic_land());
    }

    #[test]
    fn test_fits_identity() {
        let card = CardRecord::new("Deathrite Shaman")
            .with_identity(ColorIdentity::from_symbols(["B", "G"]));
        assert!(card.fits_identity(&ColorIdentity::from_symbols(["W", "U", "B", "G"])));
        assert!(!card.fits_identity(&ColorIdentity::from_symbols(["G"])));
    }

    #[test]
    fn test_deserialize_with_missing_fields() {
        let card: CardRecord = serde_json::from_str(r#"{"name": "Lightning Bolt"}"#).unwrap();
        assert_eq!(card.name, "Lightning Bolt");
        assert_eq!(card.quantity, 1);
        assert!(card.image_uri.is_none());
    }

    #[test]
    fn test_same_name() {
        let card = CardRecord::new("Atraxa, Praetors' Voice");
        assert!(card.same_name("  atraxa, praetors' voice "));
        assert!(!card.same_name("Atraxa"));
        assert_eq!(name_key(" Sol Ring "), "sol ring");
    }
}

use deck_core::{CardRecord, ColorIdentity, ManaColor};
use serde::Deserialize;

/// Separator placed between the rules text of two card faces.
const FACE_TEXT_SEPARATOR: &str = "\n//\n";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ImageUris {
    #[serde(default)]
    pub normal: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CardFace {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub type_line: Option<String>,
    #[serde(default)]
    pub oracle_text: Option<String>,
    #[serde(default)]
    pub mana_cost: Option<String>,
    #[serde(default)]
    pub colors: Option<Vec<String>>,
    #[serde(default)]
    pub image_uris: Option<ImageUris>,
}

/// Card object as returned by `/cards/named` and `/cards/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScryfallCard {
    pub name: String,
    #[serde(default)]
    pub set: Option<String>,
    #[serde(default)]
    pub collector_number: Option<String>,
    #[serde(default)]
    pub type_line: Option<String>,
    #[serde(default)]
    pub oracle_text: Option<String>,
    #[serde(default)]
    pub mana_cost: Option<String>,
    #[serde(default)]
    pub cmc: Option<f64>,
    #[serde(default)]
    pub colors: Option<Vec<String>>,
    #[serde(default)]
    pub color_identity: Vec<String>,
    #[serde(default)]
    pub image_uris: Option<ImageUris>,
    #[serde(default)]
    pub card_faces: Option<Vec<CardFace>>,
}

/// One page of `/cards/search` results.
#[derive(Debug, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub data: Vec<ScryfallCard>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub total_cards: Option<u64>,
}

/// Error object returned with non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ScryfallErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    pub details: String,
}

fn parse_colors(symbols: &[String]) -> Vec<ManaColor> {
    symbols.iter().filter_map(|s| ManaColor::parse(s)).collect()
}

impl ScryfallCard {
    fn faces(&self) -> &[CardFace] {
        self.card_faces.as_deref().unwrap_or(&[])
    }

    /// Front image, falling back to the first face for double-faced cards.
    fn image_uri(&self) -> Option<String> {
        self.image_uris
            .as_ref()
            .and_then(|i| i.normal.clone())
            .or_else(|| {
                self.faces()
                    .first()
                    .and_then(|f| f.image_uris.as_ref())
                    .and_then(|i| i.normal.clone())
            })
    }

    fn joined_faces<F>(&self, field: F, separator: &str) -> String
    where
        F: Fn(&CardFace) -> Option<&String>,
    {
        self.faces()
            .iter()
            .filter_map(|f| field(f))
            .filter(|s| !s.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(separator)
    }

    pub fn into_card_record(self) -> CardRecord {
        let oracle_text = match self.oracle_text.as_deref() {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => self.joined_faces(|f| f.oracle_text.as_ref(), FACE_TEXT_SEPARATOR),
        };

        let type_line = match self.type_line.as_deref() {
            Some(line) if !line.is_empty() => line.to_string(),
            _ => self.joined_faces(|f| f.type_line.as_ref(), " // "),
        };

        let mana_cost = match self.mana_cost.as_deref() {
            Some(cost) if !cost.is_empty() => cost.to_string(),
            _ => self.joined_faces(|f| f.mana_cost.as_ref(), " // "),
        };

        let mut colors = match &self.colors {
            Some(colors) => parse_colors(colors),
            None => self
                .faces()
                .iter()
                .filter_map(|f| f.colors.as_deref())
                .flat_map(parse_colors)
                .collect(),
        };
        colors.sort();
        colors.dedup();

        let image_uri = self.image_uri();

        CardRecord {
            name: self.name,
            set_code: self.set,
            collector_number: self.collector_number,
            type_line,
            oracle_text,
            mana_cost,
            mana_value: self.cmc.unwrap_or(0.0),
            colors,
            color_identity: ColorIdentity::from_symbols(&self.color_identity),
            image_uri,
            quantity: 1,
        }
    }
}

use deck_core::{CommanderDetails, CommanderIdentity, CommanderSuggestion};
use tracing::{info, warn};

use crate::guard::Collaborators;
use crate::prompts::DeckPrompts;
use crate::services::response_parser::{ResponseParser, COMMANDER_QUERY};

const CANDIDATE_LIMIT: usize = 10;
const UNKNOWN_COMMANDER: &str = "Unknown Commander";

/// Picks a commander for a free-text deck description.
pub struct CommanderAdvisor {
    collaborators: Collaborators,
}

impl CommanderAdvisor {
    pub fn new(collaborators: Collaborators) -> Self {
        Self { collaborators }
    }

    pub async fn suggest(&self, description: &str) -> CommanderSuggestion {
        let raw_query = self
            .collaborators
            .generate(&DeckPrompts::commander_query(description))
            .await;
        let query = ResponseParser::clean_commander_query(&raw_query);

        let mut candidates = self.collaborators.search(&query, CANDIDATE_LIMIT).await;
        if candidates.is_empty() {
            warn!(query = %query, "No commander candidates, using generic query");
            candidates = self
                .collaborators
                .search(COMMANDER_QUERY, CANDIDATE_LIMIT)
                .await;
        }

        let response = self
            .collaborators
            .generate(&DeckPrompts::commander_selection(description, &candidates))
            .await;
        let (name_line, reasoning) = ResponseParser::parse_commander_selection(&response);

        let mut commanders = Vec::new();
        for name in CommanderIdentity::split_specifier(&name_line) {
            let details = match self.collaborators.lookup(&name).await {
                Some(card) => CommanderDetails {
                    name: card.name,
                    image_uri: card.image_uri,
                },
                None => CommanderDetails {
                    name,
                    image_uri: None,
                },
            };
            commanders.push(details);
        }

        let name = if commanders.is_empty() {
            UNKNOWN_COMMANDER.to_string()
        } else {
            commanders
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(" + ")
        };
        let image_uri = commanders.iter().find_map(|c| c.image_uri.clone());

        info!(commander = %name, candidates = candidates.len(), "Suggested commander");

        CommanderSuggestion {
            name,
            reasoning,
            image_uri,
            commanders,
        }
    }
}

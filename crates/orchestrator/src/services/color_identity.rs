use deck_core::{ColorIdentity, CommanderIdentity};
use tracing::{info, warn};

use crate::guard::Collaborators;
use crate::progress::RunProgress;

/// Turns a commander specifier into the identity every pick must fit.
pub struct ColorIdentityResolver {
    collaborators: Collaborators,
}

impl ColorIdentityResolver {
    pub fn new(collaborators: Collaborators) -> Self {
        Self { collaborators }
    }

    /// Looks each commander up in order. Misses contribute no colors; a run
    /// where every lookup misses ends up colorless.
    pub async fn resolve(&self, specifier: &str, progress: &RunProgress) -> CommanderIdentity {
        let names = CommanderIdentity::split_specifier(specifier);
        let mut commanders = Vec::with_capacity(names.len());
        let mut colors = ColorIdentity::colorless();

        for name in &names {
            match self.collaborators.lookup(name).await {
                Some(card) => {
                    colors.extend(&card.color_identity);
                    commanders.push(card);
                }
                None => {
                    warn!(commander = %name, "Commander lookup missed, contributing no colors");
                }
            }
        }

        info!(
            run_id = %progress.run_id(),
            commanders = names.len(),
            resolved = commanders.len(),
            colors = %colors,
            "Resolved color identity"
        );
        progress.system(format!("Color identity: {}", colors));

        CommanderIdentity {
            names,
            commanders,
            colors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::test_support::{InMemoryCatalog, ScriptedOracle};
    use deck_core::{CardRecord, ManaColor};
    use events::ProgressEvent;
    use std::sync::Arc;

    fn resolver(catalog: InMemoryCatalog) -> ColorIdentityResolver {
        ColorIdentityResolver::new(Collaborators::new(
            Arc::new(ScriptedOracle::new()),
            Arc::new(catalog),
            &PipelineConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_partner_colors_are_unioned() {
        let catalog = InMemoryCatalog::new()
            .with_card(CardRecord::new("Tymna the Weaver").with_identity(ColorIdentity::from_symbols(["W", "B"])))
            .with_card(CardRecord::new("Thrasios, Triton Hero").with_identity(ColorIdentity::from_symbols(["G", "U"])));
        let progress = RunProgress::detached();

        let identity = resolver(catalog)
            .resolve("Tymna the Weaver + Thrasios, Triton Hero", &progress)
            .await;

        assert_eq!(identity.names.len(), 2);
        assert_eq!(identity.commanders.len(), 2);
        assert_eq!(identity.colors.to_string(), "WUBG");
        assert!(!identity.colors.contains(ManaColor::R));

        let history = progress.channel().get_history();
        let last = history.last().unwrap();
        assert_eq!(last.event, ProgressEvent::message("System", "Color identity: WUBG"));
    }

    #[tokio::test]
    async fn test_failed_lookup_yields_colorless() {
        let progress = RunProgress::detached();
        let identity = resolver(InMemoryCatalog::new())
            .resolve("Nobody, the Unknown", &progress)
            .await;

        assert!(identity.colors.is_colorless());
        assert!(identity.commanders.is_empty());
        assert_eq!(identity.count(), 1);

        let history = progress.channel().get_history();
        assert_eq!(history.len(), 1);
        assert_eq!(
            history[0].event,
            ProgressEvent::message("System", "Color identity: Colorless")
        );
    }
}

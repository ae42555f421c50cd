use std::fmt;
use std::sync::Arc;

use deck_core::CardRecord;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::guard::Collaborators;
use crate::prompts::DeckPrompts;
use crate::services::response_parser::ResponseParser;

/// Deck-building temperament an agent argues from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Personality {
    Aggressive,
    ControlFreak,
    ComboLover,
    BudgetConscious,
    FlavorObsessed,
    ChaosBringer,
}

impl Personality {
    pub const ALL: [Personality; 6] = [
        Self::Aggressive,
        Self::ControlFreak,
        Self::ComboLover,
        Self::BudgetConscious,
        Self::FlavorObsessed,
        Self::ChaosBringer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aggressive => "Aggressive",
            Self::ControlFreak => "Control-freak",
            Self::ComboLover => "Combo-lover",
            Self::BudgetConscious => "Budget-conscious",
            Self::FlavorObsessed => "Flavor-obsessed",
            Self::ChaosBringer => "Chaos-bringer",
        }
    }

    /// `count` distinct personalities in random order.
    pub fn sample<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<Personality> {
        Self::ALL.choose_multiple(rng, count).copied().collect()
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed agent reply. Only a reviewer's approvals are acted on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentVerdict {
    pub reasoning: String,
    pub approved: Vec<String>,
}

impl AgentVerdict {
    /// Fallback for replies without a structured object.
    pub fn raw(content: &str) -> Self {
        Self {
            reasoning: content.trim().to_string(),
            approved: Vec::new(),
        }
    }

    /// Rendering handed to the next agent as prior feedback.
    pub fn as_feedback(&self, agent_name: &str) -> String {
        let approved = if self.approved.is_empty() {
            "none".to_string()
        } else {
            self.approved.join(", ")
        };
        format!(
            "{} said: {}\n{} approved: {}",
            agent_name, self.reasoning, agent_name, approved
        )
    }

    /// Whether any approved name loosely refers to `candidate`.
    pub fn approves(&self, candidate: &str) -> bool {
        self.approved
            .iter()
            .any(|approved| lenient_name_match(candidate, approved))
    }
}

/// Case-insensitive containment in either direction. Approved fragments
/// shorter than three characters only match when the candidate contains them
/// whole, so stray initials never match everything.
pub fn lenient_name_match(candidate: &str, approved: &str) -> bool {
    let candidate = candidate.trim().to_lowercase();
    let approved = approved.trim().to_lowercase();

    if candidate.is_empty() || approved.is_empty() {
        return false;
    }
    if approved.chars().count() < 3 {
        return candidate == approved;
    }
    candidate.contains(&approved) || approved.contains(&candidate)
}

/// One oracle-backed voter.
#[derive(Clone)]
pub struct VotingAgent {
    name: String,
    personality: Personality,
    collaborators: Collaborators,
    text_preview: usize,
}

impl VotingAgent {
    pub fn new(
        name: impl Into<String>,
        personality: Personality,
        collaborators: Collaborators,
        text_preview: usize,
    ) -> Self {
        Self {
            name: name.into(),
            personality,
            collaborators,
            text_preview,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn personality(&self) -> Personality {
        self.personality
    }

    /// Asks the oracle which cards of `batch` belong in the deck.
    pub async fn analyze(
        &self,
        batch: &[CardRecord],
        strategy: &str,
        prior_feedback: Option<&str>,
    ) -> AgentVerdict {
        let prompt = DeckPrompts::agent_review(
            &self.name,
            self.personality,
            strategy,
            batch,
            self.text_preview,
            prior_feedback,
        );

        let response = self.collaborators.generate(&prompt).await;
        let verdict = ResponseParser::parse_verdict(&response);

        debug!(
            agent = %self.name,
            personality = %self.personality,
            batch_len = batch.len(),
            approved = verdict.approved.len(),
            "Agent analysis complete"
        );

        verdict
    }
}

/// Fixed agent list plus a cursor choosing who proposes and who reviews.
pub struct AgentRoster {
    agents: Arc<[VotingAgent]>,
    cursor: usize,
}

impl AgentRoster {
    pub fn new(agents: Vec<VotingAgent>) -> Self {
        Self {
            agents: agents.into(),
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agents(&self) -> &[VotingAgent] {
        &self.agents
    }

    /// Primary and reviewer for the next batch. The reviewer is the agent
    /// after the primary, wrapping; a single agent reviews itself.
    pub fn next_pair(&mut self) -> Option<(&VotingAgent, &VotingAgent)> {
        let len = self.agents.len();
        if len == 0 {
            return None;
        }

        let primary = self.cursor % len;
        let reviewer = (primary + 1) % len;
        self.cursor = reviewer;

        Some((&self.agents[primary], &self.agents[reviewer]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::test_support::{InMemoryCatalog, ScriptedOracle};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn agent(name: &str, personality: Personality, oracle: ScriptedOracle) -> VotingAgent {
        let collaborators = Collaborators::new(
            Arc::new(oracle),
            Arc::new(InMemoryCatalog::new()),
            &PipelineConfig::default(),
        );
        VotingAgent::new(name, personality, collaborators, 160)
    }

    #[test]
    fn test_lenient_match() {
        assert!(lenient_name_match("Sol Ring", "sol ring"));
        assert!(lenient_name_match("Atraxa, Praetors' Voice", "Atraxa"));
        assert!(lenient_name_match("Cultivate", "Cultivate (ramp)"));
        assert!(!lenient_name_match("Sol Ring", "Mind Stone"));
        assert!(!lenient_name_match("Sol Ring", ""));
        assert!(!lenient_name_match("Sol Ring", "so"));
    }

    #[test]
    fn test_sample_is_distinct() {
        let mut rng = StdRng::seed_from_u64(42);
        let sampled = Personality::sample(3, &mut rng);
        assert_eq!(sampled.len(), 3);
        assert_eq!(sampled.iter().collect::<HashSet<_>>().len(), 3);

        assert_eq!(Personality::sample(10, &mut rng).len(), Personality::ALL.len());
    }

    #[test]
    fn test_feedback_rendering() {
        let verdict = AgentVerdict {
            reasoning: "Needs more ramp".to_string(),
            approved: vec!["Sol Ring".to_string()],
        };
        assert_eq!(
            verdict.as_feedback("Agent-1"),
            "Agent-1 said: Needs more ramp\nAgent-1 approved: Sol Ring"
        );
        assert!(AgentVerdict::raw("meh").as_feedback("Agent-2").ends_with("approved: none"));
    }

    #[test]
    fn test_round_robin_pairs() {
        let a = agent("A", Personality::Aggressive, ScriptedOracle::new());
        let b = agent("B", Personality::ComboLover, ScriptedOracle::new());
        let mut roster = AgentRoster::new(vec![a, b]);

        let pairs: Vec<(String, String)> = (0..3)
            .map(|_| {
                let (primary, reviewer) = roster.next_pair().unwrap();
                (primary.name().to_string(), reviewer.name().to_string())
            })
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("A".to_string(), "B".to_string()),
                ("B".to_string(), "A".to_string()),
                ("A".to_string(), "B".to_string()),
            ]
        );
    }

    #[test]
    fn test_round_robin_three_agents_and_single_agent() {
        let mut roster = AgentRoster::new(vec![
            agent("A", Personality::Aggressive, ScriptedOracle::new()),
            agent("B", Personality::ControlFreak, ScriptedOracle::new()),
            agent("C", Personality::ChaosBringer, ScriptedOracle::new()),
        ]);
        let names: Vec<String> = (0..3)
            .map(|_| {
                let (p, r) = roster.next_pair().unwrap();
                format!("{}{}", p.name(), r.name())
            })
            .collect();
        assert_eq!(names, vec!["AB", "BC", "CA"]);

        let mut solo = AgentRoster::new(vec![agent("A", Personality::Aggressive, ScriptedOracle::new())]);
        let (p, r) = solo.next_pair().unwrap();
        assert_eq!((p.name(), r.name()), ("A", "A"));

        assert!(AgentRoster::new(Vec::new()).next_pair().is_none());
    }

    #[tokio::test]
    async fn test_analyze_parses_structured_reply() {
        let oracle = ScriptedOracle::new().respond_to(
            "Sol Ring",
            r#"```json
{"reasoning": "Fast mana", "approved": ["Sol Ring"]}
```"#,
        );
        let agent = agent("Agent-1", Personality::BudgetConscious, oracle);
        let batch = vec![CardRecord::new("Sol Ring"), CardRecord::new("Mana Crypt")];

        let verdict = agent.analyze(&batch, "ramp", None).await;
        assert_eq!(verdict.reasoning, "Fast mana");
        assert!(verdict.approves("Sol Ring"));
        assert!(!verdict.approves("Mana Crypt"));
    }

    #[tokio::test]
    async fn test_analyze_sends_prior_feedback() {
        let oracle = ScriptedOracle::new()
            .respond_to("Agent-1 said", r#"{"reasoning": "Agreed", "approved": ["Sol Ring"]}"#);
        let recorder = oracle.clone();
        let agent = agent("Agent-2", Personality::ControlFreak, oracle);

        let verdict = agent
            .analyze(&[CardRecord::new("Sol Ring")], "ramp", Some("Agent-1 said: good\nAgent-1 approved: Sol Ring"))
            .await;
        assert_eq!(verdict.approved, vec!["Sol Ring"]);
        assert!(recorder.prompts()[0].contains("Control-freak"));
    }
}

use deck_core::CardRecord;

use crate::services::voting_agent::Personality;

pub struct DeckPrompts;

impl DeckPrompts {
    /// What each personality cares about when judging a card.
    pub fn personality_brief(personality: Personality) -> &'static str {
        match personality {
            Personality::Aggressive => {
                "You want to win fast. Favor efficient threats, haste, combat tricks and cards that pressure opponents early."
            }
            Personality::ControlFreak => {
                "You want to decide how the game goes. Favor removal, counterspells, card draw and board wipes."
            }
            Personality::ComboLover => {
                "You love engines and infinite loops. Favor tutors, untappers, synergy pieces and cards that break symmetry."
            }
            Personality::BudgetConscious => {
                "You build on a budget. Favor cheap staples and reprinted workhorses over expensive chase cards."
            }
            Personality::FlavorObsessed => {
                "You care about theme and story. Favor cards whose art, name and lore match the commander."
            }
            Personality::ChaosBringer => {
                "You want memorable, unpredictable games. Favor chaos effects, coin flips, swaps and political cards."
            }
        }
    }

    pub fn strategy(commander: &str) -> String {
        format!(
            "What is the best strategy for a commander deck built around {commander}? \
             Summarize it in one sentence."
        )
    }

    pub fn search_terms(commander: &str, strategy: &str) -> String {
        format!(
            r#"You are helping build a Commander (EDH) deck for {commander}.
{strategy}

Suggest between 5 and 8 short Scryfall search fragments that find good cards for this deck.
Mix mechanics (e.g. o:"+1/+1 counter"), creature types (e.g. t:angel) and staples (e.g. t:artifact o:"add {{").
Do NOT include color filters; they are added automatically.

Output ONLY the fragments separated by semicolons, no commentary."#
        )
    }

    /// One line per candidate: name, type line and shortened rules text.
    pub fn batch_summary(batch: &[CardRecord], text_preview: usize) -> String {
        batch
            .iter()
            .map(|card| {
                let text: String = card.oracle_text.chars().take(text_preview).collect();
                let ellipsis = if card.oracle_text.chars().count() > text_preview {
                    "..."
                } else {
                    ""
                };
                format!(
                    "- {} ({}): {}{}",
                    card.name,
                    card.type_line,
                    text.replace('\n', " "),
                    ellipsis
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn agent_review(
        agent_name: &str,
        personality: Personality,
        strategy: &str,
        batch: &[CardRecord],
        text_preview: usize,
        prior_feedback: Option<&str>,
    ) -> String {
        let feedback = match prior_feedback {
            Some(feedback) if !feedback.trim().is_empty() => format!(
                "\n## Previous Review\n{}\n\nConsider this opinion, but the final call is yours.\n",
                feedback
            ),
            _ => String::new(),
        };

        format!(
            r#"You are {agent_name}, a Magic: The Gathering deck builder with a {personality} personality.
{brief}

## Strategy
{strategy}

## Candidates
{candidates}
{feedback}
## Required Output
Decide which candidates belong in the deck. Reply with a JSON object:
```json
{{"reasoning": "one or two sentences", "approved": ["Exact Card Name", "..."]}}
```
Only use names from the candidate list. Approve nothing if none fit."#,
            personality = personality.as_str(),
            brief = Self::personality_brief(personality),
            candidates = Self::batch_summary(batch, text_preview),
        )
    }

    pub fn combos(commander: &str, card_names: &[&str]) -> String {
        format!(
            r#"Here is the decklist of a Commander deck led by {commander}:
{cards}

List 1 or 2 well-known combos or strong interactions that use ONLY cards from this list.
Output one combo per line in exactly this format:
CardName1 + CardName2 (+ more) | Result | Instructions"#,
            cards = card_names.join(", ")
        )
    }

    pub fn commander_query(description: &str) -> String {
        format!(
            "The user wants a commander deck with this description: '{description}'.\n\
             Create a Scryfall search query to find candidates. \
             The query MUST include 't:legendary' and ('t:creature' or 'o:can be your commander'). \
             Include color constraints if specified in the description (e.g. 'c>=br' or 'id:g'). \
             Output ONLY the raw query string."
        )
    }

    pub fn commander_selection(description: &str, candidates: &[CardRecord]) -> String {
        let candidate_text = candidates
            .iter()
            .map(|c| {
                let text: String = c.oracle_text.chars().take(100).collect();
                format!(
                    "- {} (ID: {}, Type: {}): {}...",
                    c.name, c.color_identity, c.type_line, text
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "The user wants a deck described as: '{description}'.\n\
             Here are valid commander candidates found via search:\n\
             {candidate_text}\n\n\
             Select the single best fit (or a legal partner pair from the list, joined with '+').\n\
             Return the response in exactly two lines:\n\
             Line 1: The name(s) of the chosen card(s) ONLY.\n\
             Line 2: A 1-2 sentence reasoning."
        )
    }
}

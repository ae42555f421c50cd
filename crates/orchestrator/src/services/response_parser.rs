//! Structured extraction from free-form oracle text.
//!
//! Every parser here has an explicit fallback branch; none of them fail.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::services::voting_agent::AgentVerdict;

/// Upper bound on search fragments taken from one response.
pub const MAX_SEARCH_TERMS: usize = 8;

static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s*").expect("Invalid list marker regex pattern")
});

static LEADING_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:combo|result|instructions|commanders?|reasoning|query)\s*:\s*")
        .expect("Invalid label regex pattern")
});

/// One `Cards | Result | Instructions` line, before name resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCombo {
    pub names: Vec<String>,
    pub result: String,
    pub instructions: String,
}

pub struct ResponseParser;

impl ResponseParser {
    pub fn extract_json_from_response(content: &str) -> String {
        if let Some(start) = content.find("```json") {
            let body = &content[start + 7..];
            if let Some(end) = body.find("```") {
                return body[..end].trim().to_string();
            }
        }

        if let Some(start) = content.find("```\n{") {
            if let Some(end) = content[start + 4..].find("\n```") {
                return content[start + 4..start + 4 + end].trim().to_string();
            }
        }

        if let Some(start) = content.find('{') {
            if let Some(end) = content.rfind('}') {
                if end > start {
                    return content[start..=end].to_string();
                }
            }
        }

        content.to_string()
    }

    /// Reads `{"reasoning": ..., "approved": [...]}` out of an agent reply.
    /// Anything else becomes raw-text reasoning with no approvals.
    pub fn parse_verdict(content: &str) -> AgentVerdict {
        let json_str = Self::extract_json_from_response(content);

        let object = match serde_json::from_str::<Value>(&json_str) {
            Ok(Value::Object(object)) => object,
            Ok(_) | Err(_) => {
                debug!(
                    content_preview = %content.chars().take(200).collect::<String>(),
                    "Agent reply has no JSON object, keeping raw text"
                );
                return AgentVerdict::raw(content);
            }
        };

        let approved = match object.get("approved") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(name) => Some(name.trim().to_string()),
                    Value::Object(card) => card
                        .get("name")
                        .and_then(Value::as_str)
                        .map(|name| name.trim().to_string()),
                    _ => None,
                })
                .filter(|name| !name.is_empty())
                .collect(),
            Some(Value::String(names)) => names
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        let reasoning = object
            .get("reasoning")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| content.trim().to_string());

        AgentVerdict { reasoning, approved }
    }

    /// Splits a search-term reply on `;` and newlines, dropping list markers
    /// and backticks. At most [`MAX_SEARCH_TERMS`] fragments survive.
    pub fn parse_search_terms(content: &str) -> Vec<String> {
        content
            .split(['\n', ';'])
            .map(|fragment| LIST_MARKER.replace(fragment, "").replace('`', ""))
            .map(|fragment| fragment.trim().to_string())
            .filter(|fragment| !fragment.is_empty())
            .take(MAX_SEARCH_TERMS)
            .collect()
    }

    /// Lines of the form `CardA + CardB | Result | Instructions`. Lines
    /// without a separator or with fewer than three fields are skipped.
    pub fn parse_combo_lines(content: &str) -> Vec<RawCombo> {
        content
            .lines()
            .filter(|line| line.contains('|'))
            .filter_map(|line| {
                let fields: Vec<&str> = line.split('|').map(str::trim).collect();
                if fields.len() < 3 {
                    return None;
                }

                let names = Self::strip_decoration(fields[0])
                    .split('+')
                    .map(Self::strip_decoration)
                    .filter(|name| !name.is_empty())
                    .collect();

                Some(RawCombo {
                    names,
                    result: Self::strip_decoration(fields[1]),
                    instructions: Self::strip_decoration(fields[2]),
                })
            })
            .collect()
    }

    /// Removes list markers, `Label:` prefixes, quotes and emphasis.
    pub fn strip_decoration(text: &str) -> String {
        let text = LIST_MARKER.replace(text, "");
        let text = LEADING_LABEL.replace(&text, "");
        text.trim()
            .trim_matches(|c: char| matches!(c, '"' | '\'' | '*' | '`' | '“' | '”'))
            .trim()
            .to_string()
    }

    /// Cleans an oracle-written commander query and forces it to target
    /// legal commanders.
    pub fn clean_commander_query(raw: &str) -> String {
        let query = raw.trim().replace("Query:", "").replace('`', "");
        let query = query.trim();

        if query.contains("t:legendary") {
            query.to_string()
        } else {
            format!("{} {}", query, COMMANDER_QUERY).trim().to_string()
        }
    }

    /// First line names the commander(s), the rest is reasoning.
    pub fn parse_commander_selection(content: &str) -> (String, String) {
        let mut lines = content.trim().lines();
        let names = lines
            .next()
            .map(Self::strip_decoration)
            .unwrap_or_default();
        let reasoning = lines
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(Self::strip_decoration)
            .collect::<Vec<_>>()
            .join(" ");
        (names, reasoning)
    }
}

/// Fallback query matching every card that can lead a deck.
pub const COMMANDER_QUERY: &str = "t:legendary (t:creature or o:\"can be your commander\")";

//! Input Gate - junk-objective rejection
//!
//! Cheap heuristic checks run before any model call. The first failing
//! check decides the rejection reason; no check has side effects.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SurveyError};

pub const MIN_OBJECTIVE_LEN: usize = 20;
pub const MIN_MEANINGFUL_WORDS: usize = 3;
pub const MAX_SPECIAL_CHAR_RATIO: f64 = 0.3;
const REPEATED_CHAR_RUN: usize = 6;

const REASON_REQUIRED: &str = "Research objective is required";
const REASON_JUNK: &str = "Please provide a meaningful research objective or problem statement";
const REASON_NO_INTENT: &str = "Please describe what you want to research, measure, or understand";
const REASON_SPECIAL_CHARS: &str = "Research objective contains too many special characters";

/// Research-intent vocabulary; at least one must appear (substring, case-insensitive)
pub const RESEARCH_KEYWORDS: &[&str] = &[
    "understand", "evaluate", "assess", "measure", "analyze", "determine",
    "identify", "explore", "investigate", "study", "research", "test",
    "compare", "examine", "discover", "brand", "customer", "user", "market",
    "consumer", "product", "service", "satisfaction", "awareness", "perception",
    "behavior", "attitude", "preference", "experience", "performance",
    "quality", "loyalty", "engagement", "adoption", "usage", "need", "want",
];

lazy_static! {
    static ref JUNK_PATTERNS: Vec<(&'static str, Regex)> = vec![
        ("no letters", Regex::new(r"^[^a-zA-Z]*$").unwrap()),
        ("digits or punctuation only", Regex::new(r"^[\d\s\W]+$").unwrap()),
        (
            "placeholder text",
            Regex::new(r"(?i)^(test|asdf|qwer|zxcv|demo|sample|example|abc|xyz|123|aaa|bbb)").unwrap(),
        ),
    ];
    static ref SHORT_TOKEN: Regex = Regex::new(r"^[a-zA-Z]{1,3}$").unwrap();
    static ref SPECIAL_CHAR: Regex = Regex::new(r"[^a-zA-Z0-9\s]").unwrap();
}

/// Outcome of gating one objective
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateVerdict {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl GateVerdict {
    fn pass() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    fn reject(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }

    /// Turn a rejection into `SurveyError::InvalidObjective`
    pub fn into_result(self) -> Result<()> {
        if self.valid {
            Ok(())
        } else {
            Err(SurveyError::InvalidObjective(
                self.reason.unwrap_or_else(|| REASON_JUNK.to_string()),
            ))
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputGate;

impl InputGate {
    /// Run every heuristic in order and stop at the first failure
    pub fn check(objective: &str) -> GateVerdict {
        let cleaned = objective.trim();
        if cleaned.is_empty() {
            return GateVerdict::reject(REASON_REQUIRED);
        }

        let length = cleaned.chars().count();
        if length < MIN_OBJECTIVE_LEN {
            return GateVerdict::reject(format!(
                "Research objective must be at least {} characters long",
                MIN_OBJECTIVE_LEN
            ));
        }

        if let Some(pattern) = Self::junk_pattern(cleaned) {
            tracing::debug!(pattern, "objective matched junk pattern");
            return GateVerdict::reject(REASON_JUNK);
        }

        let meaningful = cleaned
            .split_whitespace()
            .filter(|word| word.chars().count() > 2)
            .count();
        if meaningful < MIN_MEANINGFUL_WORDS {
            return GateVerdict::reject(format!(
                "Research objective must contain at least {} meaningful words",
                MIN_MEANINGFUL_WORDS
            ));
        }

        let lowered = cleaned.to_lowercase();
        if !RESEARCH_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
            return GateVerdict::reject(REASON_NO_INTENT);
        }

        let special = SPECIAL_CHAR.find_iter(cleaned).count();
        if special as f64 > length as f64 * MAX_SPECIAL_CHAR_RATIO {
            return GateVerdict::reject(REASON_SPECIAL_CHARS);
        }

        GateVerdict::pass()
    }

    /// Gate an objective, failing with `InvalidObjective` on rejection
    pub fn validate(objective: &str) -> Result<()> {
        let verdict = Self::check(objective);
        if let Some(reason) = &verdict.reason {
            tracing::warn!(reason = %reason, "research objective rejected");
        }
        verdict.into_result()
    }

    fn junk_pattern(cleaned: &str) -> Option<&'static str> {
        if let Some((name, _)) = JUNK_PATTERNS.iter().find(|(_, re)| re.is_match(cleaned)) {
            return Some(name);
        }
        if starts_with_repeated_char(cleaned, REPEATED_CHAR_RUN) {
            return Some("repeated character");
        }
        if cleaned.split_whitespace().all(|token| SHORT_TOKEN.is_match(token)) {
            return Some("short tokens only");
        }
        None
    }
}

// `regex` has no backreferences, so `^(.)\1{5,}` is spelled out by hand.
fn starts_with_repeated_char(text: &str, run: usize) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => chars.take(run - 1).filter(|c| *c == first).count() == run - 1,
        None => false,
    }
}

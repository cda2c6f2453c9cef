//! Scoping parameters
//!
//! Structured preferences that shape generation without changing the
//! research objective. `surveyLength` arrives either as a number of minutes
//! or as one of a few fixed labels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SurveyError};

pub const MIN_SURVEY_MINUTES: f64 = 3.0;
pub const MAX_SURVEY_MINUTES: f64 = 60.0;
pub const SURVEY_LENGTH_LABELS: [&str; 3] = ["short", "medium", "long"];
const MIN_TARGET_RESPONDENTS_LEN: usize = 5;

/// Survey length, numeric minutes or a descriptive label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SurveyLength {
    Minutes(f64),
    Label(String),
}

impl SurveyLength {
    /// Numeric minutes, if this is a usable number
    pub fn minutes(&self) -> Option<f64> {
        match self {
            SurveyLength::Minutes(m) if m.is_finite() => Some(*m),
            _ => None,
        }
    }
}

impl Default for SurveyLength {
    fn default() -> Self {
        SurveyLength::Minutes(10.0)
    }
}

impl fmt::Display for SurveyLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurveyLength::Minutes(m) => write!(f, "{} minutes", m),
            SurveyLength::Label(label) => f.write_str(label),
        }
    }
}

impl FromStr for SurveyLength {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match trimmed.parse::<f64>() {
            Ok(minutes) => SurveyLength::Minutes(minutes),
            Err(_) => SurveyLength::Label(trimmed.to_string()),
        })
    }
}

/// User-supplied scoping preferences
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopingParams {
    #[serde(default)]
    pub survey_length: SurveyLength,
    #[serde(default)]
    pub target_respondents: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub brands: Option<String>,
    #[serde(default)]
    pub avoid_topics: Option<String>,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

impl ScopingParams {
    pub fn with_minutes(minutes: f64) -> Self {
        Self {
            survey_length: SurveyLength::Minutes(minutes),
            ..Self::default()
        }
    }

    /// Check every field and report all problems at once
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        match &self.survey_length {
            SurveyLength::Minutes(m) => {
                if !m.is_finite() || *m < MIN_SURVEY_MINUTES || *m > MAX_SURVEY_MINUTES {
                    errors.push(format!(
                        "Survey length must be between {} and {} minutes",
                        MIN_SURVEY_MINUTES, MAX_SURVEY_MINUTES
                    ));
                }
            }
            SurveyLength::Label(label) => {
                let known = SURVEY_LENGTH_LABELS
                    .iter()
                    .any(|l| l.eq_ignore_ascii_case(label.trim()));
                if !known {
                    errors.push(format!(
                        "Survey length label must be one of: {}",
                        SURVEY_LENGTH_LABELS.join(", ")
                    ));
                }
            }
        }

        if let Some(target) = non_blank(&self.target_respondents) {
            if target.chars().count() < MIN_TARGET_RESPONDENTS_LEN {
                errors.push("Target respondents description is too short".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SurveyError::InvalidScoping(errors))
        }
    }
}

/// Trimmed value of an optional field, `None` when absent or blank
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

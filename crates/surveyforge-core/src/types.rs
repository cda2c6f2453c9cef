//! Core types for SurveyForge
//!
//! The canonical three-level entity graph produced by the normalizer:
//! - Questionnaire (ordered sections + derived metadata)
//! - Section (ordered questions)
//! - Question (content fields + an identifier that never changes)
//!
//! Field names serialize in camelCase, matching the shape consumed by
//! renderers and the transport layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Timestamp type alias
pub type Timestamp = DateTime<Utc>;

/// Identifier prefixes, one per entity level
pub const QUESTIONNAIRE_ID_PREFIX: &str = "qnr";
pub const SECTION_ID_PREFIX: &str = "sec";
pub const QUESTION_ID_PREFIX: &str = "q";

/// Generate a collision-resistant identifier (`<prefix>_<uuid v4>`)
pub fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

/// Question presentation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Single-select
    #[default]
    Single,
    /// Multi-select
    Multi,
    Grid,
    /// Open-ended
    Text,
    Ranking,
    Scale,
    Dropdown,
    /// Net Promoter Score (0-10)
    Nps,
    Matrix,
}

impl QuestionType {
    pub const ALL: [QuestionType; 9] = [
        QuestionType::Single,
        QuestionType::Multi,
        QuestionType::Grid,
        QuestionType::Text,
        QuestionType::Ranking,
        QuestionType::Scale,
        QuestionType::Dropdown,
        QuestionType::Nps,
        QuestionType::Matrix,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Single => "single",
            QuestionType::Multi => "multi",
            QuestionType::Grid => "grid",
            QuestionType::Text => "text",
            QuestionType::Ranking => "ranking",
            QuestionType::Scale => "scale",
            QuestionType::Dropdown => "dropdown",
            QuestionType::Nps => "nps",
            QuestionType::Matrix => "matrix",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        QuestionType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown question type '{}'", s))
    }
}

/// Answer validation constraints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub pattern: Option<String>,
}

/// Rating scale descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaleSpec {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Editing metadata attached to every question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionMetadata {
    pub editable: bool,
    pub position: u32,
}

impl Default for QuestionMetadata {
    fn default() -> Self {
        Self {
            editable: true,
            position: 0,
        }
    }
}

fn default_required() -> bool {
    true
}

/// A single survey question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Assigned once at normalization; edits never change it
    #[serde(default)]
    pub id: String,
    pub text: String,
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,
    #[serde(default = "default_required")]
    pub required: bool,
    /// Skip/display logic, free text
    #[serde(default)]
    pub logic: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub options: Vec<String>,
    #[serde(default)]
    pub validation: Option<ValidationRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<ScaleSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default)]
    pub metadata: QuestionMetadata,
}

impl Question {
    /// Create a question with a fresh identifier and default fields
    pub fn new(text: impl Into<String>, question_type: QuestionType) -> Self {
        Self {
            id: new_id(QUESTION_ID_PREFIX),
            text: text.into(),
            question_type,
            required: true,
            logic: None,
            options: Vec::new(),
            validation: None,
            scale: None,
            instructions: None,
            metadata: QuestionMetadata::default(),
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }
}

/// An ordered group of questions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: new_id(SECTION_ID_PREFIX),
            title: title.into(),
            description: None,
            questions: Vec::new(),
        }
    }

    pub fn with_question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }
}

/// Derived questionnaire metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireMetadata {
    /// Always the sum of section question counts
    pub total_questions: usize,
    pub estimated_time: String,
}

impl Default for QuestionnaireMetadata {
    fn default() -> Self {
        Self {
            total_questions: 0,
            estimated_time: crate::DEFAULT_ESTIMATED_TIME.to_string(),
        }
    }
}

/// A complete survey instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Questionnaire {
    /// Empty means "absent"; the store refuses to save it
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: Timestamp,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub metadata: QuestionnaireMetadata,
}

impl Questionnaire {
    /// Create an empty questionnaire with a fresh identifier
    pub fn new() -> Self {
        Self {
            id: new_id(QUESTIONNAIRE_ID_PREFIX),
            title: None,
            created_at: Utc::now(),
            sections: Vec::new(),
            metadata: QuestionnaireMetadata::default(),
        }
    }

    pub fn has_id(&self) -> bool {
        !self.id.trim().is_empty()
    }

    /// Sum of question counts across all sections
    pub fn question_count(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }

    /// Re-derive `metadata.total_questions` from the sections
    pub fn recompute_totals(&mut self) {
        self.metadata.total_questions = self.question_count();
    }

    /// Locate a question by identifier as (section index, question index)
    pub fn locate_question(&self, question_id: &str) -> Option<(usize, usize)> {
        self.sections.iter().enumerate().find_map(|(si, section)| {
            section
                .questions
                .iter()
                .position(|q| q.id == question_id)
                .map(|qi| (si, qi))
        })
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.locate_question(question_id)
            .map(|(si, qi)| &self.sections[si].questions[qi])
    }

    /// Replace the question with `question_id` in place, keeping its slot and identifier.
    ///
    /// Returns `false` when no section holds the identifier.
    pub fn replace_question(&mut self, question_id: &str, mut replacement: Question) -> bool {
        match self.locate_question(question_id) {
            Some((si, qi)) => {
                replacement.id = question_id.to_string();
                self.sections[si].questions[qi] = replacement;
                true
            }
            None => false,
        }
    }

    pub fn question_ids(&self) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .flat_map(|s| s.questions.iter().map(|q| q.id.as_str()))
    }
}

impl Default for Questionnaire {
    fn default() -> Self {
        Self::new()
    }
}

/// One problem reported by the critique call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    #[serde(default, deserialize_with = "lenient_id")]
    pub question_id: Option<String>,
    pub issue: String,
    #[serde(default)]
    pub suggestion: Option<String>,
}

/// Structured quality verdict for a whole questionnaire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub issues: Vec<ValidationIssue>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// Models echo identifiers back as strings, numbers, or null.
fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

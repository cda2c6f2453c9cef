//! Prompt Composer
//!
//! Derives structural targets (question-count range, section minimums) from
//! scoping parameters and renders the user-turn instruction for generation.
//! Pure string building: no network, no store.

pub mod templates;

use crate::scoping::{non_blank, ScopingParams, SurveyLength};

pub use templates::{
    critique_prompt, edit_prompt, CRITIQUE_SYSTEM_PROMPT, EDIT_QUESTION_PROMPT,
    QUESTIONNAIRE_SYSTEM_PROMPT,
};

/// Questions per minute, lower and upper bound
pub const MIN_QUESTIONS_PER_MINUTE: f64 = 2.0;
pub const MAX_QUESTIONS_PER_MINUTE: f64 = 2.5;

/// Range used when survey length is not numeric
pub const DEFAULT_QUESTION_RANGE: (u32, u32) = (25, 35);
pub const DEFAULT_LENGTH_DESCRIPTION: &str = "Medium (10 minutes)";

pub const SCREENER_QUESTIONS: (u32, u32) = (5, 8);
pub const CLASSIFICATION_QUESTIONS: (u32, u32) = (8, 10);

pub const DEFAULT_TARGET_RESPONDENTS: &str = "General population 18-65, nationally representative";
pub const DEFAULT_INDUSTRY: &str = "Cross-industry";
pub const DEFAULT_BRANDS: &str = "Category leaders";
pub const DEFAULT_AVOID_TOPICS: &str = "None specified";
pub const DEFAULT_SPECIAL_INSTRUCTIONS: &str = "Standard professional research guidelines";

/// Structural target derived from the survey length
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionTarget {
    pub min_questions: u32,
    pub max_questions: u32,
    /// Human-readable duration, e.g. "10 minutes - Standard research study"
    pub duration: String,
    /// Long surveys ask for the range as a floor rather than a band
    pub minimum_only: bool,
}

impl QuestionTarget {
    pub fn from_length(length: &SurveyLength) -> Self {
        let Some(minutes) = length.minutes() else {
            let duration = match length {
                SurveyLength::Label(label) if !label.trim().is_empty() => label.trim().to_string(),
                _ => DEFAULT_LENGTH_DESCRIPTION.to_string(),
            };
            return Self {
                min_questions: DEFAULT_QUESTION_RANGE.0,
                max_questions: DEFAULT_QUESTION_RANGE.1,
                duration,
                minimum_only: false,
            };
        };

        let min_questions = (minutes * MIN_QUESTIONS_PER_MINUTE).floor().max(0.0) as u32;
        let max_questions = (minutes * MAX_QUESTIONS_PER_MINUTE).floor().max(0.0) as u32;
        let label = match minutes {
            m if m <= 5.0 => "Quick pulse survey",
            m if m <= 10.0 => "Standard research study",
            m if m <= 15.0 => "Detailed market research",
            m if m <= 20.0 => "Comprehensive study",
            _ => "Deep-dive research",
        };

        Self {
            min_questions,
            max_questions,
            duration: format!("{} minutes - {}", minutes, label),
            minimum_only: minutes > 20.0,
        }
    }

    /// "20-25 questions", or "... questions MINIMUM" for long surveys
    pub fn count_label(&self) -> String {
        let base = format!("{}-{} questions", self.min_questions, self.max_questions);
        if self.minimum_only {
            format!("{} MINIMUM", base)
        } else {
            base
        }
    }
}

fn or_default<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
    non_blank(value).unwrap_or(default)
}

/// Render the generation user prompt for an objective and its scoping parameters
pub fn compose(objective: &str, scoping: &ScopingParams) -> String {
    let target = QuestionTarget::from_length(&scoping.survey_length);
    let count = target.count_label();

    format!(
        r#"RESEARCH BRIEF:
Primary Research Objective: {objective}

TARGET SPECIFICATIONS:
- Survey Duration: {duration}
- Question Count: {count}
- Target Respondents: {respondents}
- Industry Context: {industry}
- Key Brands/Competitors for Benchmarking: {brands}
- Sensitive Topics to Avoid: {avoid}
- Client-Specific Requirements: {special}

DELIVERABLE REQUIREMENTS:
1. Use advanced question types (MaxDiff, conjoint, semantic differential) and validated scales
2. Include quality-control questions, attention checks and professional skip logic
3. Ask questions that drive business decisions and yield benchmarkable metrics
4. Vary question types to prevent fatigue and keep language clear and professional

CRITICAL REQUIREMENTS:
1. Generate {count} in total (no fewer)
2. Mandatory sections with minimum question counts:
   - Screener: {screener_min}-{screener_max} questions, each with [TERMINATE] logic for unqualified respondents
   - Classification/Demographics: {class_min}-{class_max} questions
   - Main research: the remaining questions needed to reach the total count
3. Every question must yield strategic, actionable insight

Return the questionnaire as a JSON object with all required fields."#,
        objective = objective.trim(),
        duration = target.duration,
        count = count,
        respondents = or_default(&scoping.target_respondents, DEFAULT_TARGET_RESPONDENTS),
        industry = or_default(&scoping.industry, DEFAULT_INDUSTRY),
        brands = or_default(&scoping.brands, DEFAULT_BRANDS),
        avoid = or_default(&scoping.avoid_topics, DEFAULT_AVOID_TOPICS),
        special = or_default(&scoping.special_instructions, DEFAULT_SPECIAL_INSTRUCTIONS),
        screener_min = SCREENER_QUESTIONS.0,
        screener_max = SCREENER_QUESTIONS.1,
        class_min = CLASSIFICATION_QUESTIONS.0,
        class_max = CLASSIFICATION_QUESTIONS.1,
    )
}

//! Normalizer - untrusted model output to the canonical entity graph
//!
//! A total mapping from the permissive external shape to the strict
//! internal one. Only a top-level parse failure is an error; every other
//! field is coerced or defaulted. Identifiers and `totalQuestions` are
//! always produced here, never taken from the payload.

use chrono::Utc;
use serde_json::{Map, Value};

use crate::error::{Result, SurveyError};
use crate::scoping::ScopingParams;
use crate::types::{
    new_id, Question, QuestionMetadata, QuestionType, Questionnaire, QuestionnaireMetadata,
    ScaleSpec, Section, ValidationRule, QUESTIONNAIRE_ID_PREFIX, QUESTION_ID_PREFIX,
    SECTION_ID_PREFIX,
};
use crate::DEFAULT_ESTIMATED_TIME;

pub const UNTITLED_QUESTION: &str = "Untitled question";

/// Parse raw model text and build a fresh questionnaire from it
pub fn normalize(raw: &str, scoping: &ScopingParams) -> Result<Questionnaire> {
    let root = parse_object(raw)?;

    let sections: Vec<Section> = root
        .get("sections")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .enumerate()
                .map(|(index, item)| coerce_section(item, index))
                .collect()
        })
        .unwrap_or_default();

    let estimated_time = scoping
        .survey_length
        .minutes()
        .map(|m| format!("{} minutes", m))
        .unwrap_or_else(|| DEFAULT_ESTIMATED_TIME.to_string());

    let mut questionnaire = Questionnaire {
        id: new_id(QUESTIONNAIRE_ID_PREFIX),
        title: text_field(&root, &["title"]),
        created_at: Utc::now(),
        sections,
        metadata: QuestionnaireMetadata {
            total_questions: 0,
            estimated_time,
        },
    };
    questionnaire.recompute_totals();

    tracing::debug!(
        questionnaire_id = %questionnaire.id,
        sections = questionnaire.sections.len(),
        questions = questionnaire.metadata.total_questions,
        "normalized model output"
    );

    Ok(questionnaire)
}

/// Parse raw model text into a JSON object, unwrapping a Markdown code fence if present
pub fn parse_object(raw: &str) -> Result<Map<String, Value>> {
    let body = json_body(raw);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| SurveyError::MalformedModelOutput(format!("response is not valid JSON: {}", e)))?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(SurveyError::MalformedModelOutput(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Coerce one question object, assigning the given identifier.
///
/// Shared by generation (fresh id) and editing (original id).
pub fn coerce_question(value: &Value, id: String) -> Question {
    let empty = Map::new();
    let obj = value.as_object().unwrap_or(&empty);

    let text = text_field(obj, &["text", "question"]).unwrap_or_else(|| UNTITLED_QUESTION.to_string());
    let question_type = obj
        .get("type")
        .and_then(Value::as_str)
        .and_then(|t| t.parse::<QuestionType>().ok())
        .unwrap_or_default();
    let required = !matches!(obj.get("required"), Some(Value::Bool(false)));

    let position = question_position(value).unwrap_or(0);

    Question {
        id,
        text,
        question_type,
        required,
        logic: obj.get("logic").and_then(coerce_logic),
        options: obj.get("options").map(coerce_labels).unwrap_or_default(),
        validation: obj.get("validation").and_then(coerce_validation),
        scale: obj.get("scale").and_then(coerce_scale),
        instructions: text_field(obj, &["instructions"]),
        metadata: QuestionMetadata {
            editable: true,
            position,
        },
    }
}

fn coerce_section(value: &Value, index: usize) -> Section {
    let empty = Map::new();
    let obj = value.as_object().unwrap_or(&empty);

    let questions = obj
        .get("questions")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|q| coerce_question(q, new_id(QUESTION_ID_PREFIX)))
                .collect()
        })
        .unwrap_or_default();

    Section {
        id: new_id(SECTION_ID_PREFIX),
        title: text_field(obj, &["title"]).unwrap_or_else(|| format!("Section {}", index + 1)),
        description: text_field(obj, &["description"]),
        questions,
    }
}

/// First non-blank string among `keys`
fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn coerce_logic(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        other => Some(other.to_string()),
    }
}

fn coerce_labels(value: &Value) -> Vec<String> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items.iter().filter_map(label_of).collect()
}

fn label_of(item: &Value) -> Option<String> {
    match item {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(obj) => text_field(obj, &["label", "text", "value"]),
        Value::Null | Value::Array(_) => None,
    }
}

fn coerce_validation(value: &Value) -> Option<ValidationRule> {
    let obj = value.as_object()?;
    Some(ValidationRule {
        min: obj.get("min").and_then(as_number),
        max: obj.get("max").and_then(as_number),
        pattern: text_field(obj, &["pattern"]),
    })
}

fn coerce_scale(value: &Value) -> Option<ScaleSpec> {
    let obj = value.as_object()?;
    Some(ScaleSpec {
        min: obj.get("min").and_then(as_number),
        max: obj.get("max").and_then(as_number),
        labels: obj.get("labels").map(coerce_labels).unwrap_or_default(),
    })
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// The usable `position` of a question object, top-level or under `metadata`
pub fn question_position(value: &Value) -> Option<u32> {
    value
        .get("position")
        .or_else(|| value.get("metadata").and_then(|m| m.get("position")))
        .and_then(as_position)
}

fn as_position(value: &Value) -> Option<u32> {
    as_number(value)
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n.min(u32::MAX as f64) as u32)
}

/// The JSON body of a reply: a bare object as-is, else the first fenced
/// block, else the outermost `{...}` span
fn json_body(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        return trimmed;
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let body = match after.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &after[4..],
            _ => after,
        };
        return match body.find("```") {
            Some(end) => body[..end].trim(),
            None => body.trim(),
        };
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

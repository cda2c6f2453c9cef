//! Question Editor
//!
//! Rewrites one question through the model. The model is never trusted with
//! the identifier: whatever it echoes back, the original id is reattached.

use serde_json::Value;
use surveyforge_core::normalizer::{parse_object, question_position};
use surveyforge_core::prompt::EDIT_QUESTION_PROMPT;
use surveyforge_core::{coerce_question, Question, QuestionnaireStore, Result, SurveyError};

use crate::config::MissingEditTarget;
use crate::generation::GenerationClient;

pub const MIN_INSTRUCTION_CHARS: usize = 3;
pub const MAX_INSTRUCTION_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct QuestionEditor {
    client: GenerationClient,
}

impl QuestionEditor {
    pub fn new(client: GenerationClient) -> Self {
        Self { client }
    }

    /// Ask the model for a rewritten `question`; the result keeps `question.id`,
    /// and its position unless the reply sets one
    pub async fn edit_question(&self, question: &Question, instruction: &str) -> Result<Question> {
        validate_instruction(instruction)?;

        let question_json = serde_json::to_string(question)?;
        let raw = self
            .client
            .edit(EDIT_QUESTION_PROMPT, &question_json, instruction)
            .await?;

        let reply = Value::Object(parse_object(&raw)?);
        let mut edited = coerce_question(&reply, question.id.clone());
        if question_position(&reply).is_none() {
            edited.metadata.position = question.metadata.position;
        }

        tracing::info!(question_id = %edited.id, "question edited");
        Ok(edited)
    }
}

pub fn validate_instruction(instruction: &str) -> Result<()> {
    let chars = instruction.trim().chars().count();
    if chars < MIN_INSTRUCTION_CHARS {
        return Err(SurveyError::InvalidInstruction(format!(
            "must be at least {} characters",
            MIN_INSTRUCTION_CHARS
        )));
    }
    if chars > MAX_INSTRUCTION_CHARS {
        return Err(SurveyError::InvalidInstruction(format!(
            "must be at most {} characters",
            MAX_INSTRUCTION_CHARS
        )));
    }
    Ok(())
}

/// Write `edited` over the question with the same id inside a stored questionnaire.
///
/// Returns whether the store changed. A missing questionnaire or question is
/// a logged no-op under [`MissingEditTarget::Ignore`] and `NotFound` under
/// [`MissingEditTarget::Reject`].
pub fn apply_edit<S>(
    store: &S,
    questionnaire_id: &str,
    edited: &Question,
    policy: MissingEditTarget,
) -> Result<bool>
where
    S: QuestionnaireStore + ?Sized,
{
    let mut questionnaire = match store.get(questionnaire_id) {
        Some(q) => q,
        None => {
            return missing_target(
                policy,
                format!("Questionnaire not found: {}", questionnaire_id),
                questionnaire_id,
                &edited.id,
            )
        }
    };

    if !questionnaire.replace_question(&edited.id, edited.clone()) {
        return missing_target(
            policy,
            format!(
                "Question {} not found in questionnaire {}",
                edited.id, questionnaire_id
            ),
            questionnaire_id,
            &edited.id,
        );
    }

    store.save(questionnaire)?;
    tracing::debug!(
        questionnaire_id = %questionnaire_id,
        question_id = %edited.id,
        "edited question written back"
    );
    Ok(true)
}

fn missing_target(
    policy: MissingEditTarget,
    message: String,
    questionnaire_id: &str,
    question_id: &str,
) -> Result<bool> {
    match policy {
        MissingEditTarget::Ignore => {
            tracing::warn!(
                questionnaire_id = %questionnaire_id,
                question_id = %question_id,
                "edit target not found; stored questionnaire left unchanged"
            );
            Ok(false)
        }
        MissingEditTarget::Reject => Err(SurveyError::NotFound(message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use crate::providers::testing::ScriptedProvider;
    use std::sync::Arc;
    use surveyforge_core::{InMemoryStore, QuestionType, Questionnaire, Section};

    fn editor(responses: &[&str]) -> (QuestionEditor, Arc<ScriptedProvider>) {
        let provider = Arc::new(ScriptedProvider::new(responses.iter().copied()));
        let client = GenerationClient::new(provider.clone(), AgentConfig::default());
        (QuestionEditor::new(client), provider)
    }

    fn stored(store: &InMemoryStore) -> Questionnaire {
        let mut q = Questionnaire::new();
        q.sections.push(
            Section::new("Screener")
                .with_question(Question::new("Age?", QuestionType::Dropdown))
                .with_question(Question::new("Region?", QuestionType::Single)),
        );
        q.sections
            .push(Section::new("Main").with_question(Question::new("Why?", QuestionType::Text)));
        q.recompute_totals();
        store.save(q).unwrap()
    }

    #[tokio::test]
    async fn test_identifier_is_forced_back() {
        let (editor, provider) =
            editor(&[r#"{"id": "q_forged", "text": "How old are you?", "type": "single"}"#]);
        let original = Question::new("Age?", QuestionType::Dropdown);

        let edited = editor.edit_question(&original, "make it friendlier").await.unwrap();

        assert_eq!(edited.id, original.id);
        assert_eq!(edited.text, "How old are you?");
        assert_eq!(edited.question_type, QuestionType::Single);
        assert!(provider.requests()[0].user.contains(&original.id));
    }

    #[tokio::test]
    async fn test_position_survives_edit_without_metadata() {
        let (editor, _) = editor(&[
            r#"{"text": "Which region do you live in?"}"#,
            r#"{"text": "Region?", "metadata": {"position": 9}}"#,
        ]);
        let mut original = Question::new("Region?", QuestionType::Single);
        original.metadata.position = 4;

        let edited = editor.edit_question(&original, "be specific").await.unwrap();
        assert_eq!(edited.metadata.position, 4);
        assert_eq!(edited.text, "Which region do you live in?");

        let moved = editor.edit_question(&original, "move it").await.unwrap();
        assert_eq!(moved.metadata.position, 9);
    }

    #[tokio::test]
    async fn test_non_json_edit_is_malformed() {
        let (editor, _) = editor(&["Sure! Here is the question:"]);
        let err = editor
            .edit_question(&Question::new("Age?", QuestionType::Dropdown), "shorter")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "MALFORMED_MODEL_OUTPUT");
    }

    #[tokio::test]
    async fn test_blank_instruction_never_reaches_the_model() {
        let (editor, provider) = editor(&["{}"]);
        let err = editor
            .edit_question(&Question::new("Age?", QuestionType::Dropdown), "  ")
            .await
            .unwrap_err();

        assert!(matches!(err, SurveyError::InvalidInstruction(_)));
        assert!(provider.requests().is_empty());
    }

    #[test]
    fn test_instruction_bounds() {
        assert!(validate_instruction("ok").is_err());
        assert!(validate_instruction("fix").is_ok());
        assert!(validate_instruction(&"x".repeat(MAX_INSTRUCTION_CHARS)).is_ok());
        assert!(validate_instruction(&"x".repeat(MAX_INSTRUCTION_CHARS + 1)).is_err());
    }

    #[test]
    fn test_apply_edit_keeps_slot() {
        let store = InMemoryStore::new();
        let q = stored(&store);
        let target = q.sections[0].questions[1].clone();

        let mut edited = Question::new("Which region do you live in?", QuestionType::Dropdown);
        edited.id = target.id.clone();
        assert!(apply_edit(&store, &q.id, &edited, MissingEditTarget::Ignore).unwrap());

        let after = store.get(&q.id).unwrap();
        assert_eq!(after.locate_question(&target.id), Some((0, 1)));
        assert_eq!(after.sections[0].questions[1].text, "Which region do you live in?");
        assert_eq!(after.sections[0].questions[0], q.sections[0].questions[0]);
        assert_eq!(after.sections[1], q.sections[1]);
        assert_eq!(after.metadata.total_questions, 3);
    }

    #[test]
    fn test_unknown_question_is_ignored_by_default() {
        let store = InMemoryStore::new();
        let q = stored(&store);
        let stray = Question::new("Stray?", QuestionType::Text);

        assert!(!apply_edit(&store, &q.id, &stray, MissingEditTarget::Ignore).unwrap());
        assert_eq!(store.get(&q.id), Some(q));
    }

    #[test]
    fn test_unknown_targets_rejected_when_configured() {
        let store = InMemoryStore::new();
        let q = stored(&store);
        let stray = Question::new("Stray?", QuestionType::Text);

        let err = apply_edit(&store, &q.id, &stray, MissingEditTarget::Reject).unwrap_err();
        assert!(matches!(err, SurveyError::NotFound(_)));

        let err = apply_edit(&store, "qnr_missing", &stray, MissingEditTarget::Reject).unwrap_err();
        assert!(matches!(err, SurveyError::NotFound(_)));
        assert_eq!(store.get(&q.id), Some(q));
    }

    #[test]
    fn test_unknown_questionnaire_is_ignored_by_default() {
        let store = InMemoryStore::new();
        let stray = Question::new("Stray?", QuestionType::Text);
        assert!(!apply_edit(&store, "qnr_missing", &stray, MissingEditTarget::Ignore).unwrap());
        assert_eq!(store.size(), 0);
    }
}

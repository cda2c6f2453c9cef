//! Survey pipeline facade
//!
//! The entry points a transport layer calls: generate, edit, validate and
//! read back. Each takes and returns the plain entity types and fails with a
//! typed [`SurveyError`].

use serde::{Deserialize, Serialize};
use surveyforge_core::prompt::{self, QUESTIONNAIRE_SYSTEM_PROMPT};
use surveyforge_core::{
    normalize, InMemoryStore, InputGate, Question, Questionnaire, QuestionnaireStore, Result,
    ScopingParams, SurveyError, ValidationReport,
};

use crate::config::{AgentConfig, MissingEditTarget};
use crate::editor::{apply_edit, QuestionEditor};
use crate::generation::GenerationClient;
use crate::validator::QuestionnaireValidator;

/// Health snapshot of the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub configured: bool,
    pub model: String,
    pub stored_questionnaires: usize,
}

#[derive(Debug, Clone)]
pub struct SurveyPipeline<S: QuestionnaireStore = InMemoryStore> {
    client: GenerationClient,
    editor: QuestionEditor,
    validator: QuestionnaireValidator,
    store: S,
    missing_edit_target: MissingEditTarget,
}

impl SurveyPipeline<InMemoryStore> {
    pub fn new(client: GenerationClient) -> Self {
        Self::with_store(client, InMemoryStore::new())
    }

    /// OpenAI-compatible pipeline over a fresh in-memory store
    pub fn from_config(config: AgentConfig) -> Result<Self> {
        Ok(Self::new(GenerationClient::from_config(config)?))
    }
}

impl<S: QuestionnaireStore> SurveyPipeline<S> {
    pub fn with_store(client: GenerationClient, store: S) -> Self {
        let missing_edit_target = client.config().missing_edit_target;
        Self {
            editor: QuestionEditor::new(client.clone()),
            validator: QuestionnaireValidator::new(client.clone()),
            client,
            store,
            missing_edit_target,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn client(&self) -> &GenerationClient {
        &self.client
    }

    /// Gate, compose, call the model, normalize and store a new questionnaire
    pub async fn generate(&self, objective: &str, scoping: &ScopingParams) -> Result<Questionnaire> {
        InputGate::validate(objective)?;
        scoping.validate()?;

        let user_prompt = prompt::compose(objective, scoping);
        tracing::info!(
            model = self.client.provider().model(),
            survey_length = %scoping.survey_length,
            "generating questionnaire"
        );

        let raw = self
            .client
            .generate(QUESTIONNAIRE_SYSTEM_PROMPT, &user_prompt)
            .await?;
        let questionnaire = self.store.save(normalize(&raw, scoping)?)?;

        tracing::info!(
            questionnaire_id = %questionnaire.id,
            sections = questionnaire.sections.len(),
            questions = questionnaire.metadata.total_questions,
            "questionnaire generated"
        );
        Ok(questionnaire)
    }

    /// Rewrite `question` and, when `questionnaire_id` is given, write it back in place
    pub async fn edit_question(
        &self,
        question: &Question,
        instruction: &str,
        questionnaire_id: Option<&str>,
    ) -> Result<Question> {
        // Under Reject, a missing target is known before paying for the call.
        if let (Some(id), MissingEditTarget::Reject) = (questionnaire_id, self.missing_edit_target) {
            let target = self.get_required(id)?;
            if target.question(&question.id).is_none() {
                return Err(SurveyError::NotFound(format!(
                    "Question {} not found in questionnaire {}",
                    question.id, id
                )));
            }
        }

        tracing::info!(question_id = %question.id, "editing question");
        let edited = self.editor.edit_question(question, instruction).await?;

        if let Some(id) = questionnaire_id {
            apply_edit(&self.store, id, &edited, self.missing_edit_target)?;
        }
        Ok(edited)
    }

    pub async fn validate_questionnaire(&self, questionnaire: &Questionnaire) -> Result<ValidationReport> {
        self.validator.validate_questionnaire(questionnaire).await
    }

    pub fn get(&self, id: &str) -> Option<Questionnaire> {
        self.store.get(id)
    }

    pub fn get_required(&self, id: &str) -> Result<Questionnaire> {
        self.store
            .get(id)
            .ok_or_else(|| SurveyError::NotFound(format!("Questionnaire not found: {}", id)))
    }

    /// Pretty JSON of a stored questionnaire
    pub fn export_json(&self, id: &str) -> Result<String> {
        let questionnaire = self.get_required(id)?;
        Ok(serde_json::to_string_pretty(&questionnaire)?)
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            configured: self.client.provider().is_configured(),
            model: self.client.provider().model().to_string(),
            stored_questionnaires: self.store.size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::ScriptedProvider;
    use serde_json::json;
    use std::sync::Arc;

    const OBJECTIVE: &str = "We want to understand how customers perceive our new loyalty program";

    fn pipeline(responses: Vec<String>) -> (SurveyPipeline, Arc<ScriptedProvider>) {
        let provider = Arc::new(ScriptedProvider::new(responses));
        let client = GenerationClient::new(provider.clone(), AgentConfig::default());
        (SurveyPipeline::new(client), provider)
    }

    fn payload() -> String {
        json!({
            "sections": [
                {"title": "Screener", "questions": [
                    {"text": "Do you shop with us?", "type": "single", "options": ["Yes", "No"]}
                ]},
                {"title": "Main", "questions": [
                    {"question": "Rate the program", "type": "scale"},
                    {"text": "Anything else?", "type": "text", "required": false}
                ]}
            ],
            "metadata": {"totalQuestions": 999}
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_rejected_objective_never_calls_the_model() {
        let (pipeline, provider) = pipeline(vec![payload()]);
        let err = pipeline
            .generate("asdf", &ScopingParams::default())
            .await
            .unwrap_err();

        assert!(matches!(err, SurveyError::InvalidObjective(_)));
        assert!(provider.requests().is_empty());
        assert_eq!(pipeline.store().size(), 0);
    }

    #[tokio::test]
    async fn test_bad_scoping_never_calls_the_model() {
        let (pipeline, provider) = pipeline(vec![payload()]);
        let err = pipeline
            .generate(OBJECTIVE, &ScopingParams::with_minutes(120.0))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "INVALID_SCOPING");
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_generate_stores_normalized_questionnaire() {
        let (pipeline, provider) = pipeline(vec![payload()]);
        let questionnaire = pipeline
            .generate(OBJECTIVE, &ScopingParams::with_minutes(12.0))
            .await
            .unwrap();

        assert_eq!(questionnaire.metadata.total_questions, 3);
        assert_eq!(questionnaire.metadata.estimated_time, "12 minutes");
        assert_eq!(pipeline.get(&questionnaire.id), Some(questionnaire.clone()));

        let request = &provider.requests()[0];
        assert_eq!(request.system, QUESTIONNAIRE_SYSTEM_PROMPT);
        assert!(request.user.contains("24-30 questions"));
    }

    #[tokio::test]
    async fn test_malformed_generation_stores_nothing() {
        let (pipeline, _) = pipeline(vec!["I cannot help with that.".into()]);
        let err = pipeline
            .generate(OBJECTIVE, &ScopingParams::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "MALFORMED_MODEL_OUTPUT");
        assert_eq!(pipeline.store().size(), 0);
    }

    #[tokio::test]
    async fn test_reject_policy_checks_before_calling_the_model() {
        let provider = Arc::new(ScriptedProvider::new(vec![payload()]));
        let config = AgentConfig::default().with_missing_edit_target(MissingEditTarget::Reject);
        let pipeline = SurveyPipeline::new(GenerationClient::new(provider.clone(), config));
        let questionnaire = pipeline
            .generate(OBJECTIVE, &ScopingParams::default())
            .await
            .unwrap();

        let stray = Question::new("Stray?", surveyforge_core::QuestionType::Text);
        let err = pipeline
            .edit_question(&stray, "make it shorter", Some(&questionnaire.id))
            .await
            .unwrap_err();

        assert!(matches!(err, SurveyError::NotFound(_)));
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_export_and_status() {
        let (pipeline, _) = pipeline(vec![payload()]);
        assert!(matches!(
            pipeline.export_json("qnr_missing"),
            Err(SurveyError::NotFound(_))
        ));

        let questionnaire = pipeline
            .generate(OBJECTIVE, &ScopingParams::default())
            .await
            .unwrap();
        let exported: Questionnaire =
            serde_json::from_str(&pipeline.export_json(&questionnaire.id).unwrap()).unwrap();
        assert_eq!(exported.id, questionnaire.id);
        assert_eq!(exported.sections, questionnaire.sections);

        let status = pipeline.status();
        assert!(status.configured);
        assert_eq!(status.model, "scripted-model");
        assert_eq!(status.stored_questionnaires, 1);
    }
}

//! Validator: read-only model critique of a questionnaire

use serde_json::Value;
use surveyforge_core::normalizer::parse_object;
use surveyforge_core::prompt::CRITIQUE_SYSTEM_PROMPT;
use surveyforge_core::{Questionnaire, Result, SurveyError, ValidationReport};

use crate::generation::GenerationClient;

#[derive(Debug, Clone)]
pub struct QuestionnaireValidator {
    client: GenerationClient,
}

impl QuestionnaireValidator {
    pub fn new(client: GenerationClient) -> Self {
        Self { client }
    }

    /// The model's verdict, returned as parsed
    pub async fn validate_questionnaire(&self, questionnaire: &Questionnaire) -> Result<ValidationReport> {
        let questionnaire_json = serde_json::to_string(questionnaire)?;
        let raw = self
            .client
            .critique(CRITIQUE_SYSTEM_PROMPT, &questionnaire_json)
            .await?;

        let object = parse_object(&raw)?;
        let report: ValidationReport = serde_json::from_value(Value::Object(object)).map_err(|e| {
            SurveyError::MalformedModelOutput(format!("critique is not a validation report: {}", e))
        })?;

        tracing::info!(
            questionnaire_id = %questionnaire.id,
            is_valid = report.is_valid,
            issues = report.issues.len(),
            "questionnaire validated"
        );
        Ok(report)
    }
}

//! End-to-end pipeline tests against a canned chat provider

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;

use surveyforge_agent::{
    AgentConfig, ChatCompletion, ChatProvider, ChatRequest, GenerationClient, MissingEditTarget,
    SurveyPipeline,
};
use surveyforge_core::{
    QuestionType, Questionnaire, QuestionnaireStore, Result, ScopingParams, SurveyError,
};

const OBJECTIVE: &str = "I want to test pricing sensitivity for a new shampoo brand";

#[derive(Debug, Default)]
struct CannedProvider {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl CannedProvider {
    fn new(responses: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ChatProvider for CannedProvider {
    fn name(&self) -> &str {
        "canned"
    }

    fn model(&self) -> &str {
        "canned-1"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion> {
        self.requests.lock().push(request);
        let content = self
            .responses
            .lock()
            .pop_front()
            .ok_or_else(|| SurveyError::Upstream("exhausted".into()))?;
        Ok(ChatCompletion {
            provider: "canned".into(),
            model: "canned-1".into(),
            content,
            total_tokens: 42,
        })
    }
}

fn generation_payload() -> String {
    let body = json!({
        "sections": [
            {"title": "Screener", "questions": [
                {"text": "Which of these do you buy?", "type": "multi", "options": ["Shampoo", "Soap"]},
                {"text": "How often do you buy shampoo?", "type": "dropdown"}
            ]},
            {"title": "Pricing", "questions": [
                {"text": "At what price is it too expensive?", "type": "text"},
                {"question": "How likely are you to recommend us?", "type": "NPS"}
            ]}
        ],
        "totalQuestions": 999
    });
    format!("```json\n{}\n```", body)
}

fn pipeline_with(
    responses: Vec<String>,
    policy: MissingEditTarget,
) -> (SurveyPipeline, Arc<CannedProvider>) {
    let provider = CannedProvider::new(responses);
    let config = AgentConfig::default().with_missing_edit_target(policy);
    let pipeline = SurveyPipeline::new(GenerationClient::new(provider.clone(), config));
    (pipeline, provider)
}

#[tokio::test]
async fn e2e_generate_then_edit_preserves_slot_and_identity() {
    let edit_response = json!({
        "id": "q_made_up_by_model",
        "text": "How often do you purchase shampoo?",
        "type": "single",
        "options": ["Weekly", "Monthly", "Less often"],
        "required": false
    })
    .to_string();
    let (pipeline, provider) =
        pipeline_with(vec![generation_payload(), edit_response], MissingEditTarget::Ignore);

    let questionnaire = pipeline
        .generate(OBJECTIVE, &ScopingParams::with_minutes(10.0))
        .await
        .unwrap();
    assert_eq!(questionnaire.metadata.total_questions, 4);
    assert_eq!(questionnaire.sections[1].questions[1].question_type, QuestionType::Nps);
    assert!(provider.requests.lock()[0].user.contains("20-25 questions"));

    let target = questionnaire.sections[0].questions[1].clone();
    let edited = pipeline
        .edit_question(&target, "Use single choice with frequency buckets", Some(&questionnaire.id))
        .await
        .unwrap();

    assert_eq!(edited.id, target.id);
    assert_eq!(edited.options, vec!["Weekly", "Monthly", "Less often"]);
    assert!(!edited.required);

    let stored = pipeline.get_required(&questionnaire.id).unwrap();
    assert_eq!(stored.locate_question(&target.id), Some((0, 1)));
    assert_eq!(stored.sections[0].questions[1], edited);
    assert_eq!(stored.sections[0].questions[0], questionnaire.sections[0].questions[0]);
    assert_eq!(stored.sections[1], questionnaire.sections[1]);
    assert_eq!(stored.metadata.total_questions, 4);
    assert!(stored.question("q_made_up_by_model").is_none());

    let edit_request = &provider.requests.lock()[1];
    assert_eq!((edit_request.temperature, edit_request.max_tokens), (0.6, 1000));
}

#[tokio::test]
async fn e2e_edit_without_questionnaire_leaves_store_alone() {
    let (pipeline, _) = pipeline_with(
        vec![generation_payload(), json!({"text": "Reworded"}).to_string()],
        MissingEditTarget::Ignore,
    );
    let questionnaire = pipeline
        .generate(OBJECTIVE, &ScopingParams::default())
        .await
        .unwrap();
    let target = questionnaire.sections[1].questions[0].clone();

    let edited = pipeline.edit_question(&target, "reword", None).await.unwrap();

    assert_eq!(edited.text, "Reworded");
    assert_eq!(pipeline.get(&questionnaire.id), Some(questionnaire));
}

#[tokio::test]
async fn e2e_edit_of_foreign_question_is_silent_no_op_by_default() {
    let (pipeline, _) = pipeline_with(
        vec![
            generation_payload(),
            json!({"text": "Foreign", "type": "text"}).to_string(),
        ],
        MissingEditTarget::Ignore,
    );
    let questionnaire = pipeline
        .generate(OBJECTIVE, &ScopingParams::default())
        .await
        .unwrap();
    let foreign = surveyforge_core::Question::new("Not here", QuestionType::Text);

    let edited = pipeline
        .edit_question(&foreign, "rewrite", Some(&questionnaire.id))
        .await
        .unwrap();

    assert_eq!(edited.id, foreign.id);
    assert_eq!(pipeline.get(&questionnaire.id), Some(questionnaire));
}

#[tokio::test]
async fn e2e_edit_of_unknown_questionnaire_is_rejected_when_configured() {
    let (pipeline, provider) = pipeline_with(vec![], MissingEditTarget::Reject);
    let question = surveyforge_core::Question::new("Age?", QuestionType::Dropdown);

    let err = pipeline
        .edit_question(&question, "shorter", Some("qnr_nope"))
        .await
        .unwrap_err();

    assert!(matches!(err, SurveyError::NotFound(_)));
    assert!(provider.requests.lock().is_empty());
}

#[tokio::test]
async fn e2e_validate_is_read_only() {
    let critique = json!({
        "isValid": false,
        "issues": [{"questionId": null, "issue": "No attention check", "suggestion": "Add one"}]
    })
    .to_string();
    let (pipeline, provider) =
        pipeline_with(vec![generation_payload(), critique], MissingEditTarget::Ignore);
    let questionnaire = pipeline
        .generate(OBJECTIVE, &ScopingParams::default())
        .await
        .unwrap();

    let report = pipeline.validate_questionnaire(&questionnaire).await.unwrap();

    assert!(!report.is_valid);
    assert_eq!(report.issues[0].issue, "No attention check");
    assert!(report.issues[0].question_id.is_none());
    assert_eq!(pipeline.get(&questionnaire.id), Some(questionnaire.clone()));

    let critique_request = &provider.requests.lock()[1];
    let sent: Questionnaire = serde_json::from_str(
        critique_request
            .user
            .rsplit("Questionnaire: ")
            .next()
            .unwrap(),
    )
    .unwrap();
    assert_eq!(sent.id, questionnaire.id);
}

#[tokio::test]
async fn e2e_unconfigured_service_is_reported_distinctly() {
    let config = AgentConfig::default().with_api_key("your_openai_api_key_here");
    let pipeline = SurveyPipeline::from_config(config).unwrap();

    assert!(!pipeline.status().configured);
    let err = pipeline
        .generate(OBJECTIVE, &ScopingParams::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "SERVICE_NOT_CONFIGURED");
    assert!(!err.is_recoverable());
    assert_eq!(pipeline.store().size(), 0);
}

#[tokio::test]
async fn e2e_upstream_failure_propagates_without_retry() {
    let (pipeline, provider) = pipeline_with(vec![], MissingEditTarget::Ignore);
    let err = pipeline
        .generate(OBJECTIVE, &ScopingParams::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "UPSTREAM_ERROR");
    assert_eq!(provider.requests.lock().len(), 1);
}

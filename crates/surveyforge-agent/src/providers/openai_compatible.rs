use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use super::{ChatCompletion, ChatProvider, ChatRequest};
use crate::config::AgentConfig;
use surveyforge_core::{Result, SurveyError};

/// Any service speaking the OpenAI `/chat/completions` dialect
#[derive(Clone)]
pub struct OpenAICompatibleProvider {
    pub name: String,
    api_key: Option<String>,
    base_url: String,
    model: String,
    headers: HashMap<String, String>,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for OpenAICompatibleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAICompatibleProvider")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("configured", &self.api_key.is_some())
            .finish()
    }
}

impl OpenAICompatibleProvider {
    pub fn new(
        name: impl Into<String>,
        api_key: Option<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            headers: HashMap::new(),
            http_client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let mut provider = Self::new(
            "openai",
            config.api_key().map(str::to_string),
            &config.base_url,
            &config.model,
        );

        if let Some(secs) = config.request_timeout_secs {
            provider.http_client = reqwest::Client::builder()
                .timeout(Duration::from_secs(secs))
                .build()
                .map_err(|e| SurveyError::Config(format!("Failed to build HTTP client: {}", e)))?;
        }

        Ok(provider)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    total_tokens: Option<u32>,
}

impl ChatCompletionRequest {
    fn from_chat(model: &str, request: ChatRequest) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Some(request.system),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(request.user),
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: request
                .json_mode
                .then_some(ResponseFormat { kind: "json_object" }),
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAICompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            SurveyError::ServiceNotConfigured(
                "OpenAI API key is not configured. Set OPENAI_API_KEY or add api_key to surveyforge.toml"
                    .to_string(),
            )
        })?;

        let body = ChatCompletionRequest::from_chat(&self.model, request);

        let mut builder = self
            .http_client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .bearer_auth(api_key);

        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }

        let response = builder.json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                SurveyError::Upstream(format!("{} request timed out", self.name))
            } else {
                SurveyError::Upstream(format!("Failed to send {} request: {}", self.name, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SurveyError::Upstream(format!(
                "{} API error ({}): {}",
                self.name, status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            SurveyError::MalformedModelOutput(format!("Failed to parse {} response: {}", self.name, e))
        })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                SurveyError::MalformedModelOutput(format!("{} returned no message content", self.name))
            })?;

        let total_tokens = completion
            .usage
            .as_ref()
            .and_then(|u| u.total_tokens)
            .unwrap_or(0);

        Ok(ChatCompletion {
            provider: self.name.clone(),
            model: self.model.clone(),
            content,
            total_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json_mode: bool) -> ChatRequest {
        ChatRequest {
            system: "sys".into(),
            user: "usr".into(),
            temperature: 0.6,
            max_tokens: 1000,
            json_mode,
        }
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatCompletionRequest::from_chat("gpt-4-turbo-preview", request(true));
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["model"], "gpt-4-turbo-preview");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "usr");
        assert_eq!(value["temperature"], 0.6);
        assert_eq!(value["max_tokens"], 1000);
        assert_eq!(value["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_response_format_omitted_without_json_mode() {
        let body = ChatCompletionRequest::from_chat("m", request(false));
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("response_format").is_none());
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let provider = OpenAICompatibleProvider::new("local", None, "http://localhost:1234/v1/", "m");
        assert_eq!(provider.endpoint(), "http://localhost:1234/v1/chat/completions");
    }

    #[test]
    fn test_extra_headers_are_kept() {
        let provider = OpenAICompatibleProvider::new("azure", Some("k".into()), "http://x", "m")
            .with_header("OpenAI-Organization", "org-1");
        assert_eq!(
            provider.headers.get("OpenAI-Organization").map(String::as_str),
            Some("org-1")
        );
    }

    #[test]
    fn test_from_config_drops_placeholder_key() {
        let config = AgentConfig::default().with_api_key(crate::config::PLACEHOLDER_API_KEY);
        let provider = OpenAICompatibleProvider::from_config(&config).unwrap();
        assert!(!provider.is_configured());
        assert!(!format!("{:?}", provider).contains("your_openai"));
    }

    #[test]
    fn test_missing_key_fails_before_any_request() {
        let provider = OpenAICompatibleProvider::new("openai", None, "http://127.0.0.1:9", "m");
        let err = tokio_test::block_on(provider.complete(request(true))).unwrap_err();
        assert_eq!(err.kind(), "SERVICE_NOT_CONFIGURED");
    }

    #[test]
    fn test_null_content_parses() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}

//! Generation client
//!
//! The three model calls the pipeline makes, each a single request with the
//! sampling settings of its kind. Failures propagate; nothing is retried.

use std::fmt;
use std::sync::Arc;

use surveyforge_core::prompt::{critique_prompt, edit_prompt};
use surveyforge_core::Result;

use crate::config::{AgentConfig, CallSettings};
use crate::providers::{ChatProvider, ChatRequest, OpenAICompatibleProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Generation,
    Edit,
    Critique,
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Generation => "generation",
            Self::Edit => "edit",
            Self::Critique => "critique",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct GenerationClient {
    provider: Arc<dyn ChatProvider>,
    config: AgentConfig,
}

impl GenerationClient {
    pub fn new(provider: Arc<dyn ChatProvider>, config: AgentConfig) -> Self {
        Self { provider, config }
    }

    /// Client backed by the OpenAI-compatible provider described by `config`
    pub fn from_config(config: AgentConfig) -> Result<Self> {
        let provider = OpenAICompatibleProvider::from_config(&config)?;
        Ok(Self::new(Arc::new(provider), config))
    }

    pub fn provider(&self) -> &dyn ChatProvider {
        self.provider.as_ref()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn settings(&self, kind: CallKind) -> CallSettings {
        match kind {
            CallKind::Generation => self.config.generation,
            CallKind::Edit => self.config.edit,
            CallKind::Critique => self.config.critique,
        }
    }

    pub async fn generate(&self, system_instruction: &str, user_prompt: &str) -> Result<String> {
        self.call(CallKind::Generation, system_instruction, user_prompt.to_string())
            .await
    }

    pub async fn edit(
        &self,
        system_instruction: &str,
        question_json: &str,
        instruction: &str,
    ) -> Result<String> {
        self.call(
            CallKind::Edit,
            system_instruction,
            edit_prompt(question_json, instruction),
        )
        .await
    }

    pub async fn critique(&self, system_instruction: &str, questionnaire_json: &str) -> Result<String> {
        self.call(
            CallKind::Critique,
            system_instruction,
            critique_prompt(questionnaire_json),
        )
        .await
    }

    async fn call(&self, kind: CallKind, system: &str, user: String) -> Result<String> {
        let settings = self.settings(kind);
        tracing::debug!(
            call = %kind,
            provider = self.provider.name(),
            model = self.provider.model(),
            prompt_chars = user.len(),
            "sending model request"
        );

        let completion = self
            .provider
            .complete(ChatRequest {
                system: system.to_string(),
                user,
                temperature: settings.temperature,
                max_tokens: settings.max_tokens,
                json_mode: true,
            })
            .await?;

        tracing::debug!(
            call = %kind,
            response_chars = completion.content.len(),
            total_tokens = completion.total_tokens,
            "model response received"
        );
        Ok(completion.content)
    }
}

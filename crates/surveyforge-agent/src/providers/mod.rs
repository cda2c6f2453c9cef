//! Chat-completion providers
//!
//! Everything the pipeline needs from a model service goes through
//! [`ChatProvider`]: one system turn, one user turn, one text answer.

pub mod openai_compatible;

pub use openai_compatible::OpenAICompatibleProvider;

use async_trait::async_trait;
use surveyforge_core::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Ask the service to constrain its answer to a JSON object
    pub json_mode: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion {
    pub provider: String,
    pub model: String,
    pub content: String,
    pub total_tokens: u32,
}

#[async_trait]
pub trait ChatProvider: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    /// Whether a call could be attempted at all (credential present)
    fn is_configured(&self) -> bool;

    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion>;
}

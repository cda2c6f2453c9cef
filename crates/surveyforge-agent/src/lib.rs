//! SurveyForge Agent - the model-facing half of the questionnaire pipeline
//!
//! Wraps an OpenAI-compatible chat-completion service behind [`ChatProvider`]
//! and drives the deterministic pieces from `surveyforge-core` around it:
//!
//! - [`GenerationClient`]: generate / edit / critique calls with per-kind sampling
//! - [`QuestionEditor`]: question rewrites that keep the original identifier
//! - [`QuestionnaireValidator`]: read-only critique into a [`ValidationReport`]
//! - [`SurveyPipeline`]: the facade a transport layer calls
//!
//! [`ValidationReport`]: surveyforge_core::ValidationReport

#![deny(unsafe_code)]
#![warn(rust_2018_idioms, missing_debug_implementations, clippy::all)]

pub mod config;
pub mod editor;
pub mod generation;
pub mod pipeline;
pub mod providers;
pub mod validator;

pub use config::{AgentConfig, CallSettings, MissingEditTarget};
pub use editor::QuestionEditor;
pub use generation::{CallKind, GenerationClient};
pub use pipeline::{ServiceStatus, SurveyPipeline};
pub use providers::{ChatCompletion, ChatProvider, ChatRequest, OpenAICompatibleProvider};
pub use validator::QuestionnaireValidator;

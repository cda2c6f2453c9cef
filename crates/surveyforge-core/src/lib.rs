//! SurveyForge Core - the questionnaire generation/normalization pipeline
//!
//! Everything here is deterministic and network-free. The model-facing half
//! lives in `surveyforge-agent`.
//!
//! # Architecture
//!
//! ```text
//! objective ──► InputGate ──► prompt::compose ──► (model) ──► normalizer ──► QuestionnaireStore
//! ```
//!
//! 1. **Input Gate** (`input_gate`): rejects junk objectives before any model call
//! 2. **Prompt Composer** (`prompt`): question-count targets and the user-turn prompt
//! 3. **Normalizer** (`normalizer`): untrusted JSON into the canonical graph
//! 4. **Store** (`store`): keyed, process-lifetime questionnaire holder
//!
//! # Quick Start
//!
//! ```
//! use surveyforge_core::{normalize, InputGate, ScopingParams};
//!
//! let objective = "We want to understand how customers perceive our new loyalty program";
//! assert!(InputGate::check(objective).valid);
//!
//! let scoping = ScopingParams::with_minutes(10.0);
//! let prompt = surveyforge_core::prompt::compose(objective, &scoping);
//! assert!(prompt.contains("20-25 questions"));
//!
//! let raw = r#"{"sections": [{"title": "Screener", "questions": [{"text": "Age?"}]}]}"#;
//! let questionnaire = normalize(raw, &scoping).unwrap();
//! assert_eq!(questionnaire.metadata.total_questions, 1);
//! ```

#![deny(unsafe_code)]
#![warn(rust_2018_idioms, missing_debug_implementations, clippy::all)]

pub mod error;
pub mod input_gate;
pub mod normalizer;
pub mod prompt;
pub mod scoping;
pub mod store;
pub mod types;

pub use error::{Result, ResultExt, SurveyError};
pub use input_gate::{GateVerdict, InputGate};
pub use normalizer::{coerce_question, normalize};
pub use scoping::{ScopingParams, SurveyLength};
pub use store::{InMemoryStore, QuestionnairePatch, QuestionnaireStore};
pub use types::{
    Question, QuestionMetadata, QuestionType, Questionnaire, QuestionnaireMetadata, ScaleSpec,
    Section, Timestamp, ValidationIssue, ValidationReport, ValidationRule,
};

/// Estimated time when the survey length is not numeric
pub const DEFAULT_ESTIMATED_TIME: &str = "10 minutes";

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

//! Error types for SurveyForge Core
//!
//! This module defines all error types used throughout the questionnaire pipeline.
//! We use `thiserror` for ergonomic error definitions with automatic Display/Error implementations.

use thiserror::Error;

/// Result type alias for SurveyForge operations
pub type Result<T> = std::result::Result<T, SurveyError>;

/// Main error type for SurveyForge operations
#[derive(Error, Debug)]
pub enum SurveyError {
    /// The research objective was rejected by the input gate
    #[error("Invalid research objective: {0}")]
    InvalidObjective(String),

    /// Scoping parameters failed validation
    #[error("Invalid scoping parameters: {}", .0.join("; "))]
    InvalidScoping(Vec<String>),

    /// A question edit instruction was blank or out of bounds
    #[error("Invalid edit instruction: {0}")]
    InvalidInstruction(String),

    /// The external model service has no usable credential
    #[error("AI service not configured: {0}")]
    ServiceNotConfigured(String),

    /// The model answered with something that is not well-shaped JSON
    #[error("Malformed model output: {0}")]
    MalformedModelOutput(String),

    /// The external model service failed or answered with an error status
    #[error("AI service error: {0}")]
    Upstream(String),

    /// Lookup against an unknown identifier
    #[error("Not found: {0}")]
    NotFound(String),

    /// Store save without an identifier
    #[error("Questionnaire must have an ID")]
    MissingIdentifier,

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        source: Box<SurveyError>,
    },
}

impl SurveyError {
    /// Add context to an error
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any context wrappers
    pub fn root(&self) -> &SurveyError {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Stable machine-readable code for the transport layer
    pub fn kind(&self) -> &'static str {
        match self.root() {
            Self::InvalidObjective(_) => "INVALID_OBJECTIVE",
            Self::InvalidScoping(_) => "INVALID_SCOPING",
            Self::InvalidInstruction(_) => "INVALID_INSTRUCTION",
            Self::ServiceNotConfigured(_) => "SERVICE_NOT_CONFIGURED",
            Self::MalformedModelOutput(_) => "MALFORMED_MODEL_OUTPUT",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::MissingIdentifier => "MISSING_IDENTIFIER",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::WithContext { .. } => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller can fix the failure by resubmitting different input
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.root(),
            Self::InvalidObjective(_)
                | Self::InvalidScoping(_)
                | Self::InvalidInstruction(_)
                | Self::NotFound(_)
        )
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to a Result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add lazy context to a Result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.context(f()))
    }
}

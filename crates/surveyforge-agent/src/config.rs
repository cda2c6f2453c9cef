//! Agent configuration
//!
//! Resolved from an optional config file (TOML or JSON) and then the
//! environment, environment winning.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use surveyforge_core::{Result, SurveyError};

pub const CONFIG_PATH_ENV: &str = "SURVEYFORGE_CONFIG";
pub const TIMEOUT_ENV: &str = "SURVEYFORGE_TIMEOUT_SECS";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const MODEL_ENV: &str = "OPENAI_MODEL";
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";

/// Value shipped in `.env.example`; treated as no key at all
pub const PLACEHOLDER_API_KEY: &str = "your_openai_api_key_here";

const DEFAULT_CONFIG_FILES: [&str; 2] = ["surveyforge.toml", "surveyforge.json"];

/// Sampling settings for one kind of model call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CallSettings {
    pub temperature: f64,
    pub max_tokens: u32,
}

impl CallSettings {
    pub const fn new(temperature: f64, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
        }
    }
}

/// What an edit does when its target question cannot be found in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingEditTarget {
    /// Return the edited question and leave the store untouched
    #[default]
    Ignore,
    /// Fail with `NotFound`
    Reject,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub generation: CallSettings,
    pub edit: CallSettings,
    pub critique: CallSettings,
    pub request_timeout_secs: Option<u64>,
    pub missing_edit_target: MissingEditTarget,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            generation: CallSettings::new(0.7, 4000),
            edit: CallSettings::new(0.6, 1000),
            critique: CallSettings::new(0.3, 2000),
            request_timeout_secs: None,
            missing_edit_target: MissingEditTarget::Ignore,
        }
    }
}

// Hand-written so the key never ends up in logs.
impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("api_key", &self.api_key().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("generation", &self.generation)
            .field("edit", &self.edit)
            .field("critique", &self.critique)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("missing_edit_target", &self.missing_edit_target)
            .finish()
    }
}

impl AgentConfig {
    /// Config file (if any) overlaid with the process environment.
    ///
    /// A config file that cannot be read or parsed is logged and skipped.
    pub fn load() -> Result<Self> {
        let lookup = |key: &str| std::env::var(key).ok();
        Self::load_from(Self::discover_path(&lookup), lookup)
    }

    /// Load `path` (if any), then overlay values from `lookup`
    pub fn load_from<F>(path: Option<PathBuf>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => match Self::from_file(&path) {
                Ok(config) => {
                    tracing::debug!(path = %path.display(), "loaded agent config");
                    config
                }
                Err(e) => {
                    tracing::warn!(
                        "Invalid agent config at {:?}: {}. Falling back to environment configuration.",
                        path,
                        e
                    );
                    Self::default()
                }
            },
            None => Self::default(),
        };

        config.apply_env(lookup)?;
        Ok(config)
    }

    /// Defaults overlaid with the process environment only
    pub fn from_env() -> Result<Self> {
        Self::load_from(None, |key| std::env::var(key).ok())
    }

    /// Parse a config file; `.toml` files as TOML, anything else as JSON
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            toml::from_str(&content)
                .map_err(|e| SurveyError::Config(format!("{}: {}", path.display(), e)))
        } else {
            serde_json::from_str(&content)
                .map_err(|e| SurveyError::Config(format!("{}: {}", path.display(), e)))
        }
    }

    /// Overlay values from `lookup` (normally the process environment)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV) {
            self.api_key = Some(key);
        }
        if let Some(model) = lookup(MODEL_ENV).filter(|m| !m.trim().is_empty()) {
            self.model = model;
        }
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.base_url = base_url;
        }
        if let Some(raw) = lookup(TIMEOUT_ENV).filter(|t| !t.trim().is_empty()) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                SurveyError::Config(format!("{} must be whole seconds, got {:?}", TIMEOUT_ENV, raw))
            })?;
            self.request_timeout_secs = Some(secs);
        }
        Ok(())
    }

    /// The usable API key, if any
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != PLACEHOLDER_API_KEY)
    }

    pub fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_missing_edit_target(mut self, policy: MissingEditTarget) -> Self {
        self.missing_edit_target = policy;
        self
    }

    fn discover_path<F>(lookup: &F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(CONFIG_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            return Some(PathBuf::from(path));
        }

        DEFAULT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.is_file())
    }
}

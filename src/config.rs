//! YAML configuration for docdelta.
//!
//! ```yaml
//! version: "1.0"
//! name: "contract review"
//!
//! align:
//!   similarity_threshold: 0.6
//!
//! classifier:
//!   include_unchanged: false
//!   concurrency: 8
//!   trivial_edit_distance: 1
//!   document_type: "contract"
//!   word_context: 2
//!
//! judge:
//!   backend: "http"
//!   timeout_ms: 10000
//!   url: "https://api.openai.com/v1/chat/completions"
//!   provider: "openai"
//!   model: "gpt-4o"
//!   retry:
//!     max_retries: 1
//!     base_delay_ms: 500
//!     max_delay_ms: 5000
//!     jitter: true
//! ```
//!
//! `DOCDELTA_JUDGE_URL`, `DOCDELTA_JUDGE_API_KEY` and
//! `DOCDELTA_JUDGE_MODEL` override the judge section.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use judge::{HttpJudge, HttpJudgeConfig, JudgeError, JudgeProvider, RetryConfig, SemanticJudge, StubJudge};
use rules::RuleConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wordiff::DEFAULT_CONTEXT_WORDS;

use crate::options::CompareOptions;

pub const ENV_JUDGE_URL: &str = "DOCDELTA_JUDGE_URL";
pub const ENV_JUDGE_API_KEY: &str = "DOCDELTA_JUDGE_API_KEY";
pub const ENV_JUDGE_MODEL: &str = "DOCDELTA_JUDGE_MODEL";

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocdeltaConfig {
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub align: AlignYamlConfig,

    #[serde(default)]
    pub classifier: ClassifierYamlConfig,

    #[serde(default)]
    pub judge: JudgeYamlConfig,
}

impl DocdeltaConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: DocdeltaConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.align.validate()?;
        self.classifier.validate()?;
        self.judge.validate()?;
        Ok(())
    }

    /// Applies the `DOCDELTA_JUDGE_*` variables from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Applies judge overrides looked up through `lookup`. Empty values are
    /// ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = get(ENV_JUDGE_URL) {
            self.judge.url = Some(url);
        }
        if let Some(key) = get(ENV_JUDGE_API_KEY) {
            self.judge.api_key = Some(key);
        }
        if let Some(model) = get(ENV_JUDGE_MODEL) {
            self.judge.model = model;
        }
    }

    pub fn compare_options(&self) -> CompareOptions {
        CompareOptions {
            include_unchanged: self.classifier.include_unchanged,
            concurrency: self.classifier.concurrency,
            judge_timeout_ms: self.judge.timeout_ms,
            retry: self.judge.retry,
            similarity_threshold: self.align.similarity_threshold,
            rules: RuleConfig {
                trivial_edit_distance: self.classifier.trivial_edit_distance,
            },
            document_type: self.classifier.document_type.clone(),
            word_context: self.classifier.word_context,
            job_id: None,
        }
    }

    /// Startup notice for backends that do not consult a model.
    pub fn judge_warning(&self) -> Option<String> {
        match self.judge.backend {
            JudgeBackend::Stub => Some(
                "judge backend is `stub`: escalated changes get a fixed MEDIUM verdict, \
                 not a model judgment; set judge.backend to `http` for real classification"
                    .to_string(),
            ),
            JudgeBackend::Http => None,
        }
    }

    /// Builds the configured judge backend.
    pub fn build_judge(&self) -> Result<Arc<dyn SemanticJudge>, JudgeError> {
        match self.judge.backend {
            JudgeBackend::Stub => Ok(Arc::new(StubJudge::default())),
            JudgeBackend::Http => {
                let url = self.judge.url.clone().ok_or_else(|| {
                    JudgeError::InvalidConfig(format!(
                        "judge.url (or {ENV_JUDGE_URL}) is required for the http backend"
                    ))
                })?;
                let judge = HttpJudge::new(HttpJudgeConfig {
                    url,
                    api_key: self.judge.api_key.clone(),
                    model: self.judge.model.clone(),
                    provider: self.judge.provider,
                    max_tokens: self.judge.max_tokens,
                })?;
                Ok(Arc::new(judge))
            }
        }
    }
}

impl Default for DocdeltaConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            align: AlignYamlConfig::default(),
            classifier: ClassifierYamlConfig::default(),
            judge: JudgeYamlConfig::default(),
        }
    }
}

/// Block alignment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignYamlConfig {
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

impl AlignYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(ConfigLoadError::Validation(format!(
                "align.similarity_threshold must be in (0, 1], got {}",
                self.similarity_threshold
            )));
        }
        Ok(())
    }
}

impl Default for AlignYamlConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

/// Classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierYamlConfig {
    #[serde(default)]
    pub include_unchanged: bool,

    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_trivial_edit_distance")]
    pub trivial_edit_distance: usize,

    #[serde(default)]
    pub document_type: Option<String>,

    /// Words of context on each side of a reported word change.
    #[serde(default = "default_word_context")]
    pub word_context: usize,
}

impl ClassifierYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.concurrency == 0 {
            return Err(ConfigLoadError::Validation(
                "classifier.concurrency must be >= 1".to_string(),
            ));
        }
        if let Some(kind) = self.document_type.as_deref()
            && !DOCUMENT_TYPES.contains(&kind)
        {
            return Err(ConfigLoadError::Validation(format!(
                "classifier.document_type must be one of {DOCUMENT_TYPES:?}, got `{kind}`"
            )));
        }
        Ok(())
    }
}

impl Default for ClassifierYamlConfig {
    fn default() -> Self {
        Self {
            include_unchanged: false,
            concurrency: default_concurrency(),
            trivial_edit_distance: default_trivial_edit_distance(),
            document_type: None,
            word_context: default_word_context(),
        }
    }
}

const DOCUMENT_TYPES: [&str; 4] = ["general", "contract", "policy", "report"];

/// Which judge implementation to run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JudgeBackend {
    /// Fixed MEDIUM verdict, no network.
    #[default]
    Stub,
    Http,
}

impl fmt::Display for JudgeBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JudgeBackend::Stub => "stub",
            JudgeBackend::Http => "http",
        })
    }
}

/// Judge backend and resilience settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct JudgeYamlConfig {
    #[serde(default)]
    pub backend: JudgeBackend,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub provider: JudgeProvider,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl JudgeYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.timeout_ms == 0 {
            return Err(ConfigLoadError::Validation(
                "judge.timeout_ms must be >= 1".to_string(),
            ));
        }
        if self.retry.max_delay < self.retry.base_delay {
            return Err(ConfigLoadError::Validation(
                "judge.retry.max_delay_ms must be >= base_delay_ms".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for JudgeYamlConfig {
    fn default() -> Self {
        Self {
            backend: JudgeBackend::Stub,
            timeout_ms: default_timeout_ms(),
            retry: RetryConfig::default(),
            url: None,
            api_key: None,
            model: default_model(),
            provider: JudgeProvider::Custom,
            max_tokens: default_max_tokens(),
        }
    }
}

impl fmt::Debug for JudgeYamlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JudgeYamlConfig")
            .field("backend", &self.backend)
            .field("timeout_ms", &self.timeout_ms)
            .field("retry", &self.retry)
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("provider", &self.provider)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

fn default_similarity_threshold() -> f64 {
    0.6
}
fn default_concurrency() -> usize {
    8
}
fn default_word_context() -> usize {
    DEFAULT_CONTEXT_WORDS
}

fn default_trivial_edit_distance() -> usize {
    1
}
fn default_timeout_ms() -> u64 {
    10_000
}
fn default_model() -> String {
    "gpt-4o".to_string()
}
fn default_max_tokens() -> u32 {
    300
}

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::JudgeError;

/// Rationale attached to fallback verdicts.
pub const FALLBACK_RATIONALE: &str = "classification unavailable";

/// Business impact of a change. Ordered `Critical > Medium > Low`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    Low,
    Medium,
    Critical,
}

impl ImpactLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactLevel::Low => "low",
            ImpactLevel::Medium => "medium",
            ImpactLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImpactLevel {
    type Err = JudgeError;

    /// Case-insensitive; `"high"` is read as critical.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" | "high" => Ok(ImpactLevel::Critical),
            "medium" => Ok(ImpactLevel::Medium),
            "low" => Ok(ImpactLevel::Low),
            other => Err(JudgeError::MalformedResponse(format!(
                "unknown impact level `{other}`"
            ))),
        }
    }
}

/// What the judge is asked about: one changed block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JudgeRequest {
    pub old_text: String,
    pub new_text: String,
    pub block_type: String,
    /// Document category (`general`, `contract`, `policy`, `report`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
}

impl JudgeRequest {
    pub fn new(
        old_text: impl Into<String>,
        new_text: impl Into<String>,
        block_type: impl Into<String>,
    ) -> Self {
        Self {
            old_text: old_text.into(),
            new_text: new_text.into(),
            block_type: block_type.into(),
            document_type: None,
        }
    }

    pub fn with_document_type(mut self, document_type: impl Into<String>) -> Self {
        self.document_type = Some(document_type.into());
        self
    }
}

/// The judge's opinion on one change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JudgeVerdict {
    pub impact: ImpactLevel,
    pub rationale: String,
    /// Self-reported confidence in `[0, 1]`.
    pub confidence: f64,
}

impl JudgeVerdict {
    pub fn new(impact: ImpactLevel, rationale: impl Into<String>, confidence: f64) -> Self {
        Self {
            impact,
            rationale: rationale.into(),
            confidence,
        }
    }

    /// Verdict used when no judgment could be obtained.
    pub fn fallback() -> Self {
        Self::new(ImpactLevel::Medium, FALLBACK_RATIONALE, 0.0)
    }

    /// Rejects non-finite confidence and clamps the rest into `[0, 1]`.
    pub fn validated(mut self) -> Result<Self, JudgeError> {
        if !self.confidence.is_finite() {
            return Err(JudgeError::MalformedResponse(format!(
                "confidence must be finite, got {}",
                self.confidence
            )));
        }
        self.confidence = self.confidence.clamp(0.0, 1.0);
        Ok(self)
    }
}

/// Where a verdict came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VerdictSource {
    Judge,
    Fallback,
}

/// Result of one resilient classification, including bookkeeping the
/// caller needs for records and job stats.
#[derive(Debug, Clone)]
pub struct JudgeOutcome {
    pub verdict: JudgeVerdict,
    pub source: VerdictSource,
    /// Judge invocations made for this request (0 on a cache hit).
    pub attempts: u32,
    /// Served from the job's memo cache.
    pub cached: bool,
    /// Last error seen when the outcome is a fallback.
    pub error: Option<JudgeError>,
    pub elapsed: Duration,
}

impl JudgeOutcome {
    pub fn is_fallback(&self) -> bool {
        self.source == VerdictSource::Fallback
    }
}

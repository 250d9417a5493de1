use std::time::Duration;

use align::SimilarityConfig;
use judge::{JudgePolicy, RetryConfig};
use rules::RuleConfig;
use serde::{Deserialize, Serialize};
use wordiff::DEFAULT_CONTEXT_WORDS;

use crate::error::CompareError;

/// Knobs for one compare job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompareOptions {
    /// Emit UNCHANGED records too.
    pub include_unchanged: bool,
    /// Maximum judge calls in flight.
    pub concurrency: usize,
    /// Deadline per judge attempt.
    pub judge_timeout_ms: u64,
    pub retry: RetryConfig,
    /// Minimum score for the similarity pass of the aligner.
    pub similarity_threshold: f64,
    pub rules: RuleConfig,
    /// `general`, `contract`, `policy` or `report`; passed to the judge.
    pub document_type: Option<String>,
    /// Words of context on each side of a reported word change.
    pub word_context: usize,
    /// Caller-chosen job id; a UUID v4 is generated otherwise.
    pub job_id: Option<String>,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            include_unchanged: false,
            concurrency: 8,
            judge_timeout_ms: 10_000,
            retry: RetryConfig::default(),
            similarity_threshold: SimilarityConfig::default().threshold,
            rules: RuleConfig::default(),
            document_type: None,
            word_context: DEFAULT_CONTEXT_WORDS,
            job_id: None,
        }
    }
}

impl CompareOptions {
    pub fn with_include_unchanged(mut self, include: bool) -> Self {
        self.include_unchanged = include;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_judge_timeout(mut self, timeout: Duration) -> Self {
        self.judge_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_document_type(mut self, document_type: impl Into<String>) -> Self {
        self.document_type = Some(document_type.into());
        self
    }

    pub fn with_word_context(mut self, words: usize) -> Self {
        self.word_context = words;
        self
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    pub fn validate(&self) -> Result<(), CompareError> {
        if self.concurrency == 0 {
            return Err(CompareError::InvalidOptions(
                "concurrency must be >= 1".into(),
            ));
        }
        if self.judge_timeout_ms == 0 {
            return Err(CompareError::InvalidOptions(
                "judge_timeout_ms must be >= 1".into(),
            ));
        }
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(CompareError::InvalidOptions(format!(
                "similarity_threshold must be in (0, 1], got {}",
                self.similarity_threshold
            )));
        }
        Ok(())
    }

    pub fn similarity(&self) -> SimilarityConfig {
        SimilarityConfig {
            threshold: self.similarity_threshold,
            ..SimilarityConfig::default()
        }
    }

    pub fn judge_policy(&self) -> JudgePolicy {
        JudgePolicy::default()
            .with_timeout(Duration::from_millis(self.judge_timeout_ms))
            .with_retry(self.retry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = CompareOptions::default();
        assert!(!options.include_unchanged);
        assert_eq!(options.concurrency, 8);
        assert_eq!(options.judge_timeout_ms, 10_000);
        assert_eq!(options.similarity_threshold, 0.6);
        assert_eq!(options.word_context, 2);
        assert_eq!(options.judge_policy().timeout, Duration::from_secs(10));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn validation() {
        assert!(CompareOptions::default().with_concurrency(0).validate().is_err());
        assert!(CompareOptions::default()
            .with_similarity_threshold(0.0)
            .validate()
            .is_err());
        assert!(CompareOptions::default()
            .with_similarity_threshold(f64::NAN)
            .validate()
            .is_err());
        assert!(CompareOptions::default()
            .with_similarity_threshold(1.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn partial_json() {
        let options: CompareOptions =
            serde_json::from_str(r#"{"include_unchanged": true, "concurrency": 2}"#).unwrap();
        assert!(options.include_unchanged);
        assert_eq!(options.concurrency, 2);
        assert_eq!(options.judge_timeout_ms, 10_000);
    }
}

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cache::{ContentKey, JudgeCache};
use crate::error::JudgeError;
use crate::judge::SemanticJudge;
use crate::retry::{retry_async, RetryConfig};
use crate::serde_millis::to_millis;
use crate::types::{JudgeOutcome, JudgeRequest, JudgeVerdict, VerdictSource};

/// Deadline and retry settings applied around every judge call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgePolicy {
    /// Deadline for a single attempt.
    #[serde(with = "crate::serde_millis", rename = "timeout_ms")]
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for JudgePolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
        }
    }
}

impl JudgePolicy {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Counters accumulated by a [`ResilientJudge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeStats {
    /// Attempts sent to the wrapped judge, retries included.
    pub calls: u64,
    pub cache_hits: u64,
    pub fallbacks: u64,
}

/// A judge call that never fails: per-attempt deadline, retry with
/// backoff, content-hash memoization and a MEDIUM fallback verdict.
pub struct ResilientJudge {
    judge: Arc<dyn SemanticJudge>,
    policy: JudgePolicy,
    cache: Arc<JudgeCache>,
    calls: AtomicU64,
    cache_hits: AtomicU64,
    fallbacks: AtomicU64,
}

impl ResilientJudge {
    /// Wraps `judge` with a fresh, empty cache.
    pub fn new(judge: Arc<dyn SemanticJudge>, policy: JudgePolicy) -> Self {
        Self {
            judge,
            policy,
            cache: Arc::new(JudgeCache::new()),
            calls: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
        }
    }

    pub fn policy(&self) -> &JudgePolicy {
        &self.policy
    }

    pub fn cache(&self) -> &Arc<JudgeCache> {
        &self.cache
    }

    pub fn stats(&self) -> JudgeStats {
        JudgeStats {
            calls: self.calls.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
        }
    }

    /// Classifies one edit. Identical `(old, new)` texts share a single
    /// judge call, including concurrent requests.
    pub async fn classify(&self, request: &JudgeRequest) -> JudgeOutcome {
        let started = Instant::now();
        let key = ContentKey::of(&request.old_text, &request.new_text);
        let slot = self.cache.slot(key);

        let mut attempts = 0;
        let attempts_out = &mut attempts;
        let result = slot
            .get_or_try_init(move || async move {
                let run = retry_async(&self.policy.retry, JudgeError::is_retryable, move |attempt| {
                    self.attempt(request, attempt)
                })
                .await;
                *attempts_out = run.attempts;
                run.result
            })
            .await;

        match result {
            Ok(verdict) => {
                let cached = attempts == 0;
                if cached {
                    self.cache_hits.fetch_add(1, Ordering::Relaxed);
                }
                JudgeOutcome {
                    verdict: verdict.clone(),
                    source: VerdictSource::Judge,
                    attempts,
                    cached,
                    error: None,
                    elapsed: started.elapsed(),
                }
            }
            Err(error) => {
                self.fallbacks.fetch_add(1, Ordering::Relaxed);
                warn!(
                    judge = self.judge.name(),
                    key = %key,
                    attempts,
                    error = %error,
                    "judge_fallback"
                );
                JudgeOutcome {
                    verdict: JudgeVerdict::fallback(),
                    source: VerdictSource::Fallback,
                    attempts,
                    cached: false,
                    error: Some(error),
                    elapsed: started.elapsed(),
                }
            }
        }
    }

    async fn attempt(&self, request: &JudgeRequest, attempt: u32) -> Result<JudgeVerdict, JudgeError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let deadline = self.policy.timeout;
        let result = match tokio::time::timeout(deadline, self.judge.classify(request)).await {
            Ok(Ok(verdict)) => verdict.validated(),
            Ok(Err(error)) => Err(error),
            Err(_) => Err(JudgeError::Timeout(to_millis(deadline))),
        };
        if let Err(error) = &result {
            debug!(judge = self.judge.name(), attempt, error = %error, "judge_attempt_failed");
        }
        result
    }
}

//! Judge doubles for exercising orchestration without a live service.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::JudgeError;
use crate::judge::SemanticJudge;
use crate::serde_millis::to_millis;
use crate::types::{ImpactLevel, JudgeRequest, JudgeVerdict};

/// Answers after a random delay in `[min, max]`.
#[derive(Debug, Clone)]
pub struct DelayJudge {
    verdict: JudgeVerdict,
    min: Duration,
    max: Duration,
}

impl DelayJudge {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            verdict: JudgeVerdict::new(ImpactLevel::Medium, "delayed judgment", 0.8),
            min,
            max: max.max(min),
        }
    }

    pub fn with_verdict(mut self, verdict: JudgeVerdict) -> Self {
        self.verdict = verdict;
        self
    }
}

#[async_trait]
impl SemanticJudge for DelayJudge {
    async fn classify(&self, _request: &JudgeRequest) -> Result<JudgeVerdict, JudgeError> {
        let millis = fastrand::u64(to_millis(self.min)..=to_millis(self.max));
        tokio::time::sleep(Duration::from_millis(millis)).await;
        Ok(self.verdict.clone())
    }
}

/// Wraps a judge and records call counts and peak concurrency.
#[derive(Debug, Default)]
pub struct CountingJudge<J> {
    inner: J,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl<J> CountingJudge<J> {
    pub fn new(inner: J) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous `classify` calls observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl<J: SemanticJudge> SemanticJudge for CountingJudge<J> {
    async fn classify(&self, request: &JudgeRequest) -> Result<JudgeVerdict, JudgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        // Decrements on completion and on cancellation alike.
        let _guard = InFlight(&self.in_flight);
        self.inner.classify(request).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Always fails with the given error.
#[derive(Debug, Clone)]
pub struct FailingJudge {
    error: JudgeError,
}

impl FailingJudge {
    pub fn new(error: JudgeError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl SemanticJudge for FailingJudge {
    async fn classify(&self, _request: &JudgeRequest) -> Result<JudgeVerdict, JudgeError> {
        Err(self.error.clone())
    }
}

/// Fails a fixed number of times, then succeeds.
#[derive(Debug)]
pub struct FlakyJudge {
    failures_left: AtomicU32,
    error: JudgeError,
    verdict: JudgeVerdict,
}

impl FlakyJudge {
    pub fn new(failures: u32, error: JudgeError, verdict: JudgeVerdict) -> Self {
        Self {
            failures_left: AtomicU32::new(failures),
            error,
            verdict,
        }
    }
}

#[async_trait]
impl SemanticJudge for FlakyJudge {
    async fn classify(&self, _request: &JudgeRequest) -> Result<JudgeVerdict, JudgeError> {
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            Err(self.error.clone())
        } else {
            Ok(self.verdict.clone())
        }
    }
}

/// Never answers; every call runs into the caller's deadline.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingJudge;

#[async_trait]
impl SemanticJudge for PendingJudge {
    async fn classify(&self, _request: &JudgeRequest) -> Result<JudgeVerdict, JudgeError> {
        std::future::pending().await
    }
}

/// Judge computed synchronously from the request.
pub struct FnJudge<F> {
    f: F,
}

impl<F> FnJudge<F>
where
    F: Fn(&JudgeRequest) -> Result<JudgeVerdict, JudgeError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> SemanticJudge for FnJudge<F>
where
    F: Fn(&JudgeRequest) -> Result<JudgeVerdict, JudgeError> + Send + Sync,
{
    async fn classify(&self, request: &JudgeRequest) -> Result<JudgeVerdict, JudgeError> {
        (self.f)(request)
    }
}

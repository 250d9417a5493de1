//! Semantic impact judgment for document edits.
//!
//! [`SemanticJudge`] is the capability: one attempt at rating an
//! `(old, new)` edit as critical, medium or low. Transports implement it
//! ([`HttpJudge`], [`StubJudge`]); [`ResilientJudge`] adds the policy every
//! caller wants around it:
//!
//! - a per-attempt deadline (default 10 s)
//! - one retry with exponential backoff from 500 ms for transient failures
//! - a MEDIUM "classification unavailable" verdict when all attempts fail
//! - memoization of successful verdicts by SHA-256 of the two texts
//!
//! ```
//! use std::sync::Arc;
//! use judge::{ImpactLevel, JudgePolicy, JudgeRequest, ResilientJudge, StubJudge};
//!
//! let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
//! rt.block_on(async {
//!     let judge = ResilientJudge::new(
//!         Arc::new(StubJudge::with_impact(ImpactLevel::Low)),
//!         JudgePolicy::default(),
//!     );
//!     let request = JudgeRequest::new("Fees are due monthly.", "Fees are due weekly.", "paragraph");
//!     let outcome = judge.classify(&request).await;
//!     assert_eq!(outcome.verdict.impact, ImpactLevel::Low);
//!     assert!(!outcome.is_fallback());
//! });
//! ```

mod cache;
mod error;
#[cfg(feature = "http")]
mod http;
mod judge;
mod resilient;
mod response;
mod retry;
mod serde_millis;
mod stub;
mod types;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use cache::{ContentKey, JudgeCache};
pub use error::JudgeError;
#[cfg(feature = "http")]
pub use http::{HttpJudge, HttpJudgeConfig, JudgeProvider};
pub use judge::SemanticJudge;
pub use resilient::{JudgePolicy, JudgeStats, ResilientJudge};
pub use response::{parse_verdict, parse_verdict_text, strip_code_fences, DEFAULT_CONFIDENCE};
pub use retry::{retry_async, RetryConfig, RetryResult};
pub use stub::StubJudge;
pub use types::{
    ImpactLevel, JudgeOutcome, JudgeRequest, JudgeVerdict, VerdictSource, FALLBACK_RATIONALE,
};

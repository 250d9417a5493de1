//! Structured document comparison with impact classification.
//!
//! `docdelta` takes two versions of a document as block sequences (the
//! Parser's output), aligns the blocks, computes word-level edits inside
//! modified blocks and rates every change CRITICAL, MEDIUM or LOW:
//!
//! 1. [`BlockAligner`] pairs blocks: exact-text LCS anchors, then a greedy
//!    similarity pass that also finds moves.
//! 2. [`diff_tokens`] builds a minimal word edit script for MODIFIED pairs.
//! 3. [`RuleEngine`] marks numeric, currency and percentage changes
//!    CRITICAL and cosmetic edits LOW without any external call.
//! 4. Everything else goes to a [`SemanticJudge`] through
//!    [`ResilientJudge`], bounded by `concurrency`, with timeouts, one retry
//!    and a MEDIUM fallback that marks the job `degraded`.
//!
//! ```no_run
//! use std::sync::Arc;
//! use docdelta::{Block, CompareOptions, StubJudge, compare};
//!
//! # async fn run() {
//! let old = vec![Block::paragraph("p1", "The deposit is $500.", 0)];
//! let new = vec![Block::paragraph("p1", "The deposit is $750.", 0)];
//! let comparison = compare(&old, &new, &CompareOptions::default(), Arc::new(StubJudge::default())).await;
//! assert_eq!(comparison.records[0].rationale, "numeric change");
//! # }
//! ```

pub mod classifier;
mod compare;
pub mod config;
mod error;
mod metrics;
mod options;
mod types;

pub use align::{AlignedPair, Alignment, Block, BlockAligner, BlockKind, ChangeType, SimilarityConfig};
pub use judge::{
    HttpJudge, HttpJudgeConfig, ImpactLevel, JudgeError, JudgePolicy, JudgeProvider, JudgeRequest,
    JudgeVerdict, ResilientJudge, RetryConfig, SemanticJudge, StubJudge,
};
pub use rules::{NumericChange, NumericKind, RuleConfig, RuleEngine, RuleVerdict};
pub use tokenize::{Token, TokenKind, tokenize};
pub use tokio_util::sync::CancellationToken;
pub use wordiff::{
    EditOp, EditScript, Span, WordChange, WordChangeKind, apply, diff_tokens, render_inline, word_changes,
};

pub use crate::classifier::ImpactClassifier;
pub use crate::compare::{compare, compare_with_cancel};
pub use crate::config::{ConfigLoadError, DocdeltaConfig, JudgeBackend};
pub use crate::error::{CompareError, InputError, Side, validate_blocks};
pub use crate::metrics::{CompareMetrics, set_compare_metrics};
pub use crate::options::CompareOptions;
pub use crate::types::{
    BlockRef, ChangeRecord, ClassifiedBy, Comparison, OverallStatus, RecordState, StateError,
    Stats, Summary,
};

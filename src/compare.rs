use std::sync::Arc;

use align::{Block, BlockAligner};
use judge::{ResilientJudge, SemanticJudge};
use rules::RuleEngine;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::classifier::ImpactClassifier;
use crate::error::{CompareError, validate_blocks};
use crate::metrics::MetricsSpan;
use crate::options::CompareOptions;
use crate::types::{ChangeRecord, ClassifiedBy, Comparison, Stats};

/// Compares two block sequences and classifies every change.
///
/// Never returns an error: invalid input produces a `failed` comparison,
/// judge trouble a `degraded` one.
pub async fn compare(
    old: &[Block],
    new: &[Block],
    options: &CompareOptions,
    judge: Arc<dyn SemanticJudge>,
) -> Comparison {
    compare_with_cancel(old, new, options, judge, CancellationToken::new()).await
}

/// [`compare`] that stops as soon as `cancel` fires. A cancelled job
/// aborts its in-flight judge calls and comes back `failed` with no
/// records.
pub async fn compare_with_cancel(
    old: &[Block],
    new: &[Block],
    options: &CompareOptions,
    judge: Arc<dyn SemanticJudge>,
    cancel: CancellationToken,
) -> Comparison {
    let job_id = options
        .job_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let span = info_span!("compare", job_id = %job_id);
    let metrics = MetricsSpan::start();

    let mut stats = Stats::default();
    let result = run(old, new, options, judge, &cancel, &mut stats)
        .instrument(span.clone())
        .await;

    let comparison = span.in_scope(|| match result {
        Ok(records) => {
            let comparison = Comparison::finished(job_id, records, stats);
            info!(
                status = comparison.overall_status.as_str(),
                records = comparison.records.len(),
                critical = comparison.summary.critical,
                judge_calls = stats.judge_calls,
                fallbacks = stats.fallbacks,
                "compare_finished"
            );
            comparison
        }
        Err(err) => {
            warn!(error = %err, "compare_failed");
            Comparison::failed(job_id, err, stats)
        }
    });

    if let Some(metrics) = metrics {
        metrics.finish(
            comparison.overall_status,
            comparison.records.len(),
            &comparison.stats,
        );
    }
    comparison
}

async fn run(
    old: &[Block],
    new: &[Block],
    options: &CompareOptions,
    judge: Arc<dyn SemanticJudge>,
    cancel: &CancellationToken,
    stats: &mut Stats,
) -> Result<Vec<ChangeRecord>, CompareError> {
    options.validate()?;
    validate_blocks(old, new)?;

    let started = Instant::now();
    let alignment = BlockAligner::new(options.similarity()).align(old, new);
    let classifier = ImpactClassifier::new(RuleEngine::new(options.rules), options.concurrency)
        .with_include_unchanged(options.include_unchanged)
        .with_document_type(options.document_type.clone())
        .with_word_context(options.word_context);
    let plan = classifier.plan(&alignment, old, new);
    stats.diffing_ms = started.elapsed().as_millis() as u64;

    info!(
        old_blocks = old.len(),
        new_blocks = new.len(),
        pairs = alignment.pairs.len(),
        moved = alignment.stats.moved,
        modified = alignment.stats.modified,
        escalations = plan.escalations(),
        "alignment_complete"
    );

    // Job-scoped: the memo cache dies with this judge.
    let judge = Arc::new(ResilientJudge::new(judge, options.judge_policy()));
    let records = classifier
        .resolve(plan, Arc::clone(&judge), cancel, stats)
        .await;

    let judge_stats = judge.stats();
    stats.judge_calls = judge_stats.calls;
    stats.cache_hits = judge_stats.cache_hits;

    let records = records?;
    stats.fallbacks = records
        .iter()
        .filter(|r| r.classified_by == ClassifiedBy::Fallback)
        .count() as u64;
    Ok(records)
}

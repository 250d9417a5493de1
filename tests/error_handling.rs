use std::sync::Arc;
use std::time::Duration;

use docdelta::{
    Block, CancellationToken, ClassifiedBy, CompareOptions, ImpactLevel, JudgeError,
    OverallStatus, RecordState, RetryConfig, SemanticJudge, StubJudge, compare,
    compare_with_cancel,
};
use judge::testing::{CountingJudge, FailingJudge, PendingJudge};

fn fast_retry() -> RetryConfig {
    RetryConfig::default()
        .with_base_delay(Duration::from_millis(1))
        .with_jitter(false)
}

fn one_edit() -> (Vec<Block>, Vec<Block>) {
    (
        vec![
            Block::paragraph("o0", "Preamble.", 0),
            Block::paragraph("o1", "The landlord repairs the roof.", 1),
        ],
        vec![
            Block::paragraph("n0", "Preamble.", 0),
            Block::paragraph("n1", "The tenant repairs the roof.", 1),
        ],
    )
}

#[tokio::test]
async fn judge_timeout_degrades_to_medium() {
    let (old, new) = one_edit();
    let judge = Arc::new(CountingJudge::new(PendingJudge));
    let options = CompareOptions::default()
        .with_judge_timeout(Duration::from_millis(50))
        .with_retry(fast_retry());

    let comparison = compare(&old, &new, &options, Arc::clone(&judge) as Arc<dyn SemanticJudge>).await;

    assert_eq!(comparison.overall_status, OverallStatus::Degraded);
    assert!(comparison.error.is_none());
    let record = &comparison.records[0];
    assert_eq!(record.impact, ImpactLevel::Medium);
    assert_eq!(record.classified_by, ClassifiedBy::Fallback);
    assert_eq!(record.rationale, "classification unavailable");
    assert_eq!(record.confidence, 0.0);
    assert_eq!(record.state, RecordState::Degraded);
    // First attempt plus one retry.
    assert_eq!(judge.calls(), 2);
    assert_eq!(comparison.stats.fallbacks, 1);
}

#[tokio::test]
async fn malformed_answers_degrade() {
    let (old, new) = one_edit();
    let judge = FailingJudge::new(JudgeError::MalformedResponse("not json".into()));
    let options = CompareOptions::default().with_retry(fast_retry());

    let comparison = compare(&old, &new, &options, Arc::new(judge)).await;

    assert_eq!(comparison.overall_status, OverallStatus::Degraded);
    assert_eq!(comparison.records[0].classified_by, ClassifiedBy::Fallback);
    assert_eq!(comparison.stats.judge_calls, 2);
}

#[tokio::test]
async fn rejected_requests_are_not_retried() {
    let (old, new) = one_edit();
    let judge = FailingJudge::new(JudgeError::Rejected {
        status: 401,
        message: "bad key".into(),
    });
    let options = CompareOptions::default().with_retry(fast_retry());

    let comparison = compare(&old, &new, &options, Arc::new(judge)).await;

    assert_eq!(comparison.overall_status, OverallStatus::Degraded);
    assert_eq!(comparison.stats.judge_calls, 1);
}

#[tokio::test]
async fn rule_decisions_survive_judge_failure() {
    let old = vec![
        Block::paragraph("o0", "The deposit is $500.", 0),
        Block::paragraph("o1", "Pets are not allowed.", 1),
    ];
    let new = vec![
        Block::paragraph("n0", "The deposit is $900.", 0),
        Block::paragraph("n1", "Small pets are allowed.", 1),
    ];
    let judge = FailingJudge::new(JudgeError::Transport("connection refused".into()));
    let options = CompareOptions::default()
        .with_retry(fast_retry())
        .with_similarity_threshold(0.4);

    let comparison = compare(&old, &new, &options, Arc::new(judge)).await;

    assert_eq!(comparison.overall_status, OverallStatus::Degraded);
    assert_eq!(comparison.records[0].impact, ImpactLevel::Critical);
    assert_eq!(comparison.records[0].classified_by, ClassifiedBy::Rule);
    assert_eq!(comparison.records[1].classified_by, ClassifiedBy::Fallback);
}

#[tokio::test]
async fn empty_input_fails() {
    let comparison = compare(&[], &[], &CompareOptions::default(), Arc::new(StubJudge::default())).await;

    assert_eq!(comparison.overall_status, OverallStatus::Failed);
    assert!(comparison.records.is_empty());
    assert!(comparison.error.is_some());
}

#[tokio::test]
async fn duplicate_block_ids_fail() {
    let old = vec![
        Block::paragraph("a", "One.", 0),
        Block::paragraph("a", "Two.", 1),
    ];
    let new = vec![Block::paragraph("b", "One.", 0)];

    let comparison = compare(&old, &new, &CompareOptions::default(), Arc::new(StubJudge::default())).await;

    assert!(comparison.is_failed());
    assert!(comparison.error.unwrap().contains("more than once"));
}

#[tokio::test]
async fn invalid_options_fail() {
    let (old, new) = one_edit();
    let options = CompareOptions::default().with_concurrency(0);

    let comparison = compare(&old, &new, &options, Arc::new(StubJudge::default())).await;

    assert!(comparison.is_failed());
    assert!(comparison.error.unwrap().contains("concurrency"));
}

#[tokio::test]
async fn cancellation_discards_records() {
    let (old, new) = one_edit();
    let judge = Arc::new(CountingJudge::new(PendingJudge));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.cancel();
    });

    let comparison = compare_with_cancel(
        &old,
        &new,
        &CompareOptions::default(),
        Arc::clone(&judge) as Arc<dyn SemanticJudge>,
        cancel,
    )
    .await;

    assert_eq!(comparison.overall_status, OverallStatus::Failed);
    assert!(comparison.records.is_empty());
    assert!(comparison.error.unwrap().contains("cancel"));
    assert_eq!(judge.calls(), 1);
}

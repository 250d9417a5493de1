//! Bounded fan-out to the judge, ordering under jitter and the per-job
//! memo cache.

use std::sync::Arc;
use std::time::Duration;

use docdelta::{
    Block, ChangeType, ClassifiedBy, CompareOptions, OverallStatus, SemanticJudge, StubJudge,
    compare,
};
use judge::testing::{CountingJudge, DelayJudge};

fn distinct_additions(count: usize) -> Vec<Block> {
    (0..count)
        .map(|i| {
            Block::paragraph(
                format!("n{i}"),
                format!("Clause {} introduces obligation {}.", letter(i), letter(i)),
                i,
            )
        })
        .collect()
}

fn letter(i: usize) -> char {
    (b'a' + i as u8) as char
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn judge_calls_respect_concurrency_limit() {
    let judge = Arc::new(CountingJudge::new(DelayJudge::new(
        Duration::from_millis(5),
        Duration::from_millis(20),
    )));
    let new = distinct_additions(10);

    let comparison = compare(
        &[],
        &new,
        &CompareOptions::default().with_concurrency(2),
        Arc::clone(&judge) as Arc<dyn SemanticJudge>,
    )
    .await;

    assert_eq!(comparison.overall_status, OverallStatus::Complete);
    assert_eq!(comparison.records.len(), 10);
    assert_eq!(judge.calls(), 10);
    assert!(judge.peak_in_flight() <= 2, "peak was {}", judge.peak_in_flight());
    assert!(judge.peak_in_flight() >= 1);
    assert_eq!(judge.in_flight(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn records_keep_document_order_under_jitter() {
    let judge = DelayJudge::new(Duration::from_millis(1), Duration::from_millis(30));
    let new = distinct_additions(12);

    let comparison = compare(
        &[],
        &new,
        &CompareOptions::default().with_concurrency(6),
        Arc::new(judge),
    )
    .await;

    assert_eq!(comparison.records.len(), 12);
    for (i, record) in comparison.records.iter().enumerate() {
        assert_eq!(record.change_id as usize, i + 1);
        assert_eq!(record.change, ChangeType::Added);
        assert_eq!(record.new_block.as_ref().unwrap().id, format!("n{i}"));
        assert_eq!(record.classified_by, ClassifiedBy::Llm);
        assert_eq!(record.rationale, "delayed judgment");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn duplicate_changes_share_one_judge_call() {
    let judge = Arc::new(CountingJudge::new(DelayJudge::new(
        Duration::from_millis(10),
        Duration::from_millis(10),
    )));
    let new: Vec<Block> = (0..4)
        .map(|i| Block::paragraph(format!("n{i}"), "The tenant may keep one small pet.", i))
        .collect();

    let comparison = compare(
        &[],
        &new,
        &CompareOptions::default().with_concurrency(4),
        Arc::clone(&judge) as Arc<dyn SemanticJudge>,
    )
    .await;

    assert_eq!(comparison.records.len(), 4);
    assert_eq!(judge.calls(), 1);
    assert_eq!(comparison.stats.judge_calls, 1);
    assert_eq!(comparison.stats.cache_hits, 3);
    assert_eq!(comparison.stats.escalated, 4);
    assert!(comparison
        .records
        .iter()
        .all(|r| r.classified_by == ClassifiedBy::Llm));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_jobs_do_not_share_state() {
    let old = vec![Block::paragraph("o0", "Deliveries happen weekly.", 0)];
    let new = vec![Block::paragraph("n0", "Deliveries happen monthly.", 0)];
    let judge: Arc<dyn SemanticJudge> = Arc::new(StubJudge::default());

    let jobs: Vec<_> = (0..8)
        .map(|i| {
            let (old, new, judge) = (old.clone(), new.clone(), Arc::clone(&judge));
            tokio::spawn(async move {
                let options = CompareOptions::default().with_job_id(format!("job-{i}"));
                compare(&old, &new, &options, judge).await
            })
        })
        .collect();

    for (i, job) in jobs.into_iter().enumerate() {
        let comparison = job.await.unwrap();
        assert_eq!(comparison.job_id, format!("job-{i}"));
        assert_eq!(comparison.records.len(), 1);
        // Each job has its own cache, so every job pays for one call.
        assert_eq!(comparison.stats.judge_calls, 1);
        assert_eq!(comparison.stats.cache_hits, 0);
    }
}

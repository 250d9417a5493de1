use std::sync::{Arc, Mutex};
use std::time::Duration;

use docdelta::{
    Block, CompareMetrics, CompareOptions, OverallStatus, Stats, StubJudge, compare,
    set_compare_metrics,
};

#[derive(Default)]
struct Recorder {
    jobs: Mutex<Vec<(OverallStatus, usize)>>,
    judge_calls: Mutex<u64>,
}

impl CompareMetrics for Recorder {
    fn record_compare(&self, _latency: Duration, status: OverallStatus, records: usize) {
        self.jobs.lock().unwrap().push((status, records));
    }

    fn record_judge(&self, stats: &Stats) {
        *self.judge_calls.lock().unwrap() += stats.judge_calls;
    }
}

#[tokio::test]
async fn recorder_sees_every_job() {
    let recorder = Arc::new(Recorder::default());
    set_compare_metrics(Some(recorder.clone()));

    let old = vec![Block::paragraph("o0", "Meetings are held on Mondays.", 0)];
    let new = vec![Block::paragraph("n0", "Meetings are held on Fridays.", 0)];
    let options = CompareOptions::default();
    compare(&old, &new, &options, Arc::new(StubJudge::default())).await;
    compare(&[], &[], &options, Arc::new(StubJudge::default())).await;

    set_compare_metrics(None);
    compare(&old, &new, &options, Arc::new(StubJudge::default())).await;

    let jobs = recorder.jobs.lock().unwrap().clone();
    assert_eq!(
        jobs,
        vec![(OverallStatus::Complete, 1), (OverallStatus::Failed, 0)]
    );
    assert_eq!(*recorder.judge_calls.lock().unwrap(), 1);
}

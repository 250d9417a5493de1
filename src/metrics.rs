use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use crate::types::{OverallStatus, Stats};

/// Metrics observer for compare jobs.
pub trait CompareMetrics: Send + Sync {
    fn record_compare(&self, latency: Duration, status: OverallStatus, records: usize);
    fn record_judge(&self, stats: &Stats);
}

/// Install or clear the global compare metrics recorder.
pub fn set_compare_metrics(recorder: Option<Arc<dyn CompareMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn CompareMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn CompareMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn CompareMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

pub(crate) struct MetricsSpan {
    recorder: Arc<dyn CompareMetrics>,
    start: Instant,
}

impl MetricsSpan {
    pub(crate) fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    pub(crate) fn finish(self, status: OverallStatus, records: usize, stats: &Stats) {
        self.recorder
            .record_compare(self.start.elapsed(), status, records);
        self.recorder.record_judge(stats);
    }
}

use align::{BlockKind, ChangeType};
use judge::ImpactLevel;
use rules::NumericChange;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wordiff::{EditScript, WordChange};

/// Who decided a record's impact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ClassifiedBy {
    Rule,
    Llm,
    Fallback,
}

/// Outcome of a whole compare job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    /// Every record was classified by a rule or by the judge.
    Complete,
    /// At least one record carries the fallback verdict.
    Degraded,
    /// Invalid input or cancellation; no records.
    Failed,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Complete => "complete",
            OverallStatus::Degraded => "degraded",
            OverallStatus::Failed => "failed",
        }
    }
}

/// Classification lifecycle of one record.
///
/// `pending → rule-evaluated → {resolved | escalated}`, then
/// `escalated → {resolved | degraded}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RecordState {
    Pending,
    RuleEvaluated,
    Escalated,
    Resolved,
    Degraded,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("illegal record transition {from:?} -> {to:?}")]
pub struct StateError {
    pub from: RecordState,
    pub to: RecordState,
}

impl RecordState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RecordState::Resolved | RecordState::Degraded)
    }

    pub fn advance(self, to: RecordState) -> Result<RecordState, StateError> {
        use RecordState::*;
        match (self, to) {
            (Pending, RuleEvaluated)
            | (RuleEvaluated, Resolved)
            | (RuleEvaluated, Escalated)
            | (Escalated, Resolved)
            | (Escalated, Degraded) => Ok(to),
            (from, to) => Err(StateError { from, to }),
        }
    }
}

/// Identity of a block in one of the input documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockRef {
    pub id: String,
    pub position: usize,
}

/// One classified change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeRecord {
    /// 1-based, in document order.
    pub change_id: u32,
    #[serde(rename = "type")]
    pub change: ChangeType,
    pub block_kind: BlockKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_block: Option<BlockRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_block: Option<BlockRef>,
    /// Word-level edits, MODIFIED records only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_script: Option<EditScript>,
    /// Inline `[-old-] [+new+]` rendering of `edit_script`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_text: Option<String>,
    /// The non-whitespace edits of `edit_script` with surrounding words.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub word_changes: Vec<WordChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    pub impact: ImpactLevel,
    pub rationale: String,
    pub classified_by: ClassifiedBy,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub numeric_changes: Vec<NumericChange>,
    pub state: RecordState,
}

/// Impact counts over the returned records.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub critical: usize,
    pub medium: usize,
    pub low: usize,
}

impl Summary {
    pub fn of(records: &[ChangeRecord]) -> Self {
        let mut summary = Summary {
            total: records.len(),
            ..Summary::default()
        };
        for record in records {
            match record.impact {
                ImpactLevel::Critical => summary.critical += 1,
                ImpactLevel::Medium => summary.medium += 1,
                ImpactLevel::Low => summary.low += 1,
            }
        }
        summary
    }
}

/// Timing and judge bookkeeping for one job.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stats {
    /// Alignment, word diffs and rule evaluation.
    pub diffing_ms: u64,
    /// Wall time spent waiting on escalations.
    pub classification_ms: u64,
    /// Sum of per-record judge latency, retries and backoff included.
    pub judge_ms: u64,
    /// Attempts sent to the judge.
    pub judge_calls: u64,
    pub cache_hits: u64,
    /// Records handed to the judge.
    pub escalated: u64,
    pub fallbacks: u64,
}

/// Result of one compare job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comparison {
    pub job_id: String,
    pub records: Vec<ChangeRecord>,
    pub overall_status: OverallStatus,
    pub summary: Summary,
    pub stats: Stats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Comparison {
    pub(crate) fn finished(job_id: String, records: Vec<ChangeRecord>, stats: Stats) -> Self {
        let degraded = records
            .iter()
            .any(|r| r.classified_by == ClassifiedBy::Fallback);
        Self {
            job_id,
            summary: Summary::of(&records),
            records,
            overall_status: if degraded {
                OverallStatus::Degraded
            } else {
                OverallStatus::Complete
            },
            stats,
            error: None,
        }
    }

    /// A job that produced no records, e.g. because the input could not
    /// be parsed.
    pub fn failed(job_id: String, error: impl ToString, stats: Stats) -> Self {
        Self {
            job_id,
            records: Vec::new(),
            overall_status: OverallStatus::Failed,
            summary: Summary::default(),
            stats,
            error: Some(error.to_string()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.overall_status == OverallStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_transitions() {
        let state = RecordState::Pending
            .advance(RecordState::RuleEvaluated)
            .and_then(|s| s.advance(RecordState::Escalated))
            .and_then(|s| s.advance(RecordState::Degraded))
            .unwrap();
        assert!(state.is_terminal());

        let state = RecordState::Pending
            .advance(RecordState::RuleEvaluated)
            .and_then(|s| s.advance(RecordState::Resolved))
            .unwrap();
        assert_eq!(state, RecordState::Resolved);
    }

    #[test]
    fn illegal_transitions() {
        assert!(RecordState::Pending.advance(RecordState::Resolved).is_err());
        assert!(RecordState::RuleEvaluated.advance(RecordState::Degraded).is_err());
        assert!(RecordState::Resolved.advance(RecordState::Escalated).is_err());
        let err = RecordState::Degraded
            .advance(RecordState::Resolved)
            .unwrap_err();
        assert_eq!(err.from, RecordState::Degraded);
    }

    #[test]
    fn wire_names() {
        assert_eq!(serde_json::to_value(ClassifiedBy::Llm).unwrap(), "llm");
        assert_eq!(serde_json::to_value(OverallStatus::Degraded).unwrap(), "degraded");
        assert_eq!(
            serde_json::to_value(RecordState::RuleEvaluated).unwrap(),
            "rule-evaluated"
        );
    }

    #[test]
    fn failed_comparison_has_no_records() {
        let cmp = Comparison::failed("job".into(), "comparison cancelled", Stats::default());
        assert!(cmp.is_failed());
        assert!(cmp.records.is_empty());
        assert_eq!(cmp.error.as_deref(), Some("comparison cancelled"));
    }
}

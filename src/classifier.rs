//! Per-pair impact classification: rules first, the judge for the rest.

use std::sync::Arc;

use align::{AlignedPair, Alignment, Block, BlockKind, ChangeType};
use judge::{FALLBACK_RATIONALE, ImpactLevel, JudgeOutcome, JudgeRequest, ResilientJudge, VerdictSource};
use rules::{NUMERIC_CHANGE, RuleEngine, RuleVerdict};
use tokenize::is_blank;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use wordiff::{DEFAULT_CONTEXT_WORDS, diff_tokens, render_inline, word_changes};

use crate::error::CompareError;
use crate::types::{BlockRef, ChangeRecord, ClassifiedBy, RecordState, Stats};

pub const UNCHANGED: &str = "unchanged";
pub const MOVED_WITHOUT_CHANGE: &str = "moved without textual change";
pub const EMPTY_BLOCK: &str = "empty block";
pub const COSMETIC_CHANGE: &str = "cosmetic change";

/// Confidence reported for rule decisions.
const RULE_CONFIDENCE: f64 = 1.0;

/// A record after the rule pass. Escalated drafts carry the request for
/// the judge and hold the fallback verdict until an answer arrives.
#[derive(Debug, Clone)]
pub struct Draft {
    pub record: ChangeRecord,
    pub request: Option<JudgeRequest>,
}

/// Output of [`ImpactClassifier::plan`], in document order.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    drafts: Vec<Draft>,
}

impl Plan {
    pub fn drafts(&self) -> &[Draft] {
        &self.drafts
    }

    /// Drafts waiting on the judge.
    pub fn escalations(&self) -> usize {
        self.drafts.iter().filter(|d| d.request.is_some()).count()
    }
}

enum Decision {
    Rule(ImpactLevel, &'static str),
    Escalate(JudgeRequest),
}

/// Classifies aligned pairs by business impact.
#[derive(Debug, Clone)]
pub struct ImpactClassifier {
    rules: RuleEngine,
    concurrency: usize,
    include_unchanged: bool,
    document_type: Option<String>,
    word_context: usize,
}

impl ImpactClassifier {
    pub fn new(rules: RuleEngine, concurrency: usize) -> Self {
        Self {
            rules,
            concurrency: concurrency.max(1),
            include_unchanged: false,
            document_type: None,
            word_context: DEFAULT_CONTEXT_WORDS,
        }
    }

    pub fn with_include_unchanged(mut self, include: bool) -> Self {
        self.include_unchanged = include;
        self
    }

    pub fn with_document_type(mut self, document_type: Option<String>) -> Self {
        self.document_type = document_type;
        self
    }

    /// Words of context kept on each side of a reported word change.
    pub fn with_word_context(mut self, words: usize) -> Self {
        self.word_context = words;
        self
    }

    /// Synchronous rule pass over every pair. UNCHANGED pairs are dropped
    /// unless `include_unchanged` is set.
    pub fn plan(&self, alignment: &Alignment, old: &[Block], new: &[Block]) -> Plan {
        let drafts = alignment
            .pairs
            .iter()
            .filter(|pair| self.include_unchanged || pair.change != ChangeType::Unchanged)
            .map(|pair| self.draft(pair, alignment, old, new))
            .collect();
        Plan { drafts }
    }

    fn draft(&self, pair: &AlignedPair, alignment: &Alignment, old: &[Block], new: &[Block]) -> Draft {
        let old_block = pair.old.map(|i| &old[i]);
        let new_block = pair.new.map(|i| &new[i]);
        let kind = new_block
            .or(old_block)
            .map(|b| b.kind)
            .unwrap_or_default();

        let mut record = ChangeRecord {
            change_id: 0,
            change: pair.change,
            block_kind: kind,
            old_block: old_block.map(block_ref),
            new_block: new_block.map(block_ref),
            edit_script: None,
            diff_text: None,
            word_changes: Vec::new(),
            similarity: pair.similarity,
            impact: ImpactLevel::Low,
            rationale: String::new(),
            classified_by: ClassifiedBy::Rule,
            confidence: RULE_CONFIDENCE,
            numeric_changes: Vec::new(),
            state: RecordState::Pending,
        };
        transition(&mut record, RecordState::RuleEvaluated);

        let decision = match (pair.change, pair.old, pair.new) {
            (ChangeType::Unchanged, ..) => Decision::Rule(ImpactLevel::Low, UNCHANGED),
            (ChangeType::Moved, ..) => Decision::Rule(ImpactLevel::Low, MOVED_WITHOUT_CHANGE),
            (ChangeType::Modified, Some(o), Some(n)) => {
                let (old_tokens, new_tokens) = (alignment.old_tokens(o), alignment.new_tokens(n));
                let script = diff_tokens(old_tokens, new_tokens);
                record.diff_text = Some(render_inline(&script, old_tokens, new_tokens));
                record.word_changes = word_changes(&script, old_tokens, new_tokens, self.word_context);

                let decision = match self.rules.evaluate(&script, old_tokens, new_tokens) {
                    RuleVerdict::Critical { changes } => {
                        record.numeric_changes = changes;
                        Decision::Rule(ImpactLevel::Critical, NUMERIC_CHANGE)
                    }
                    RuleVerdict::Inconclusive if self.rules.is_trivial(&script, old_tokens, new_tokens) => {
                        Decision::Rule(ImpactLevel::Low, COSMETIC_CHANGE)
                    }
                    RuleVerdict::Inconclusive => {
                        Decision::Escalate(self.request(old_block, new_block, kind))
                    }
                };
                record.edit_script = Some(script);
                decision
            }
            _ => {
                let text = new_block.or(old_block).map(|b| b.text.as_str()).unwrap_or("");
                if is_blank(text) {
                    Decision::Rule(ImpactLevel::Low, EMPTY_BLOCK)
                } else {
                    Decision::Escalate(self.request(old_block, new_block, kind))
                }
            }
        };

        match decision {
            Decision::Rule(impact, rationale) => {
                record.impact = impact;
                record.rationale = rationale.to_string();
                transition(&mut record, RecordState::Resolved);
                Draft {
                    record,
                    request: None,
                }
            }
            Decision::Escalate(request) => {
                record.impact = ImpactLevel::Medium;
                record.rationale = FALLBACK_RATIONALE.to_string();
                record.classified_by = ClassifiedBy::Fallback;
                record.confidence = 0.0;
                transition(&mut record, RecordState::Escalated);
                Draft {
                    record,
                    request: Some(request),
                }
            }
        }
    }

    fn request(&self, old: Option<&Block>, new: Option<&Block>, kind: BlockKind) -> JudgeRequest {
        let mut request = JudgeRequest::new(
            old.map(|b| b.text.as_str()).unwrap_or_default(),
            new.map(|b| b.text.as_str()).unwrap_or_default(),
            kind.as_str(),
        );
        request.document_type = self.document_type.clone();
        request
    }

    /// Sends escalated drafts to the judge, at most `concurrency` at a
    /// time, and returns the finished records numbered in document order.
    ///
    /// Cancellation aborts every in-flight call and discards the plan.
    pub async fn resolve(
        &self,
        plan: Plan,
        judge: Arc<ResilientJudge>,
        cancel: &CancellationToken,
        stats: &mut Stats,
    ) -> Result<Vec<ChangeRecord>, CompareError> {
        let mut drafts = plan.drafts;
        if cancel.is_cancelled() {
            return Err(CompareError::Cancelled);
        }

        let started = Instant::now();
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (slot, draft) in drafts.iter_mut().enumerate() {
            let Some(request) = draft.request.take() else {
                continue;
            };
            stats.escalated += 1;
            let judge = Arc::clone(&judge);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                // The semaphore is never closed, so this always yields a permit.
                let _permit = permits.acquire_owned().await.ok();
                let outcome = judge.classify(&request).await;
                (slot, outcome)
            });
        }

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(in_flight = tasks.len(), "classification_cancelled");
                    tasks.abort_all();
                    return Err(CompareError::Cancelled);
                }
                joined = tasks.join_next() => match joined {
                    Some(Ok((slot, outcome))) => {
                        stats.judge_ms += outcome.elapsed.as_millis() as u64;
                        apply(&mut drafts[slot].record, outcome);
                    }
                    Some(Err(err)) => warn!(error = %err, "judge_task_failed"),
                    None => break,
                },
            }
        }
        stats.classification_ms = started.elapsed().as_millis() as u64;

        Ok(drafts
            .into_iter()
            .zip(1..)
            .map(|(draft, change_id)| {
                let mut record = draft.record;
                if record.state == RecordState::Escalated {
                    // The task died before answering; keep the fallback verdict.
                    transition(&mut record, RecordState::Degraded);
                }
                record.change_id = change_id;
                record
            })
            .collect())
    }
}

fn apply(record: &mut ChangeRecord, outcome: JudgeOutcome) {
    record.impact = outcome.verdict.impact;
    record.rationale = outcome.verdict.rationale;
    record.confidence = outcome.verdict.confidence;
    match outcome.source {
        VerdictSource::Judge => {
            record.classified_by = ClassifiedBy::Llm;
            transition(record, RecordState::Resolved);
        }
        VerdictSource::Fallback => {
            record.classified_by = ClassifiedBy::Fallback;
            transition(record, RecordState::Degraded);
        }
    }
}

fn transition(record: &mut ChangeRecord, to: RecordState) {
    match record.state.advance(to) {
        Ok(next) => record.state = next,
        Err(err) => {
            debug!(error = %err, change = record.change.as_str(), "record_transition_rejected");
            debug_assert!(false, "{err}");
        }
    }
}

fn block_ref(block: &Block) -> BlockRef {
    BlockRef {
        id: block.id.clone(),
        position: block.position,
    }
}

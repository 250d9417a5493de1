use serde::{Deserialize, Serialize};
use tokenize::Token;
use wordiff::EditScript;

use crate::numeric::{find_numbers, NumericChange, NumericKind, NumericOccurrence};
use crate::trivial::is_trivial_within;

/// Rationale attached to every numeric verdict.
pub const NUMERIC_CHANGE: &str = "numeric change";

/// Tunables for the rule pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RuleConfig {
    /// Character edits an op may make and still count as cosmetic.
    pub trivial_edit_distance: usize,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            trivial_edit_distance: 1,
        }
    }
}

/// Outcome of the deterministic rule pass for one block pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleVerdict {
    /// A touched number changed value; always CRITICAL.
    Critical { changes: Vec<NumericChange> },
    /// No rule fired. The caller decides what happens next.
    Inconclusive,
}

impl RuleVerdict {
    pub fn is_critical(&self) -> bool {
        matches!(self, RuleVerdict::Critical { .. })
    }

    pub fn rationale(&self) -> Option<&'static str> {
        match self {
            RuleVerdict::Critical { .. } => Some(NUMERIC_CHANGE),
            RuleVerdict::Inconclusive => None,
        }
    }
}

/// Deterministic numeric rules over a word-level edit script.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine {
    config: RuleConfig,
}

impl RuleEngine {
    pub fn new(config: RuleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Fires when the numbers touched by edits differ between the two sides.
    ///
    /// Numbers touched on the old side are cancelled against numbers touched
    /// on the new side by value, so reformatting (`$100` to `$100.00`) does
    /// not fire while `$100` to `$150`, or a number inserted from nothing,
    /// does.
    pub fn evaluate(&self, script: &EditScript, old: &[Token], new: &[Token]) -> RuleVerdict {
        let old_numbers = find_numbers(old);
        let new_numbers = find_numbers(new);

        let mut old_touched = vec![false; old_numbers.len()];
        let mut new_touched = vec![false; new_numbers.len()];

        for op in script.changes() {
            if let Some(span) = op.old_span() {
                mark(&old_numbers, &mut old_touched, span.range());
            }
            if let Some(span) = op.new_span() {
                mark(&new_numbers, &mut new_touched, span.range());
            }
        }

        let mut removed: Vec<&NumericOccurrence> = pick(&old_numbers, &old_touched);
        let mut added: Vec<&NumericOccurrence> = pick(&new_numbers, &new_touched);

        removed.retain(|occ| {
            let key = occ.key();
            match added.iter().position(|other| other.key() == key) {
                Some(pos) => {
                    added.remove(pos);
                    false
                }
                None => true,
            }
        });

        if removed.is_empty() && added.is_empty() {
            return RuleVerdict::Inconclusive;
        }

        let pairs = removed.len().max(added.len());
        let changes = (0..pairs)
            .map(|i| {
                let before = removed.get(i);
                let after = added.get(i);
                let kind = after
                    .or(before)
                    .map(|occ| occ.kind)
                    .unwrap_or(NumericKind::Number);
                NumericChange {
                    kind,
                    old: before.map(|occ| occ.text.clone()),
                    new: after.map(|occ| occ.text.clone()),
                }
            })
            .collect();

        RuleVerdict::Critical { changes }
    }

    /// Cosmetic-edit check using the configured character allowance.
    pub fn is_trivial(&self, script: &EditScript, old: &[Token], new: &[Token]) -> bool {
        is_trivial_within(script, old, new, self.config.trivial_edit_distance)
    }
}

fn mark(numbers: &[NumericOccurrence], touched: &mut [bool], span: std::ops::Range<usize>) {
    for (occ, flag) in numbers.iter().zip(touched.iter_mut()) {
        if occ.overlaps(span.clone()) {
            *flag = true;
        }
    }
}

fn pick<'a>(numbers: &'a [NumericOccurrence], touched: &[bool]) -> Vec<&'a NumericOccurrence> {
    numbers
        .iter()
        .zip(touched)
        .filter(|(_, t)| **t)
        .map(|(occ, _)| occ)
        .collect()
}

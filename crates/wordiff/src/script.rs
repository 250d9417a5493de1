use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Half-open range of token indices.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start must not exceed end");
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub(crate) fn extend(&mut self, by: usize) {
        self.end += by;
    }
}

/// One step of an edit script. Spans index into the old and new token
/// sequences respectively.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp {
    Equal { old: Span, new: Span },
    Insert { new: Span },
    Delete { old: Span },
    Substitute { old: Span, new: Span },
}

impl EditOp {
    pub fn old_span(&self) -> Option<Span> {
        match self {
            EditOp::Equal { old, .. } | EditOp::Delete { old } | EditOp::Substitute { old, .. } => {
                Some(*old)
            }
            EditOp::Insert { .. } => None,
        }
    }

    pub fn new_span(&self) -> Option<Span> {
        match self {
            EditOp::Equal { new, .. } | EditOp::Insert { new } | EditOp::Substitute { new, .. } => {
                Some(*new)
            }
            EditOp::Delete { .. } => None,
        }
    }

    pub fn is_equal(&self) -> bool {
        matches!(self, EditOp::Equal { .. })
    }
}

/// Ordered sequence of [`EditOp`]s. Old spans are contiguous and cover the
/// whole old sequence; the same holds for new spans.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct EditScript {
    ops: Vec<EditOp>,
}

impl EditScript {
    pub(crate) fn from_ops(ops: Vec<EditOp>) -> Self {
        Self { ops }
    }

    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EditOp> {
        self.ops.iter()
    }

    /// Non-`Equal` operations, in order.
    pub fn changes(&self) -> impl Iterator<Item = &EditOp> {
        self.ops.iter().filter(|op| !op.is_equal())
    }

    /// Number of non-`Equal` operations.
    pub fn edit_count(&self) -> usize {
        self.changes().count()
    }

    pub fn substitute_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, EditOp::Substitute { .. }))
            .count()
    }

    /// True when the script contains no edits at all.
    pub fn is_identity(&self) -> bool {
        self.ops.iter().all(EditOp::is_equal)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl<'a> IntoIterator for &'a EditScript {
    type Item = &'a EditOp;
    type IntoIter = std::slice::Iter<'a, EditOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

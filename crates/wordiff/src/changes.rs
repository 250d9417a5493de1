//! Reviewer-facing list of word changes with surrounding context.

use serde::{Deserialize, Serialize};
use tokenize::{collapse_whitespace, Token};

use crate::script::{EditOp, EditScript, Span};

/// Context words kept on each side of a change by default.
pub const DEFAULT_CONTEXT_WORDS: usize = 2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WordChangeKind {
    Added,
    Deleted,
    Replaced,
}

/// One changed run of words. Texts are whitespace-collapsed; an empty
/// `old_text` means an insertion, an empty `new_text` a deletion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WordChange {
    pub change_type: WordChangeKind,
    pub old_text: String,
    pub new_text: String,
    /// Up to `context` words before the change, from the side it reads on:
    /// the new text for insertions, the old text otherwise.
    pub context_before: String,
    pub context_after: String,
}

/// Lists the non-whitespace edits of `script`, each with up to `context`
/// words on either side. Edits that only touch spacing are skipped.
pub fn word_changes(
    script: &EditScript,
    old: &[Token],
    new: &[Token],
    context: usize,
) -> Vec<WordChange> {
    script
        .changes()
        .filter_map(|op| {
            let (change_type, old_span, new_span) = match *op {
                EditOp::Equal { .. } => return None,
                EditOp::Insert { new: to } => (WordChangeKind::Added, None, Some(to)),
                EditOp::Delete { old: from } => (WordChangeKind::Deleted, Some(from), None),
                EditOp::Substitute { old: from, new: to } => {
                    (WordChangeKind::Replaced, Some(from), Some(to))
                }
            };
            let old_text = old_span.map(|s| text_of(old, s)).unwrap_or_default();
            let new_text = new_span.map(|s| text_of(new, s)).unwrap_or_default();
            if old_text.is_empty() && new_text.is_empty() {
                return None;
            }

            let (tokens, span) = match old_span {
                Some(span) => (old, span),
                None => (new, new_span?),
            };
            let lead = &tokens[before(tokens, span, context)..span.start];
            let trail = &tokens[span.end..after(tokens, span, context)];
            Some(WordChange {
                change_type,
                old_text,
                new_text,
                context_before: collapse_whitespace(&joined(lead)),
                context_after: collapse_whitespace(&joined(trail)),
            })
        })
        .collect()
}

fn text_of(tokens: &[Token], span: Span) -> String {
    collapse_whitespace(&joined(&tokens[span.range()]))
}

fn joined(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

/// Start index covering `words` non-whitespace tokens before `span`.
fn before(tokens: &[Token], span: Span, words: usize) -> usize {
    let mut seen = 0;
    let mut start = span.start;
    while start > 0 && seen < words {
        start -= 1;
        if !tokens[start].is_whitespace() {
            seen += 1;
        }
    }
    start
}

/// End index covering `words` non-whitespace tokens after `span`.
fn after(tokens: &[Token], span: Span, words: usize) -> usize {
    let mut seen = 0;
    let mut end = span.end;
    while end < tokens.len() && seen < words {
        if !tokens[end].is_whitespace() {
            seen += 1;
        }
        end += 1;
    }
    end
}

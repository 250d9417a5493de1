use tokenize::Token;
use wordiff::{edit_distance_by, EditOp, EditScript, Span};

fn joined(tokens: &[Token], span: Option<Span>) -> String {
    span.map(|s| tokens[s.range()].iter().map(|t| t.text.as_str()).collect())
        .unwrap_or_default()
}

/// Lowercased alphanumeric characters only.
fn letters(text: &str) -> Vec<char> {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// True when a single op changes only case, whitespace or punctuation, or
/// at most `max_distance` characters of the remaining letters and digits.
pub fn is_trivial_op(op: &EditOp, old: &[Token], new: &[Token], max_distance: usize) -> bool {
    if op.is_equal() {
        return true;
    }
    let removed = letters(&joined(old, op.old_span()));
    let added = letters(&joined(new, op.new_span()));
    if removed == added {
        return true;
    }
    removed.len().abs_diff(added.len()) <= max_distance
        && edit_distance_by(&removed, &added, |a, b| a == b) <= max_distance
}

/// True when every edit in the script is cosmetic (see [`is_trivial_op`]
/// with a one-character allowance).
pub fn is_trivial_edit(script: &EditScript, old: &[Token], new: &[Token]) -> bool {
    is_trivial_within(script, old, new, 1)
}

pub(crate) fn is_trivial_within(
    script: &EditScript,
    old: &[Token],
    new: &[Token],
    max_distance: usize,
) -> bool {
    script
        .changes()
        .all(|op| is_trivial_op(op, old, new, max_distance))
}

use thiserror::Error;
use tokenize::Token;

use crate::script::{EditOp, EditScript, Span};

/// Structural problems found while replaying a script.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApplyError {
    #[error("old span {found:?} does not continue at token {expected}")]
    OldGap { expected: usize, found: Span },
    #[error("new span {found:?} does not continue at token {expected}")]
    NewGap { expected: usize, found: Span },
    #[error("span {span:?} exceeds sequence length {len}")]
    OutOfBounds { span: Span, len: usize },
    #[error("equal spans differ in length ({old} vs {new})")]
    LengthMismatch { old: usize, new: usize },
    #[error("tokens at old {old_index} and new {new_index} are marked equal but differ")]
    NotEqual { old_index: usize, new_index: usize },
    #[error("script covers {covered} of {len} {side} tokens")]
    Incomplete {
        side: &'static str,
        covered: usize,
        len: usize,
    },
}

/// Replays `script` against `old` and rebuilds the new token sequence.
///
/// Inserted and substituted tokens are taken from `new`; equal runs are
/// copied from `old` after checking they really match. Offsets are
/// recomputed, so for a script produced by [`crate::diff_tokens`] the
/// result equals `new` exactly.
pub fn apply(script: &EditScript, old: &[Token], new: &[Token]) -> Result<Vec<Token>, ApplyError> {
    let mut out: Vec<Token> = Vec::with_capacity(new.len());
    let mut old_cursor = 0usize;
    let mut new_cursor = 0usize;
    let mut offset = 0usize;

    let mut push = |out: &mut Vec<Token>, token: &Token| {
        let end = offset + token.text.len();
        out.push(Token {
            text: token.text.clone(),
            kind: token.kind,
            start: offset,
            end,
        });
        offset = end;
    };

    for op in script {
        if let Some(span) = op.old_span() {
            check(span, old.len(), old_cursor, |expected, found| ApplyError::OldGap {
                expected,
                found,
            })?;
            old_cursor = span.end;
        }
        if let Some(span) = op.new_span() {
            check(span, new.len(), new_cursor, |expected, found| ApplyError::NewGap {
                expected,
                found,
            })?;
            new_cursor = span.end;
        }

        match *op {
            EditOp::Equal { old: o, new: n } => {
                if o.len() != n.len() {
                    return Err(ApplyError::LengthMismatch {
                        old: o.len(),
                        new: n.len(),
                    });
                }
                for (oi, ni) in o.range().zip(n.range()) {
                    if old[oi].text != new[ni].text {
                        return Err(ApplyError::NotEqual {
                            old_index: oi,
                            new_index: ni,
                        });
                    }
                    push(&mut out, &old[oi]);
                }
            }
            EditOp::Insert { new: n } | EditOp::Substitute { new: n, .. } => {
                for token in &new[n.range()] {
                    push(&mut out, token);
                }
            }
            EditOp::Delete { .. } => {}
        }
    }

    if old_cursor != old.len() {
        return Err(ApplyError::Incomplete {
            side: "old",
            covered: old_cursor,
            len: old.len(),
        });
    }
    if new_cursor != new.len() {
        return Err(ApplyError::Incomplete {
            side: "new",
            covered: new_cursor,
            len: new.len(),
        });
    }

    Ok(out)
}

fn check(
    span: Span,
    len: usize,
    cursor: usize,
    gap: impl FnOnce(usize, Span) -> ApplyError,
) -> Result<(), ApplyError> {
    if span.start > span.end || span.end > len {
        return Err(ApplyError::OutOfBounds { span, len });
    }
    if span.start != cursor {
        return Err(gap(cursor, span));
    }
    Ok(())
}

/// Renders the script as inline markup: unchanged text verbatim, removed
/// text as `[-old-]` and added text as `[+new+]`.
///
/// A substitution renders as `[-old-] [+new+]`. Whitespace at the edges of a
/// changed run is kept outside the brackets so the markup reads naturally.
pub fn render_inline(script: &EditScript, old: &[Token], new: &[Token]) -> String {
    let mut out = String::new();

    for op in script {
        match *op {
            EditOp::Equal { old: o, .. } => out.push_str(&joined(old, o)),
            EditOp::Delete { old: o } => wrap(&mut out, &joined(old, o), "[-", "-]"),
            EditOp::Insert { new: n } => wrap(&mut out, &joined(new, n), "[+", "+]"),
            EditOp::Substitute { old: o, new: n } => {
                let removed = joined(old, o);
                let added = joined(new, n);
                if removed.trim().is_empty() && added.trim().is_empty() {
                    // Whitespace-only substitution: show the new spacing.
                    out.push_str(&added);
                    continue;
                }
                wrap(&mut out, &removed, "[-", "-]");
                if !out.ends_with(char::is_whitespace) {
                    out.push(' ');
                }
                wrap(&mut out, &added, "[+", "+]");
            }
        }
    }

    out
}

fn joined(tokens: &[Token], span: Span) -> String {
    tokens[span.range()].iter().map(|t| t.text.as_str()).collect()
}

fn wrap(out: &mut String, text: &str, open: &str, close: &str) {
    let core = text.trim();
    if core.is_empty() {
        out.push_str(text);
        return;
    }
    let lead = &text[..text.len() - text.trim_start().len()];
    let trail = &text[text.trim_end().len()..];
    out.push_str(lead);
    out.push_str(open);
    out.push_str(core);
    out.push_str(close);
    out.push_str(trail);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff_tokens;
    use tokenize::tokenize;

    #[test]
    fn apply_reproduces_new_sequence() {
        let old = tokenize("Payment due within 30 days of invoice.");
        let new = tokenize("Payment is due within 45 business days of the invoice!");
        let script = diff_tokens(&old, &new);
        assert_eq!(apply(&script, &old, &new).unwrap(), new);
    }

    #[test]
    fn apply_rejects_gaps() {
        let old = tokenize("a b");
        let new = tokenize("a b");
        let script = EditScript::from_ops(vec![EditOp::Equal {
            old: Span::new(1, 3),
            new: Span::new(1, 3),
        }]);
        assert_eq!(
            apply(&script, &old, &new),
            Err(ApplyError::OldGap {
                expected: 0,
                found: Span::new(1, 3)
            })
        );
    }

    #[test]
    fn apply_rejects_false_equal() {
        let old = tokenize("a");
        let new = tokenize("b");
        let script = EditScript::from_ops(vec![EditOp::Equal {
            old: Span::new(0, 1),
            new: Span::new(0, 1),
        }]);
        assert!(matches!(
            apply(&script, &old, &new),
            Err(ApplyError::NotEqual { .. })
        ));
    }

    #[test]
    fn apply_rejects_partial_cover() {
        let old = tokenize("a b");
        let new = tokenize("a");
        let script = EditScript::from_ops(vec![EditOp::Equal {
            old: Span::new(0, 1),
            new: Span::new(0, 1),
        }]);
        assert_eq!(
            apply(&script, &old, &new),
            Err(ApplyError::Incomplete {
                side: "old",
                covered: 1,
                len: 3
            })
        );
    }

    #[test]
    fn render_substitution() {
        let old = tokenize("pay within 30 days");
        let new = tokenize("pay within 45 days");
        let script = diff_tokens(&old, &new);
        assert_eq!(
            render_inline(&script, &old, &new),
            "pay within [-30-] [+45+] days"
        );
    }

    #[test]
    fn render_insert_and_delete() {
        let base = tokenize("the fee");
        let longer = tokenize("the late fee");
        let added = diff_tokens(&base, &longer);
        assert_eq!(render_inline(&added, &base, &longer), "the [+late+] fee");

        let removed = diff_tokens(&longer, &base);
        assert_eq!(render_inline(&removed, &longer, &base), "the [-late-] fee");
    }

    #[test]
    fn render_identity_is_plain_text() {
        let tokens = tokenize("nothing changed here");
        let script = diff_tokens(&tokens, &tokens);
        assert_eq!(render_inline(&script, &tokens, &tokens), "nothing changed here");
    }
}

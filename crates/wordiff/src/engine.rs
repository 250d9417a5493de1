use tokenize::Token;

use crate::script::{EditOp, EditScript, Span};

/// Single-token step produced by path reconstruction before coalescing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Equal,
    Insert,
    Delete,
    Substitute,
}

/// DP cell cost: (total operations, substitute operations). Tuples order
/// lexicographically, which gives "fewest ops, then fewest substitutes".
type Cost = (u32, u32);

const DELETE: Cost = (1, 0);
const INSERT: Cost = (1, 0);
const SUBSTITUTE: Cost = (1, 1);

fn add(a: Cost, b: Cost) -> Cost {
    (a.0 + b.0, a.1 + b.1)
}

fn same(a: &Token, b: &Token) -> bool {
    a.text == b.text
}

/// Computes a minimal edit script turning `old` into `new`.
///
/// Minimal by total operation count before coalescing; among scripts with the
/// same count the one with fewer substitutes wins. Common prefix and suffix
/// are stripped before the quadratic pass, so near-identical blocks stay
/// cheap.
pub fn diff_tokens(old: &[Token], new: &[Token]) -> EditScript {
    let prefix = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| same(a, b))
        .count();
    let max_suffix = old.len().min(new.len()) - prefix;
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| same(a, b))
        .count();

    let a = &old[prefix..old.len() - suffix];
    let b = &new[prefix..new.len() - suffix];

    let mut steps = Vec::with_capacity(prefix + suffix + a.len().max(b.len()));
    steps.extend(std::iter::repeat(Step::Equal).take(prefix));
    steps.extend(middle_steps(a, b));
    steps.extend(std::iter::repeat(Step::Equal).take(suffix));

    let ops = coalesce(&steps);
    let ops = merge_for_presentation(ops, old, new);
    EditScript::from_ops(ops)
}

/// Token-level edit distance (insert, delete and substitute all cost one).
///
/// Runs in O(n·m) time and O(m) memory.
pub fn edit_distance(old: &[Token], new: &[Token]) -> usize {
    edit_distance_by(old, new, same)
}

/// Edit distance with a caller-supplied equality, shared by the aligner's
/// word-level similarity.
pub fn edit_distance_by<T, F>(old: &[T], new: &[T], eq: F) -> usize
where
    F: Fn(&T, &T) -> bool,
{
    if old.is_empty() {
        return new.len();
    }
    if new.is_empty() {
        return old.len();
    }

    let mut prev: Vec<usize> = (0..=new.len()).collect();
    let mut curr = vec![0usize; new.len() + 1];

    for (i, a) in old.iter().enumerate() {
        curr[0] = i + 1;
        for (j, b) in new.iter().enumerate() {
            let diagonal = prev[j] + usize::from(!eq(a, b));
            curr[j + 1] = diagonal.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[new.len()]
}

fn middle_steps(a: &[Token], b: &[Token]) -> Vec<Step> {
    if a.is_empty() {
        return vec![Step::Insert; b.len()];
    }
    if b.is_empty() {
        return vec![Step::Delete; a.len()];
    }

    let width = b.len() + 1;
    let idx = |i: usize, j: usize| i * width + j;
    let mut cost: Vec<Cost> = vec![(0, 0); (a.len() + 1) * width];

    for j in 0..=b.len() {
        cost[idx(0, j)] = (j as u32, 0);
    }
    for i in 1..=a.len() {
        cost[idx(i, 0)] = (i as u32, 0);
        for j in 1..=b.len() {
            let diagonal = if same(&a[i - 1], &b[j - 1]) {
                cost[idx(i - 1, j - 1)]
            } else {
                add(cost[idx(i - 1, j - 1)], SUBSTITUTE)
            };
            let delete = add(cost[idx(i - 1, j)], DELETE);
            let insert = add(cost[idx(i, j - 1)], INSERT);
            cost[idx(i, j)] = diagonal.min(delete).min(insert);
        }
    }

    // Walk back from the corner. Preference order on ties is fixed so the
    // same inputs always produce the same script.
    let mut steps = Vec::with_capacity(a.len().max(b.len()));
    let (mut i, mut j) = (a.len(), b.len());
    while i > 0 || j > 0 {
        let here = cost[idx(i, j)];
        if i > 0 && j > 0 && same(&a[i - 1], &b[j - 1]) && cost[idx(i - 1, j - 1)] == here {
            steps.push(Step::Equal);
            i -= 1;
            j -= 1;
        } else if i > 0 && j > 0 && add(cost[idx(i - 1, j - 1)], SUBSTITUTE) == here {
            steps.push(Step::Substitute);
            i -= 1;
            j -= 1;
        } else if i > 0 && add(cost[idx(i - 1, j)], DELETE) == here {
            steps.push(Step::Delete);
            i -= 1;
        } else {
            steps.push(Step::Insert);
            j -= 1;
        }
    }
    steps.reverse();
    steps
}

/// Folds per-token steps into ranged ops, one op per run of the same variant.
fn coalesce(steps: &[Step]) -> Vec<EditOp> {
    let mut ops: Vec<EditOp> = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);

    for step in steps {
        let extended = match (ops.last_mut(), step) {
            (Some(EditOp::Equal { old, new }), Step::Equal)
            | (Some(EditOp::Substitute { old, new }), Step::Substitute) => {
                old.extend(1);
                new.extend(1);
                true
            }
            (Some(EditOp::Delete { old }), Step::Delete) => {
                old.extend(1);
                true
            }
            (Some(EditOp::Insert { new }), Step::Insert) => {
                new.extend(1);
                true
            }
            _ => false,
        };

        if !extended {
            ops.push(match step {
                Step::Equal => EditOp::Equal {
                    old: Span::new(i, i + 1),
                    new: Span::new(j, j + 1),
                },
                Step::Substitute => EditOp::Substitute {
                    old: Span::new(i, i + 1),
                    new: Span::new(j, j + 1),
                },
                Step::Delete => EditOp::Delete {
                    old: Span::new(i, i + 1),
                },
                Step::Insert => EditOp::Insert {
                    new: Span::new(j, j + 1),
                },
            });
        }

        match step {
            Step::Equal | Step::Substitute => {
                i += 1;
                j += 1;
            }
            Step::Delete => i += 1,
            Step::Insert => j += 1,
        }
    }

    ops
}

/// Merges an adjacent Delete/Insert pair into a single Substitute when both
/// sides start with the same token kind, then joins neighbouring Substitutes.
fn merge_for_presentation(ops: Vec<EditOp>, old: &[Token], new: &[Token]) -> Vec<EditOp> {
    let mut merged: Vec<EditOp> = Vec::with_capacity(ops.len());

    for op in ops {
        let replacement = match (merged.last().copied(), op) {
            (Some(EditOp::Delete { old: o }), EditOp::Insert { new: n })
            | (Some(EditOp::Insert { new: n }), EditOp::Delete { old: o })
                if old[o.start].kind == new[n.start].kind =>
            {
                Some(EditOp::Substitute { old: o, new: n })
            }
            (Some(EditOp::Substitute { old: o, new: n }), EditOp::Substitute { old: o2, new: n2 }) => {
                Some(EditOp::Substitute {
                    old: Span::new(o.start, o2.end),
                    new: Span::new(n.start, n2.end),
                })
            }
            _ => None,
        };

        match replacement {
            Some(combined) => {
                merged.pop();
                // The combined Substitute may now touch a previous Substitute.
                if let (
                    Some(EditOp::Substitute { old: po, new: pn }),
                    EditOp::Substitute { old: o, new: n },
                ) = (merged.last().copied(), combined)
                {
                    let joined = EditOp::Substitute {
                        old: Span::new(po.start, o.end),
                        new: Span::new(pn.start, n.end),
                    };
                    merged.pop();
                    merged.push(joined);
                } else {
                    merged.push(combined);
                }
            }
            None => merged.push(op),
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenize::{tokenize, TokenKind};

    fn tok(text: &str, kind: TokenKind) -> Token {
        Token {
            text: text.to_string(),
            kind,
            start: 0,
            end: text.len(),
        }
    }

    #[test]
    fn identical_inputs_are_one_equal_op() {
        let tokens = tokenize("net 30 days");
        let script = diff_tokens(&tokens, &tokens);
        assert_eq!(script.len(), 1);
        assert!(script.is_identity());
    }

    #[test]
    fn empty_inputs() {
        let tokens = tokenize("a b");
        assert!(diff_tokens(&[], &[]).is_empty());
        assert_eq!(
            diff_tokens(&[], &tokens).ops(),
            &[EditOp::Insert {
                new: Span::new(0, 3)
            }]
        );
        assert_eq!(
            diff_tokens(&tokens, &[]).ops(),
            &[EditOp::Delete {
                old: Span::new(0, 3)
            }]
        );
    }

    #[test]
    fn single_word_change_is_substitute() {
        let old = tokenize("the cat sat");
        let new = tokenize("the dog sat");
        let script = diff_tokens(&old, &new);
        assert_eq!(
            script.ops(),
            &[
                EditOp::Equal {
                    old: Span::new(0, 2),
                    new: Span::new(0, 2)
                },
                EditOp::Substitute {
                    old: Span::new(2, 3),
                    new: Span::new(2, 3)
                },
                EditOp::Equal {
                    old: Span::new(3, 5),
                    new: Span::new(3, 5)
                },
            ]
        );
    }

    #[test]
    fn insertion_in_the_middle() {
        let old = tokenize("net days");
        let new = tokenize("net 30 days");
        let script = diff_tokens(&old, &new);
        assert_eq!(script.edit_count(), 1);
        assert!(matches!(script.ops()[1], EditOp::Insert { new } if new.len() == 2));
    }

    #[test]
    fn ties_prefer_fewer_substitutes() {
        // [a, b] -> [b, c]: delete a + insert c (2 ops, 0 subs) beats
        // substitute a->b + substitute b->c (2 ops, 2 subs).
        let old = vec![tok("a", TokenKind::Word), tok("b", TokenKind::Word)];
        let new = vec![tok("b", TokenKind::Word), tok("c", TokenKind::Word)];
        let script = diff_tokens(&old, &new);
        assert_eq!(script.substitute_count(), 0);
        assert_eq!(script.edit_count(), 2);
    }

    #[test]
    fn delete_insert_of_same_kind_merges() {
        let old = vec![tok("x", TokenKind::Word)];
        let new = vec![tok("y", TokenKind::Word)];
        let merged = merge_for_presentation(
            vec![
                EditOp::Delete {
                    old: Span::new(0, 1),
                },
                EditOp::Insert {
                    new: Span::new(0, 1),
                },
            ],
            &old,
            &new,
        );
        assert_eq!(
            merged,
            vec![EditOp::Substitute {
                old: Span::new(0, 1),
                new: Span::new(0, 1)
            }]
        );
    }

    #[test]
    fn delete_insert_of_different_kind_stays_split() {
        let old = vec![tok("x", TokenKind::Word)];
        let new = vec![tok("5", TokenKind::Number)];
        let ops = vec![
            EditOp::Delete {
                old: Span::new(0, 1),
            },
            EditOp::Insert {
                new: Span::new(0, 1),
            },
        ];
        assert_eq!(merge_for_presentation(ops.clone(), &old, &new), ops);
    }

    #[test]
    fn edit_distance_counts_unit_operations() {
        let old = tokenize("pay within 30 days");
        let new = tokenize("pay within 45 business days");
        // "30" -> "45", plus " business" inserted as two tokens.
        assert_eq!(edit_distance(&old, &new), 3);
        assert_eq!(edit_distance(&old, &old), 0);
        assert_eq!(edit_distance(&[], &old), old.len());
    }

    #[test]
    fn edit_distance_by_works_on_strings() {
        let a = ["a", "b", "c"];
        let b = ["a", "c"];
        assert_eq!(edit_distance_by(&a, &b, |x, y| x == y), 1);
    }
}

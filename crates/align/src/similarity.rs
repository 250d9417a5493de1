use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tokenize::{tokenize, words, Token};
use wordiff::edit_distance_by;

use crate::block::{Block, BlockKind};

/// Weights and cut-off used when scoring candidate block pairs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Minimum score for a pair to match in the similarity pass (τ).
    pub threshold: f64,
    /// Weight of block-type equality; text similarity gets the rest.
    pub type_weight: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            type_weight: 0.1,
        }
    }
}

/// Precomputed per-block data reused by every comparison the block takes
/// part in.
#[derive(Debug, Clone)]
pub struct BlockProfile {
    pub kind: BlockKind,
    /// Full token sequence, whitespace included.
    pub tokens: Vec<Token>,
    /// Case-folded non-whitespace tokens in order.
    pub words: Vec<String>,
    /// Distinct case-folded words.
    pub vocabulary: HashSet<String>,
}

impl BlockProfile {
    pub fn new(block: &Block) -> Self {
        let tokens = tokenize(&block.text);
        let words: Vec<String> = words(&tokens).map(Token::folded).collect();
        let vocabulary = words.iter().cloned().collect();
        Self {
            kind: block.kind,
            tokens,
            words,
            vocabulary,
        }
    }
}

/// Jaccard index over distinct words. Two empty sets are identical.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Word edit distance divided by the longer word count, in `[0, 1]`.
pub fn normalized_edit_distance(a: &[String], b: &[String]) -> f64 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }
    edit_distance_by(a, b, |x, y| x == y) as f64 / longest as f64
}

/// Text similarity in `[0, 1]`: mean of Jaccard and `1 - normalized edit distance`.
pub fn text_similarity(a: &BlockProfile, b: &BlockProfile) -> f64 {
    let overlap = jaccard(&a.vocabulary, &b.vocabulary);
    let order = 1.0 - normalized_edit_distance(&a.words, &b.words);
    (overlap + order) / 2.0
}

impl SimilarityConfig {
    /// Combined score of a block pair.
    pub fn score(&self, a: &BlockProfile, b: &BlockProfile) -> f64 {
        let type_match = if a.kind == b.kind { 1.0 } else { 0.0 };
        (1.0 - self.type_weight) * text_similarity(a, b) + self.type_weight * type_match
    }

    /// Cheap ceiling on [`score`](Self::score) from set and sequence sizes.
    ///
    /// Jaccard is at most `min/max` of the vocabulary sizes and `1 - ned` at
    /// most `min/max` of the word counts, so pairs whose ceiling is below τ
    /// can be skipped without running the quadratic edit distance.
    pub fn upper_bound(&self, a: &BlockProfile, b: &BlockProfile) -> f64 {
        let overlap = size_ratio(a.vocabulary.len(), b.vocabulary.len());
        let order = size_ratio(a.words.len(), b.words.len());
        let type_match = if a.kind == b.kind { 1.0 } else { 0.0 };
        (1.0 - self.type_weight) * (overlap + order) / 2.0 + self.type_weight * type_match
    }
}

fn size_ratio(a: usize, b: usize) -> f64 {
    let longer = a.max(b);
    if longer == 0 {
        1.0
    } else {
        a.min(b) as f64 / longer as f64
    }
}

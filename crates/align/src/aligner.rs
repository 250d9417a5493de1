use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokenize::Token;
use tracing::debug;

use crate::block::Block;
use crate::similarity::{BlockProfile, SimilarityConfig};

/// How a block changed between the two versions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
    Moved,
    Unchanged,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Added => "added",
            ChangeType::Removed => "removed",
            ChangeType::Modified => "modified",
            ChangeType::Moved => "moved",
            ChangeType::Unchanged => "unchanged",
        }
    }
}

/// One entry of the alignment. Indices address the input slices.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AlignedPair {
    pub change: ChangeType,
    pub old: Option<usize>,
    pub new: Option<usize>,
    /// Pair score for matched blocks, `None` for ADDED/REMOVED.
    pub similarity: Option<f64>,
}

/// Counters describing one alignment run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlignmentStats {
    pub old_blocks: usize,
    pub new_blocks: usize,
    /// Pairs fixed by the exact-text LCS pass.
    pub anchors: usize,
    /// Pairs matched by the similarity pass.
    pub similarity_matches: usize,
    /// Candidate pairs that survived the upper-bound filter and were scored.
    pub candidates_scored: usize,
    pub unchanged: usize,
    pub moved: usize,
    pub modified: usize,
    pub added: usize,
    pub removed: usize,
}

impl AlignmentStats {
    fn increment(&mut self, change: ChangeType) {
        match change {
            ChangeType::Added => self.added += 1,
            ChangeType::Removed => self.removed += 1,
            ChangeType::Modified => self.modified += 1,
            ChangeType::Moved => self.moved += 1,
            ChangeType::Unchanged => self.unchanged += 1,
        }
    }
}

/// Result of aligning two block sequences.
///
/// `pairs` are in document order: new-document position, or old-document
/// position for REMOVED blocks, with a removal sorted before anything that
/// shares its position. The token profiles computed during alignment are kept
/// so later stages do not tokenize the same text twice.
#[derive(Debug, Clone)]
pub struct Alignment {
    pub pairs: Vec<AlignedPair>,
    pub stats: AlignmentStats,
    old_profiles: Vec<BlockProfile>,
    new_profiles: Vec<BlockProfile>,
}

impl Alignment {
    pub fn old_profile(&self, index: usize) -> &BlockProfile {
        &self.old_profiles[index]
    }

    pub fn new_profile(&self, index: usize) -> &BlockProfile {
        &self.new_profiles[index]
    }

    pub fn old_tokens(&self, index: usize) -> &[Token] {
        &self.old_profiles[index].tokens
    }

    pub fn new_tokens(&self, index: usize) -> &[Token] {
        &self.new_profiles[index].tokens
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f64,
    distance: usize,
    old: usize,
    new: usize,
}

/// Two-pass block aligner.
///
/// Pass one takes the longest common subsequence of exact-text matches as
/// anchors. Pass two greedily pairs the leftovers by similarity score,
/// keeping pairs at or above τ. Matched pairs with identical text become
/// UNCHANGED when they keep their rank among matched blocks and MOVED
/// otherwise; everything else matched is MODIFIED.
#[derive(Debug, Clone, Default)]
pub struct BlockAligner {
    config: SimilarityConfig,
}

impl BlockAligner {
    pub fn new(config: SimilarityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    pub fn align(&self, old: &[Block], new: &[Block]) -> Alignment {
        let old_profiles: Vec<BlockProfile> = old.iter().map(BlockProfile::new).collect();
        let new_profiles: Vec<BlockProfile> = new.iter().map(BlockProfile::new).collect();

        let mut stats = AlignmentStats {
            old_blocks: old.len(),
            new_blocks: new.len(),
            ..AlignmentStats::default()
        };

        let mut old_match: Vec<Option<usize>> = vec![None; old.len()];
        let mut new_match: Vec<Option<usize>> = vec![None; new.len()];
        let mut scores: Vec<Option<f64>> = vec![None; old.len()];

        for (i, j) in exact_anchors(old, new) {
            old_match[i] = Some(j);
            new_match[j] = Some(i);
            scores[i] = Some(1.0);
            stats.anchors += 1;
        }

        let mut candidates = Vec::new();
        for (i, old_block) in old.iter().enumerate() {
            if old_match[i].is_some() {
                continue;
            }
            for (j, new_block) in new.iter().enumerate() {
                if new_match[j].is_some() {
                    continue;
                }
                let score = if old_block.text == new_block.text {
                    1.0
                } else {
                    let (a, b) = (&old_profiles[i], &new_profiles[j]);
                    if self.config.upper_bound(a, b) < self.config.threshold {
                        continue;
                    }
                    stats.candidates_scored += 1;
                    self.config.score(a, b)
                };
                if score >= self.config.threshold {
                    candidates.push(Candidate {
                        score,
                        distance: old_block.position.abs_diff(new_block.position),
                        old: i,
                        new: j,
                    });
                }
            }
        }

        candidates.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.distance.cmp(&b.distance))
                .then(a.old.cmp(&b.old))
                .then(a.new.cmp(&b.new))
        });
        for candidate in candidates {
            if old_match[candidate.old].is_some() || new_match[candidate.new].is_some() {
                continue;
            }
            old_match[candidate.old] = Some(candidate.new);
            new_match[candidate.new] = Some(candidate.old);
            scores[candidate.old] = Some(candidate.score);
            stats.similarity_matches += 1;
        }

        // Rank of each matched block among matched blocks on its own side.
        let mut new_rank: Vec<Option<usize>> = vec![None; new.len()];
        for (rank, j) in (0..new.len()).filter(|&j| new_match[j].is_some()).enumerate() {
            new_rank[j] = Some(rank);
        }

        let mut pairs = Vec::with_capacity(old.len().max(new.len()));
        let mut old_rank = 0usize;
        for (i, matched) in old_match.iter().enumerate() {
            match *matched {
                Some(j) => {
                    let change = if old[i].text != new[j].text {
                        ChangeType::Modified
                    } else if new_rank[j] == Some(old_rank) {
                        ChangeType::Unchanged
                    } else {
                        ChangeType::Moved
                    };
                    old_rank += 1;
                    pairs.push(AlignedPair {
                        change,
                        old: Some(i),
                        new: Some(j),
                        similarity: scores[i],
                    });
                }
                None => pairs.push(AlignedPair {
                    change: ChangeType::Removed,
                    old: Some(i),
                    new: None,
                    similarity: None,
                }),
            }
        }
        for (j, matched) in new_match.iter().enumerate() {
            if matched.is_none() {
                pairs.push(AlignedPair {
                    change: ChangeType::Added,
                    old: None,
                    new: Some(j),
                    similarity: None,
                });
            }
        }

        pairs.sort_by_key(|pair| document_order(pair, old, new));
        for pair in &pairs {
            stats.increment(pair.change);
        }

        debug!(
            old_blocks = stats.old_blocks,
            new_blocks = stats.new_blocks,
            anchors = stats.anchors,
            similarity_matches = stats.similarity_matches,
            candidates_scored = stats.candidates_scored,
            "blocks_aligned"
        );

        Alignment {
            pairs,
            stats,
            old_profiles,
            new_profiles,
        }
    }
}

/// Sort key: (position, removed-first flag, old index, new index).
fn document_order(pair: &AlignedPair, old: &[Block], new: &[Block]) -> (usize, u8, usize, usize) {
    match (pair.old, pair.new) {
        (Some(i), None) => (old[i].position, 0, i, 0),
        (i, Some(j)) => (new[j].position, 1, i.unwrap_or(usize::MAX), j),
        (None, None) => (usize::MAX, 2, usize::MAX, usize::MAX),
    }
}

/// Longest common subsequence of exact-text matches, as (old, new) index
/// pairs in increasing order. Common prefix and suffix are matched directly.
fn exact_anchors(old: &[Block], new: &[Block]) -> Vec<(usize, usize)> {
    let prefix = old
        .iter()
        .zip(new)
        .take_while(|(a, b)| a.text == b.text)
        .count();
    let max_suffix = old.len().min(new.len()) - prefix;
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a.text == b.text)
        .count();

    let mut anchors: Vec<(usize, usize)> = (0..prefix).map(|k| (k, k)).collect();

    // Intern texts so the DP compares integers.
    let mut interned: HashMap<&str, u32> = HashMap::new();
    let a: Vec<u32> = old[prefix..old.len() - suffix]
        .iter()
        .map(|block| intern(&mut interned, &block.text))
        .collect();
    let b: Vec<u32> = new[prefix..new.len() - suffix]
        .iter()
        .map(|block| intern(&mut interned, &block.text))
        .collect();

    if !a.is_empty() && !b.is_empty() {
        // lcs[i][j] = LCS length of a[i..] and b[j..]
        let width = b.len() + 1;
        let mut lcs = vec![0u32; (a.len() + 1) * width];
        for i in (0..a.len()).rev() {
            for j in (0..b.len()).rev() {
                lcs[i * width + j] = if a[i] == b[j] {
                    lcs[(i + 1) * width + j + 1] + 1
                } else {
                    lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
                };
            }
        }

        let (mut i, mut j) = (0usize, 0usize);
        while i < a.len() && j < b.len() {
            if a[i] == b[j] {
                anchors.push((prefix + i, prefix + j));
                i += 1;
                j += 1;
            } else if lcs[(i + 1) * width + j] >= lcs[i * width + j + 1] {
                i += 1;
            } else {
                j += 1;
            }
        }
    }

    let old_tail = old.len() - suffix;
    let new_tail = new.len() - suffix;
    anchors.extend((0..suffix).map(|k| (old_tail + k, new_tail + k)));
    anchors
}

fn intern<'a>(table: &mut HashMap<&'a str, u32>, text: &'a str) -> u32 {
    let next = table.len() as u32;
    *table.entry(text).or_insert(next)
}

//! Block alignment between two versions of a document.
//!
//! Blocks are addressed by index into the caller's slices; nothing is
//! cloned. [`BlockAligner::align`] returns one [`AlignedPair`] per block
//! pairing (or per unmatched block) so every input block appears exactly
//! once, together with the token profiles it computed on the way.
//!
//! ```rust
//! use align::{Block, BlockAligner, ChangeType};
//!
//! let old = vec![
//!     Block::paragraph("a", "Rent is due monthly.", 0),
//!     Block::paragraph("b", "The deposit is $500.", 1),
//! ];
//! let new = vec![
//!     Block::paragraph("a", "Rent is due monthly.", 0),
//!     Block::paragraph("b", "The deposit is $750.", 1),
//! ];
//!
//! let alignment = BlockAligner::default().align(&old, &new);
//! let kinds: Vec<ChangeType> = alignment.pairs.iter().map(|p| p.change).collect();
//! assert_eq!(kinds, vec![ChangeType::Unchanged, ChangeType::Modified]);
//! ```

mod aligner;
mod block;
mod similarity;

pub use crate::aligner::{AlignedPair, Alignment, AlignmentStats, BlockAligner, ChangeType};
pub use crate::block::{Block, BlockKind, ParseBlockKindError};
pub use crate::similarity::{
    jaccard, normalized_edit_distance, text_similarity, BlockProfile, SimilarityConfig,
};

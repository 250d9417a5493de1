use std::fmt;

use align::Block;
use thiserror::Error;

/// Which input document a problem was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Old,
    New,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Old => "old",
            Side::New => "new",
        })
    }
}

/// Block sequences the pipeline refuses to compare.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("both documents are empty")]
    EmptyDocument,

    #[error("{side} document: block at index {index} has an empty id")]
    MissingBlockId { side: Side, index: usize },

    #[error("{side} document: block id `{id}` appears more than once")]
    DuplicateBlockId { side: Side, id: String },

    #[error("{side} document: block `{id}` has position {found}, after position {previous}")]
    NonSequentialOrdinal {
        side: Side,
        id: String,
        previous: usize,
        found: usize,
    },
}

/// Reasons a compare job ends with `failed`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompareError {
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("comparison cancelled")]
    Cancelled,
}

/// Checks the Parser contract: non-empty unique ids and strictly
/// increasing positions. One side may be empty, not both.
pub fn validate_blocks(old: &[Block], new: &[Block]) -> Result<(), InputError> {
    if old.is_empty() && new.is_empty() {
        return Err(InputError::EmptyDocument);
    }
    validate_side(Side::Old, old)?;
    validate_side(Side::New, new)
}

fn validate_side(side: Side, blocks: &[Block]) -> Result<(), InputError> {
    let mut seen = std::collections::HashSet::with_capacity(blocks.len());
    let mut previous: Option<usize> = None;

    for (index, block) in blocks.iter().enumerate() {
        if block.id.trim().is_empty() {
            return Err(InputError::MissingBlockId { side, index });
        }
        if !seen.insert(block.id.as_str()) {
            return Err(InputError::DuplicateBlockId {
                side,
                id: block.id.clone(),
            });
        }
        if let Some(prev) = previous
            && block.position <= prev
        {
            return Err(InputError::NonSequentialOrdinal {
                side,
                id: block.id.clone(),
                previous: prev,
                found: block.position,
            });
        }
        previous = Some(block.position);
    }
    Ok(())
}

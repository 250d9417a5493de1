use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structural role of a block inside its document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    #[default]
    Paragraph,
    Heading,
    ListItem,
    TableCell,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::Heading => "heading",
            BlockKind::ListItem => "list-item",
            BlockKind::TableCell => "table-cell",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown block kind `{0}`")]
pub struct ParseBlockKindError(pub String);

impl FromStr for BlockKind {
    type Err = ParseBlockKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "paragraph" => Ok(BlockKind::Paragraph),
            "heading" => Ok(BlockKind::Heading),
            "list-item" => Ok(BlockKind::ListItem),
            "table-cell" => Ok(BlockKind::TableCell),
            _ => Err(ParseBlockKindError(s.to_string())),
        }
    }
}

/// One structural unit of a parsed document. Immutable once parsed.
///
/// Serialized with the Parser's field names:
/// `{"id": "p-3", "type": "paragraph", "text": "...", "position": 3}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: BlockKind,
    pub text: String,
    /// Ordinal position in the document.
    pub position: usize,
}

impl Block {
    pub fn new(id: impl Into<String>, kind: BlockKind, text: impl Into<String>, position: usize) -> Self {
        Self {
            id: id.into(),
            kind,
            text: text.into(),
            position,
        }
    }

    /// Shorthand for a paragraph block, mostly for tests and fixtures.
    pub fn paragraph(id: impl Into<String>, text: impl Into<String>, position: usize) -> Self {
        Self::new(id, BlockKind::Paragraph, text, position)
    }
}

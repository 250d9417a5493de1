//! Deterministic change rules.
//!
//! The rule pass runs before any external judgment and decides the cases
//! that need no opinion: numeric values that changed are always CRITICAL,
//! and edits that only touch case, whitespace, punctuation or a single
//! character are cosmetic. Everything here is pure and O(script length)
//! apart from number recognition, which is linear in the block's tokens.
//!
//! Recognized quantities:
//!
//! - plain and grouped numbers: `30`, `1,000`, `1.000.000`, `3,5`
//! - currency: `$`, `€`, `£`, `¥`, `₫` prefixes; `USD`, `EUR`, `VND`, `đồng`
//!   before or after the number; Vietnamese scale words (`triệu`, `tỷ`)
//! - percentages: `15%`, `15 %`, `15 percent`

mod engine;
mod numeric;
mod trivial;

pub use crate::engine::{RuleConfig, RuleEngine, RuleVerdict, NUMERIC_CHANGE};
pub use crate::numeric::{find_numbers, parse_number, NumericChange, NumericKind, NumericOccurrence};
pub use crate::trivial::{is_trivial_edit, is_trivial_op};

//! Token-level word diff.
//!
//! [`diff_tokens`] computes a minimal edit script between two token
//! sequences with the classic O(n·m) dynamic program. Cost is the number of
//! unit operations; among equally short scripts the one with fewer
//! substitutions wins, so a moved word shows up as delete + insert rather
//! than a chain of substitutions.
//!
//! The script is then coalesced into ranged [`EditOp`]s whose old spans tile
//! the old sequence and whose new spans tile the new sequence. [`apply`]
//! replays a script and [`render_inline`] turns it into `[-old-] [+new+]`
//! markup for reviewers.
//!
//! ```rust
//! use tokenize::tokenize;
//! use wordiff::{apply, diff_tokens, render_inline};
//!
//! let old = tokenize("Rent is $1,000 per month");
//! let new = tokenize("Rent is $1,200 per month");
//! let script = diff_tokens(&old, &new);
//!
//! assert_eq!(script.edit_count(), 1);
//! assert_eq!(apply(&script, &old, &new).unwrap(), new);
//! assert_eq!(
//!     render_inline(&script, &old, &new),
//!     "Rent is [-$1,000-] [+$1,200+] per month"
//! );
//! ```

mod apply;
mod changes;
mod engine;
mod script;

pub use crate::apply::{apply, render_inline, ApplyError};
pub use crate::changes::{word_changes, WordChange, WordChangeKind, DEFAULT_CONTEXT_WORDS};
pub use crate::engine::{diff_tokens, edit_distance, edit_distance_by};
pub use crate::script::{EditOp, EditScript, Span};

//! Whitespace helpers.
//!
//! Unicode's definition of whitespace is used throughout, so non-breaking
//! spaces and CRLF line endings behave like ordinary spaces.
//!
//! ```rust
//! use tokenize::collapse_whitespace;
//!
//! assert_eq!(collapse_whitespace("  hello \n\n world  "), "hello world");
//! ```

/// Collapses repeated whitespace, trims edges, and normalizes newlines to
/// single spaces.
///
/// Returns an empty string for empty or whitespace-only input.
pub fn collapse_whitespace(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    for segment in text.split_whitespace() {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.push_str(segment);
    }
    normalized
}

/// True when `text` is empty or contains only whitespace.
pub fn is_blank(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_mixed_whitespace() {
        assert_eq!(collapse_whitespace("hello \t \t world"), "hello world");
        assert_eq!(collapse_whitespace("hello\r\nworld"), "hello world");
        assert_eq!(collapse_whitespace("hello\u{00A0}world"), "hello world");
    }

    #[test]
    fn collapse_edge_cases() {
        assert_eq!(collapse_whitespace(""), "");
        assert_eq!(collapse_whitespace("   \n\t   "), "");
        assert_eq!(collapse_whitespace("hello"), "hello");
    }
}

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Coarse lexical class of a token.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Word,
    Number,
    Punctuation,
    Whitespace,
}

/// A token with its UTF-8 byte offsets in the block text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    /// The token text content, exactly as it appears in the block.
    pub text: String,
    /// Lexical class.
    pub kind: TokenKind,
    /// Byte offset (inclusive) in the block text.
    pub start: usize,
    /// Byte offset (exclusive) in the block text.
    pub end: usize,
}

impl Token {
    /// Lowercased view used for case-insensitive comparisons.
    pub fn folded(&self) -> String {
        self.text.to_lowercase()
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind == TokenKind::Whitespace
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        self.text.as_str()
    }
}

const CURRENCY_PREFIXES: [&str; 5] = ["$", "€", "£", "¥", "₫"];

/// Tokenizes block text and produces byte offsets.
///
/// Segmentation follows UAX #29 word boundaries, so grouped digits such as
/// `1,000.50` arrive as one segment. A second pass merges currency prefixes,
/// percent suffixes and whitespace runs. Deterministic and allocation-light.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::with_capacity(text.len() / 3 + 1);

    for (start, segment) in text.split_word_bound_indices() {
        let kind = classify(segment);
        let end = start + segment.len();

        if let Some(prev) = tokens.last_mut() {
            if prev.end == start && should_merge(prev, kind, segment) {
                prev.text.push_str(segment);
                prev.end = end;
                if kind == TokenKind::Number {
                    prev.kind = TokenKind::Number;
                }
                continue;
            }
        }

        tokens.push(Token {
            text: segment.to_string(),
            kind,
            start,
            end,
        });
    }

    tokens
}

/// Iterates over the non-whitespace tokens of a sequence.
pub fn words(tokens: &[Token]) -> impl Iterator<Item = &Token> {
    tokens.iter().filter(|t| !t.is_whitespace())
}

fn classify(segment: &str) -> TokenKind {
    let mut chars = segment.chars();
    let Some(first) = chars.next() else {
        return TokenKind::Punctuation;
    };

    if segment.chars().all(char::is_whitespace) {
        TokenKind::Whitespace
    } else if first.is_ascii_digit() && chars.all(|c| c.is_ascii_digit() || c == ',' || c == '.')
    {
        TokenKind::Number
    } else if segment.chars().any(char::is_alphanumeric) {
        TokenKind::Word
    } else {
        TokenKind::Punctuation
    }
}

fn should_merge(prev: &Token, kind: TokenKind, segment: &str) -> bool {
    match (prev.kind, kind) {
        (TokenKind::Whitespace, TokenKind::Whitespace) => true,
        // "$" + "100"
        (TokenKind::Punctuation, TokenKind::Number) => {
            CURRENCY_PREFIXES.contains(&prev.text.as_str())
        }
        // "15" + "%", but never "15%%"
        (TokenKind::Number, TokenKind::Punctuation) => segment == "%" && !prev.text.ends_with('%'),
        _ => false,
    }
}

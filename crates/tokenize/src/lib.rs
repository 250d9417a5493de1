//! docdelta token layer.
//!
//! Splits block text into a flat sequence of [`Token`]s that the word differ,
//! the block aligner and the numeric rules all share. Every token keeps its
//! UTF-8 byte offsets into the original block text, so an edit script computed
//! over tokens can be mapped straight back onto the text for highlighting.
//!
//! ## What we do
//!
//! - Word boundaries follow Unicode UAX #29 (via `unicode-segmentation`)
//! - Each segment is tagged as word, number, punctuation or whitespace
//! - Currency prefixes (`$100`) and percent suffixes (`15%`) stay attached
//!   to their number so numeric rules see a single token
//! - Adjacent whitespace segments are merged into one token
//!
//! ## What we don't do
//!
//! No case folding and no Unicode normalization. Offsets must point into the
//! caller's text, so the text is never rewritten here. Callers that need a
//! case-insensitive view use [`Token::folded`].
//!
//! ## Invariant worth knowing
//!
//! Concatenating `token.text` for every token reproduces the input exactly.

mod token;
mod whitespace;

pub use crate::token::{tokenize, words, Token, TokenKind};
pub use crate::whitespace::{collapse_whitespace, is_blank};

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<(String, TokenKind)> {
        tokenize(text)
            .into_iter()
            .map(|t| (t.text, t.kind))
            .collect()
    }

    #[test]
    fn basic_sentence_kinds() {
        let got = kinds("Pay 30 days.");
        assert_eq!(
            got,
            vec![
                ("Pay".to_string(), TokenKind::Word),
                (" ".to_string(), TokenKind::Whitespace),
                ("30".to_string(), TokenKind::Number),
                (" ".to_string(), TokenKind::Whitespace),
                ("days".to_string(), TokenKind::Word),
                (".".to_string(), TokenKind::Punctuation),
            ]
        );
    }

    #[test]
    fn currency_and_percent_attach_to_number() {
        let got = kinds("Fee $1,250.00 or 15% total");
        let numbers: Vec<&str> = got
            .iter()
            .filter(|(_, k)| *k == TokenKind::Number)
            .map(|(t, _)| t.as_str())
            .collect();
        assert_eq!(numbers, vec!["$1,250.00", "15%"]);
    }

    #[test]
    fn concatenation_reproduces_input() {
        let inputs = [
            "",
            "   ",
            "Hello,  world!\n\nNew line",
            "Giá trị 1.000.000 đồng (VND)",
            "emoji \u{1f600} and a\u{10348}b",
            "tab\tseparated\r\nrows",
        ];
        for input in inputs {
            let rebuilt: String = tokenize(input).iter().map(|t| t.text.as_str()).collect();
            assert_eq!(rebuilt, input);
        }
    }

    #[test]
    fn offsets_index_original_text() {
        let text = "Café costs €4.50";
        for token in tokenize(text) {
            assert_eq!(&text[token.start..token.end], token.text);
        }
    }

    #[test]
    fn whitespace_runs_merge() {
        let got = kinds("a \t\n b");
        assert_eq!(got.len(), 3);
        assert_eq!(got[1], (" \t\n ".to_string(), TokenKind::Whitespace));
    }

    #[test]
    fn words_skip_whitespace() {
        let text = "The  lessee, shall";
        let got: Vec<String> = words(&tokenize(text))
            .map(|t| t.text.clone())
            .collect();
        assert_eq!(got, vec!["The", "lessee", ",", "shall"]);
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank(""));
        assert!(is_blank(" \n\t\u{00A0}"));
        assert!(!is_blank(" x "));
    }
}

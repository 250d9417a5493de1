//! Numeric value recognition over token sequences.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokenize::{Token, TokenKind};

/// What a recognized number denotes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NumericKind {
    Currency,
    Percentage,
    Number,
}

/// Evidence for one differing value. `old`/`new` hold the text as written;
/// a missing side means the value was inserted or deleted outright.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NumericChange {
    pub kind: NumericKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<String>,
}

/// A number found in a token sequence, together with any currency, percent
/// or scale tokens that belong to it.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericOccurrence {
    pub kind: NumericKind,
    /// Normalized unit: `"usd"`, `"eur"`, `"gbp"`, `"yen"`, `"vnd"` or `"%"`.
    pub unit: Option<&'static str>,
    /// Parsed value with scale words applied, when the digits parse.
    pub value: Option<f64>,
    /// Source text of the covered tokens.
    pub text: String,
    /// Token indices covered, number plus attached unit/scale tokens.
    pub tokens: Range<usize>,
}

impl NumericOccurrence {
    /// Comparison key: two occurrences with equal keys denote the same
    /// quantity even when written differently (`$100` vs `$100.00`).
    pub fn key(&self) -> (NumericKind, Option<&'static str>, String) {
        let canonical = match self.value {
            Some(v) => format!("{v}"),
            None => self.text.to_lowercase(),
        };
        (self.kind, self.unit, canonical)
    }

    pub fn overlaps(&self, span: Range<usize>) -> bool {
        self.tokens.start < span.end && span.start < self.tokens.end
    }
}

static NUMBER_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<prefix>[$€£¥₫])?(?P<digits>[0-9][0-9.,]*)(?P<percent>%)?$")
        .expect("number token pattern")
});

static SUFFIXED_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?P<digits>[0-9][0-9.,]*)(?P<unit>usd|eur|vnd|vnđ|đ)$")
        .expect("suffixed number pattern")
});

static THREE_DIGIT_GROUPS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{1,3}(,[0-9]{3})+$").expect("grouping pattern"));

static DOT_GROUPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{1,3}\.[0-9]{3}$").expect("dot grouping pattern"));

fn symbol_unit(symbol: &str) -> Option<&'static str> {
    match symbol {
        "$" => Some("usd"),
        "€" => Some("eur"),
        "£" => Some("gbp"),
        "¥" => Some("yen"),
        "₫" => Some("vnd"),
        _ => None,
    }
}

fn word_unit(word: &str) -> Option<&'static str> {
    match word.to_lowercase().as_str() {
        "usd" | "dollar" | "dollars" => Some("usd"),
        "eur" | "euro" | "euros" => Some("eur"),
        "vnd" | "vnđ" | "đồng" | "đ" => Some("vnd"),
        _ => None,
    }
}

/// Multiplier for scale words. Vietnamese scale words imply VND.
fn scale_word(word: &str) -> Option<(f64, Option<&'static str>)> {
    match word.to_lowercase().as_str() {
        "thousand" => Some((1e3, None)),
        "million" => Some((1e6, None)),
        "billion" => Some((1e9, None)),
        "nghìn" | "ngàn" => Some((1e3, Some("vnd"))),
        "triệu" => Some((1e6, Some("vnd"))),
        "tỷ" | "tỉ" => Some((1e9, Some("vnd"))),
        _ => None,
    }
}

fn is_percent_word(token: &Token) -> bool {
    token.text == "%" || token.text.eq_ignore_ascii_case("percent")
}

/// Parses grouped digits.
///
/// With both `,` and `.` present the later one is the decimal separator.
/// A lone separator kind is grouping when every group after the first has
/// three digits (`1,000,000`, `1.000.000`), and decimal otherwise (`3,5`).
/// A single `.` followed by three digits is decimal unless `dot_groups` is
/// set, which callers use for currencies without minor units.
pub fn parse_number(digits: &str, dot_groups: bool) -> Option<f64> {
    let has_comma = digits.contains(',');
    let has_dot = digits.contains('.');

    let normalized = match (has_comma, has_dot) {
        (false, false) => digits.to_string(),
        (true, true) => {
            let last_comma = digits.rfind(',')?;
            let last_dot = digits.rfind('.')?;
            if last_dot > last_comma {
                digits.replace(',', "")
            } else {
                digits.replace('.', "").replace(',', ".")
            }
        }
        (true, false) => {
            if THREE_DIGIT_GROUPS.is_match(digits) {
                digits.replace(',', "")
            } else if digits.matches(',').count() == 1 {
                digits.replace(',', ".")
            } else {
                return None;
            }
        }
        (false, true) => {
            let dots = digits.matches('.').count();
            if dots == 1 && !(dot_groups && DOT_GROUPED.is_match(digits)) {
                digits.to_string()
            } else if THREE_DIGIT_GROUPS.is_match(&digits.replace('.', ",")) {
                digits.replace('.', "")
            } else {
                return None;
            }
        }
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn next_word(tokens: &[Token], from: usize) -> Option<usize> {
    (from..tokens.len()).find(|&i| !tokens[i].is_whitespace())
}

fn prev_word(tokens: &[Token], before: usize, floor: usize) -> Option<usize> {
    (floor..before).rev().find(|&i| !tokens[i].is_whitespace())
}

/// Finds every numeric occurrence in `tokens`, left to right.
pub fn find_numbers(tokens: &[Token]) -> Vec<NumericOccurrence> {
    let mut found = Vec::new();
    let mut idx = 0;
    let mut floor = 0;

    while idx < tokens.len() {
        let token = &tokens[idx];
        let (digits, mut unit, mut kind) = match token.kind {
            TokenKind::Number => match NUMBER_TOKEN.captures(&token.text) {
                Some(caps) => {
                    let prefix = caps.name("prefix").and_then(|m| symbol_unit(m.as_str()));
                    let (kind, unit) = if caps.name("percent").is_some() {
                        (NumericKind::Percentage, Some("%"))
                    } else if prefix.is_some() {
                        (NumericKind::Currency, prefix)
                    } else {
                        (NumericKind::Number, None)
                    };
                    (caps["digits"].to_string(), unit, kind)
                }
                None => {
                    idx += 1;
                    continue;
                }
            },
            TokenKind::Word => match SUFFIXED_NUMBER.captures(&token.text) {
                Some(caps) => (
                    caps["digits"].to_string(),
                    word_unit(&caps["unit"]),
                    NumericKind::Currency,
                ),
                None => {
                    idx += 1;
                    continue;
                }
            },
            _ => {
                idx += 1;
                continue;
            }
        };

        let mut start = idx;
        let mut end = idx + 1;
        let mut multiplier = 1.0;

        if kind == NumericKind::Number {
            // "USD 100"
            if let Some(p) = prev_word(tokens, idx, floor) {
                if let Some(u) = word_unit(&tokens[p].text) {
                    unit = Some(u);
                    kind = NumericKind::Currency;
                    start = p;
                }
            }
        }

        if kind != NumericKind::Percentage {
            if let Some(n) = next_word(tokens, end) {
                if is_percent_word(&tokens[n]) && kind == NumericKind::Number {
                    kind = NumericKind::Percentage;
                    unit = Some("%");
                    end = n + 1;
                } else if let Some((scale, implied)) = scale_word(&tokens[n].text) {
                    multiplier = scale;
                    end = n + 1;
                    if unit.is_none() {
                        if let Some(u) = implied {
                            unit = Some(u);
                            kind = NumericKind::Currency;
                        }
                    }
                }
            }
            if kind != NumericKind::Percentage {
                if let Some(n) = next_word(tokens, end) {
                    if let Some(u) = word_unit(&tokens[n].text) {
                        if unit.is_none() || unit == Some(u) {
                            unit = Some(u);
                            kind = NumericKind::Currency;
                            end = n + 1;
                        }
                    }
                }
            }
        }

        let dot_groups = unit == Some("vnd");
        let value = parse_number(&digits, dot_groups).map(|v| v * multiplier);
        let text: String = tokens[start..end].iter().map(|t| t.text.as_str()).collect();

        found.push(NumericOccurrence {
            kind,
            unit,
            value,
            text,
            tokens: start..end,
        });
        idx = end;
        floor = end;
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenize::tokenize;

    fn numbers(text: &str) -> Vec<(NumericKind, Option<&'static str>, Option<f64>, String)> {
        find_numbers(&tokenize(text))
            .into_iter()
            .map(|o| (o.kind, o.unit, o.value, o.text))
            .collect()
    }

    #[test]
    fn parse_grouping_and_decimals() {
        assert_eq!(parse_number("1,000", false), Some(1000.0));
        assert_eq!(parse_number("1,000,000.50", false), Some(1_000_000.5));
        assert_eq!(parse_number("1.000.000,50", false), Some(1_000_000.5));
        assert_eq!(parse_number("3,5", false), Some(3.5));
        assert_eq!(parse_number("12.75", false), Some(12.75));
        assert_eq!(parse_number("1.000.000", false), Some(1_000_000.0));
        assert_eq!(parse_number("1.500", false), Some(1.5));
        assert_eq!(parse_number("1.500", true), Some(1500.0));
        assert_eq!(parse_number("1,2,3", false), None);
    }

    #[test]
    fn currency_symbols_and_percent() {
        let got = numbers("Fee $1,250.00 plus 15% and €40");
        assert_eq!(
            got,
            vec![
                (NumericKind::Currency, Some("usd"), Some(1250.0), "$1,250.00".to_string()),
                (NumericKind::Percentage, Some("%"), Some(15.0), "15%".to_string()),
                (NumericKind::Currency, Some("eur"), Some(40.0), "€40".to_string()),
            ]
        );
    }

    #[test]
    fn unit_words_attach() {
        let got = numbers("Giá 1.500.000 đồng, or USD 200, or 5 triệu");
        assert_eq!(got.len(), 3);
        assert_eq!(got[0].0, NumericKind::Currency);
        assert_eq!(got[0].2, Some(1_500_000.0));
        assert_eq!(got[0].3, "1.500.000 đồng");
        assert_eq!(got[1].1, Some("usd"));
        assert_eq!(got[1].3, "USD 200");
        assert_eq!(got[2].1, Some("vnd"));
        assert_eq!(got[2].2, Some(5_000_000.0));
    }

    #[test]
    fn spaced_percent_and_plain_numbers() {
        let got = numbers("rate 7 % over 30 days");
        assert_eq!(got[0].0, NumericKind::Percentage);
        assert_eq!(got[0].3, "7 %");
        assert_eq!(got[1].0, NumericKind::Number);
        assert_eq!(got[1].2, Some(30.0));
    }

    #[test]
    fn suffixed_word_currency() {
        let got = numbers("price 500USD");
        assert_eq!(got[0].0, NumericKind::Currency);
        assert_eq!(got[0].1, Some("usd"));
    }

    #[test]
    fn equal_quantities_share_a_key() {
        let a = find_numbers(&tokenize("$100"));
        let b = find_numbers(&tokenize("$100.00"));
        assert_eq!(a[0].key(), b[0].key());
    }

    #[test]
    fn change_serializes_without_missing_side() {
        let change = NumericChange {
            kind: NumericKind::Number,
            old: None,
            new: Some("30".into()),
        };
        let json = serde_json::to_string(&change).unwrap();
        assert_eq!(json, r#"{"kind":"number","new":"30"}"#);
    }
}

//! Delta codec
//!
//! A delta is a compact, TAB-separated rendering of an edit script against
//! a known source text: `=n` keeps n codepoints, `-n` drops n codepoints,
//! and `+text` inserts percent-encoded text. Unlike the patch format it
//! carries no context, so it only round-trips against the exact source.

use crate::diff::Diff;
use crate::utils::{self, DecodeError};
use thiserror::Error;

/// Failure to parse a delta string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseDeltaError {
    #[error("invalid operation {0:?} in delta")]
    InvalidOperation(char),
    #[error("invalid count {0:?} in delta")]
    InvalidCount(String),
    #[error("invalid percent-encoding in delta payload")]
    InvalidPercentEncoding,
    #[error("delta payload is not valid UTF-8")]
    InvalidUtf8,
    #[error("delta consumes {wanted} codepoints but only {available} remain")]
    SourceOverrun { wanted: usize, available: usize },
    #[error("delta consumed {consumed} of {len} source codepoints")]
    LengthMismatch { consumed: usize, len: usize },
}

/// Crush a diff into an encoded string.
///
/// Operations are tab-separated; inserted text is escaped using %xx
/// notation.
pub fn diff_to_delta(diffs: &[Diff]) -> String {
    let mut tokens = Vec::with_capacity(diffs.len());
    for diff in diffs {
        match diff {
            Diff::Insert(text) => tokens.push(format!("+{}", utils::percent_encode(text))),
            Diff::Delete(text) => tokens.push(format!("-{}", utils::char_len(text))),
            Diff::Equal(text) => tokens.push(format!("={}", utils::char_len(text))),
        }
    }
    tokens.join("\t")
}

/// Given the original `text1` and an encoded delta, recover the full diff.
pub fn diff_from_delta(text1: &str, delta: &str) -> Result<Vec<Diff>, ParseDeltaError> {
    let chars: Vec<char> = text1.chars().collect();
    let mut diffs = Vec::new();
    // Cursor in text1, in codepoints.
    let mut pointer = 0;

    for token in delta.split('\t') {
        if token.is_empty() {
            // Blank tokens are ok (from a trailing \t).
            continue;
        }
        // Each token begins with a one-character parameter specifying the
        // operation of this token.
        let mut token_chars = token.chars();
        let op = match token_chars.next() {
            Some(op) => op,
            None => continue,
        };
        let param = token_chars.as_str();
        match op {
            '+' => {
                let text = utils::percent_decode(param).map_err(|e| match e {
                    DecodeError::InvalidEscape => ParseDeltaError::InvalidPercentEncoding,
                    DecodeError::InvalidUtf8 => ParseDeltaError::InvalidUtf8,
                })?;
                diffs.push(Diff::Insert(text));
            }
            '=' | '-' => {
                let n: usize = param
                    .parse()
                    .map_err(|_| ParseDeltaError::InvalidCount(param.to_string()))?;
                if pointer + n > chars.len() {
                    return Err(ParseDeltaError::SourceOverrun {
                        wanted: n,
                        available: chars.len() - pointer,
                    });
                }
                let text: String = chars[pointer..pointer + n].iter().collect();
                pointer += n;
                if op == '=' {
                    diffs.push(Diff::Equal(text));
                } else {
                    diffs.push(Diff::Delete(text));
                }
            }
            op => return Err(ParseDeltaError::InvalidOperation(op)),
        }
    }

    if pointer != chars.len() {
        return Err(ParseDeltaError::LengthMismatch {
            consumed: pointer,
            len: chars.len(),
        });
    }
    Ok(diffs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff_text1;

    #[test]
    fn test_delta_round_trip() {
        let diffs = vec![
            Diff::Equal("jump".to_string()),
            Diff::Delete("s".to_string()),
            Diff::Insert("ed".to_string()),
            Diff::Equal(" over ".to_string()),
            Diff::Delete("the".to_string()),
            Diff::Insert("a".to_string()),
            Diff::Equal(" lazy".to_string()),
            Diff::Insert("old dog".to_string()),
        ];
        let text1 = diff_text1(&diffs);
        assert_eq!(text1, "jumps over the lazy");

        let delta = diff_to_delta(&diffs);
        assert_eq!(delta, "=4\t-1\t+ed\t=6\t-3\t+a\t=5\t+old dog");

        assert_eq!(diff_from_delta(&text1, &delta), Ok(diffs));
    }

    #[test]
    fn test_delta_length_mismatch() {
        let diffs = vec![
            Diff::Equal("jump".to_string()),
            Diff::Delete("s".to_string()),
            Diff::Insert("ed".to_string()),
        ];
        let text1 = diff_text1(&diffs);
        let delta = diff_to_delta(&diffs);

        // Too long (5 > 4 consumed).
        let long = format!("{text1}x");
        assert_eq!(
            diff_from_delta(&long, &delta),
            Err(ParseDeltaError::LengthMismatch { consumed: 5, len: 6 })
        );

        // Too short.
        assert_eq!(
            diff_from_delta(&text1[1..], &delta),
            Err(ParseDeltaError::SourceOverrun {
                wanted: 1,
                available: 0
            })
        );
    }

    #[test]
    fn test_delta_malformed() {
        assert_eq!(
            diff_from_delta("", "+%c3%xy"),
            Err(ParseDeltaError::InvalidPercentEncoding)
        );
        assert_eq!(
            diff_from_delta("", "+%c3xy"),
            Err(ParseDeltaError::InvalidUtf8)
        );
        assert_eq!(
            diff_from_delta("a", "x1"),
            Err(ParseDeltaError::InvalidOperation('x'))
        );
        assert_eq!(
            diff_from_delta("a", "=1x"),
            Err(ParseDeltaError::InvalidCount("1x".to_string()))
        );
        assert_eq!(
            diff_from_delta("a", "=-1"),
            Err(ParseDeltaError::InvalidCount("-1".to_string()))
        );
    }

    #[test]
    fn test_delta_special_characters() {
        let diffs = vec![
            Diff::Equal("\u{0680} \u{0} \t %".to_string()),
            Diff::Delete("\u{0681} \u{1} \n ^".to_string()),
            Diff::Insert("\u{0682} \u{2} \\ |".to_string()),
        ];
        let text1 = diff_text1(&diffs);
        assert_eq!(text1, "\u{0680} \u{0} \t %\u{0681} \u{1} \n ^");

        let delta = diff_to_delta(&diffs);
        assert_eq!(delta, "=7\t-7\t+%da%82 %02 %5c %7c");

        assert_eq!(diff_from_delta(&text1, &delta), Ok(diffs));
    }

    #[test]
    fn test_delta_unchanged_character_pool() {
        let diffs = vec![Diff::Insert(
            "A-Z a-z 0-9 - _ . ! ~ * ' ( ) ; / ? : @ & = + $ , # ".to_string(),
        )];
        let delta = diff_to_delta(&diffs);
        assert_eq!(delta, "+A-Z a-z 0-9 - _ . ! ~ * ' ( ) ; / ? : @ & = + $ , # ");
        assert_eq!(diff_from_delta("", &delta), Ok(diffs));
    }

    #[test]
    fn test_delta_trailing_tab() {
        assert_eq!(
            diff_from_delta("ab", "=2\t"),
            Ok(vec![Diff::Equal("ab".to_string())])
        );
    }
}

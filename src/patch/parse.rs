//! Parse a patch list from its textual form

use super::Patch;
use crate::diff::Diff;
use crate::utils;
use thiserror::Error;

/// Failure to parse patch text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParsePatchError {
    #[error("invalid patch header: {0:?}")]
    InvalidHeader(String),
    #[error("invalid line prefix {0:?} in patch body")]
    InvalidLinePrefix(char),
    #[error("invalid percent-encoding in patch body")]
    InvalidPercentEncoding,
    #[error("unexpected end of patch text")]
    UnexpectedEof,
}

/// Parse a textual representation of patches and return the patch list.
pub fn patch_from_text(input: &str) -> Result<Vec<Patch>, ParsePatchError> {
    let mut patches = Vec::new();
    let mut lines = input.split('\n').peekable();

    while let Some(&line) = lines.peek() {
        if line.is_empty() {
            lines.next();
            continue;
        }
        let (start1, length1, start2, length2) = hunk_header(line)?;
        lines.next();

        let mut diffs = Vec::new();
        while let Some(&line) = lines.peek() {
            if line.starts_with('@') {
                break;
            }
            if line.is_empty() {
                lines.next();
                continue;
            }
            let mut chars = line.chars();
            let sign = match chars.next() {
                Some(sign) => sign,
                None => break,
            };
            let text = utils::percent_decode(chars.as_str())
                .map_err(|_| ParsePatchError::InvalidPercentEncoding)?;
            match sign {
                ' ' => diffs.push(Diff::Equal(text)),
                '-' => diffs.push(Diff::Delete(text)),
                '+' => diffs.push(Diff::Insert(text)),
                sign => return Err(ParsePatchError::InvalidLinePrefix(sign)),
            }
            lines.next();
        }

        if diffs.is_empty() && lines.peek().is_none() {
            // A header with no body means the input was cut short.
            return Err(ParsePatchError::UnexpectedEof);
        }

        patches.push(Patch {
            diffs,
            start1,
            start2,
            length1,
            length2,
        });
    }

    Ok(patches)
}

// Parse `@@ -A +B @@` where A and B are `n` or `n,m`.
fn hunk_header(line: &str) -> Result<(usize, usize, usize, usize), ParsePatchError> {
    let invalid = || ParsePatchError::InvalidHeader(line.to_string());

    let ranges = line
        .strip_prefix("@@ -")
        .and_then(|rest| rest.strip_suffix(" @@"))
        .ok_or_else(invalid)?;
    let (range1, range2) = ranges.split_once(" +").ok_or_else(invalid)?;
    let (start1, length1) = range(range1).ok_or_else(invalid)?;
    let (start2, length2) = range(range2).ok_or_else(invalid)?;
    Ok((start1, length1, start2, length2))
}

// A zero length keeps its raw start; otherwise the start is one-based and a
// missing length means 1.
fn range(s: &str) -> Option<(usize, usize)> {
    match s.split_once(',') {
        Some((start, length)) => {
            let start: usize = start.parse().ok()?;
            let length: usize = length.parse().ok()?;
            if length == 0 {
                Some((start, 0))
            } else {
                Some((start.checked_sub(1)?, length))
            }
        }
        None => {
            let start: usize = s.parse().ok()?;
            Some((start.checked_sub(1)?, 1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::patch_to_text;

    #[test]
    fn test_patch_from_text() {
        assert_eq!(patch_from_text(""), Ok(Vec::new()));

        let text = "@@ -21,18 +22,17 @@\n jump\n-s\n+ed\n  over \n-the\n+a\n %0alaz\n";
        let patches = patch_from_text(text).expect("valid patch text");
        assert_eq!(patches[0].to_string(), text);

        let patches = patch_from_text("@@ -1 +1 @@\n-a\n+b\n").expect("valid patch text");
        assert_eq!(patches[0].to_string(), "@@ -1 +1 @@\n-a\n+b\n");
        assert_eq!(patches[0].start1, 0);
        assert_eq!(patches[0].length1, 1);

        let patches = patch_from_text("@@ -1,3 +0,0 @@\n-abc\n").expect("valid patch text");
        assert_eq!(patches[0].to_string(), "@@ -1,3 +0,0 @@\n-abc\n");

        let patches = patch_from_text("@@ -0,0 +1,3 @@\n+abc\n").expect("valid patch text");
        assert_eq!(patches[0].to_string(), "@@ -0,0 +1,3 @@\n+abc\n");
    }

    #[test]
    fn test_patch_from_text_errors() {
        assert_eq!(
            patch_from_text("Bad\nPatch\n"),
            Err(ParsePatchError::InvalidHeader("Bad".to_string()))
        );
        assert_eq!(
            patch_from_text("@@ -1 +1 @@\nxab\n"),
            Err(ParsePatchError::InvalidLinePrefix('x'))
        );
        assert_eq!(
            patch_from_text("@@ -1 +1 @@\n-a\n+%zz\n"),
            Err(ParsePatchError::InvalidPercentEncoding)
        );
    }

    #[test]
    fn test_patch_from_text_truncated() {
        // A header with no body lines before the input ends.
        assert_eq!(
            patch_from_text("@@ -1 +1 @@\n"),
            Err(ParsePatchError::UnexpectedEof)
        );
        assert_eq!(
            patch_from_text("@@ -1 +1 @@"),
            Err(ParsePatchError::UnexpectedEof)
        );
        assert_eq!(
            patch_from_text("@@ -1,2 +1,2 @@\n ab\n@@ -7 +7 @@\n"),
            Err(ParsePatchError::UnexpectedEof)
        );
    }

    #[test]
    fn test_patch_from_text_multiple_hunks() {
        let text = "@@ -1,8 +1,7 @@\n Th\n-at\n+e\n  qui\n@@ -21,17 +21,18 @@\n jump\n-ed\n+s\n  over \n-a\n+the\n  laz\n";
        let patches = patch_from_text(text).expect("valid patch text");
        assert_eq!(patches.len(), 2);
        assert_eq!(patch_to_text(&patches), text);
    }
}

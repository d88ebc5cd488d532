//! Emit a patch list in its textual form

use super::Patch;
use crate::diff::Diff;
use crate::utils;
use std::fmt;

/// Serialize a list of patches to its textual form.
///
/// The output looks like unified diff headers over percent-encoded
/// codepoint payloads and is parsed back by
/// [`patch_from_text`](super::patch_from_text).
pub fn patch_to_text(patches: &[Patch]) -> String {
    patches.iter().map(Patch::to_string).collect()
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "@@ -{} +{} @@",
            Coordinates::new(self.start1, self.length1),
            Coordinates::new(self.start2, self.length2)
        )?;
        for diff in &self.diffs {
            let sign = match diff {
                Diff::Equal(_) => ' ',
                Diff::Delete(_) => '-',
                Diff::Insert(_) => '+',
            };
            writeln!(f, "{}{}", sign, utils::percent_encode(diff.text()))?;
        }
        Ok(())
    }
}

// One side of a hunk header. Zero-length windows keep their raw start;
// otherwise the start is one-based and a `,1` length is left implicit.
struct Coordinates {
    start: usize,
    length: usize,
}

impl Coordinates {
    fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.length {
            0 => write!(f, "{},0", self.start),
            1 => write!(f, "{}", self.start + 1),
            length => write!(f, "{},{}", self.start + 1, length),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::patch_from_text;

    #[test]
    fn test_patch_display() {
        let patch = Patch {
            start1: 20,
            start2: 21,
            length1: 18,
            length2: 17,
            diffs: vec![
                Diff::Equal("jump".to_string()),
                Diff::Delete("s".to_string()),
                Diff::Insert("ed".to_string()),
                Diff::Equal(" over ".to_string()),
                Diff::Delete("the".to_string()),
                Diff::Insert("a".to_string()),
                Diff::Equal("\nlaz".to_string()),
            ],
        };
        assert_eq!(
            patch.to_string(),
            "@@ -21,18 +22,17 @@\n jump\n-s\n+ed\n  over \n-the\n+a\n %0alaz\n"
        );
    }

    #[test]
    fn test_patch_to_text_round_trip() {
        let text = "@@ -21,18 +22,17 @@\n jump\n-s\n+ed\n  over \n-the\n+a\n  laz\n";
        let patches = patch_from_text(text).expect("valid patch text");
        assert_eq!(patch_to_text(&patches), text);

        let text = "@@ -1,9 +1,9 @@\n-f\n+F\n oo+fooba\n@@ -7,9 +7,9 @@\n obar\n-,\n+.\n  tes\n";
        let patches = patch_from_text(text).expect("valid patch text");
        assert_eq!(patch_to_text(&patches), text);
    }
}

//! Best-effort patch application
//!
//! Each hunk is re-located in the (possibly drifted) target text with the
//! fuzzy matcher, then either spliced straight in on a perfect context
//! match or reconciled through a fresh diff of the expected vs. actual
//! window. Application never fails as a whole; the caller gets a flag per
//! hunk.

use crate::diff::{self, Diff};
use crate::options::Options;
use crate::patch::Patch;
use crate::utils;
use tracing::debug;

// Sentinel codepoints prepended and appended to the text so that edge
// hunks have context to anchor to.
const PADDING: [char; 4] = ['\u{1}', '\u{2}', '\u{3}', '\u{4}'];

/// Merge a list of patches onto `text`, with default options.
///
/// Returns the patched text and a flag per hunk indicating whether it
/// could be applied.
pub fn patch_apply(patches: &[Patch], text: &str) -> (String, Vec<bool>) {
    Options::default().patch_apply(patches, text)
}

impl Options {
    /// Merge a list of patches onto `text` under this configuration.
    pub fn patch_apply(&self, patches: &[Patch], text: &str) -> (String, Vec<bool>) {
        if patches.is_empty() {
            return (text.to_string(), Vec::new());
        }

        // Deep copy the patches so that no changes are made to the
        // originals.
        let mut patches = patches.to_vec();

        let null_padding = self.patch_add_padding(&mut patches);
        let mut text: Vec<char> = null_padding
            .iter()
            .copied()
            .chain(text.chars())
            .chain(null_padding.iter().copied())
            .collect();
        self.patch_split_max(&mut patches);

        // delta keeps track of the offset between the expected and actual
        // location of the previous patch. If there are patches expected at
        // positions 10 and 20, but the first patch was found at 12, delta
        // is 2 and the second patch has an effective expected position of
        // 22.
        let mut delta: isize = 0;
        let mut results = vec![false; patches.len()];
        for (x, patch) in patches.iter().enumerate() {
            let expected_loc = (patch.start2 as isize + delta).max(0) as usize;
            let text1: Vec<char> = diff::diff_text1(&patch.diffs).chars().collect();
            let mut start_loc;
            let mut end_loc = None;
            if text1.len() > self.match_max_bits {
                // patch_split_max only leaves an oversized pattern behind
                // for a monster delete; anchor on its head and tail.
                start_loc = self.match_chars(&text, &text1[..self.match_max_bits], expected_loc);
                if start_loc.is_some() {
                    end_loc = self.match_chars(
                        &text,
                        &text1[text1.len() - self.match_max_bits..],
                        expected_loc + text1.len() - self.match_max_bits,
                    );
                    match (start_loc, end_loc) {
                        (Some(start), Some(end)) if start < end => {}
                        // Can't find a valid trailing context. Drop this
                        // patch.
                        _ => start_loc = None,
                    }
                }
            } else {
                start_loc = self.match_chars(&text, &text1, expected_loc);
            }
            let start_loc = match start_loc {
                None => {
                    // No match found. :(
                    debug!(hunk = x, expected_loc, "hunk context not found");
                    // Subtract the delta for this failed patch from
                    // subsequent patches.
                    delta -= patch.length2 as isize - patch.length1 as isize;
                    continue;
                }
                Some(start_loc) => start_loc,
            };

            // Found a match. :)
            debug!(hunk = x, expected_loc, start_loc, "hunk anchored");
            results[x] = true;
            delta = start_loc as isize - expected_loc as isize;
            let end = match end_loc {
                None => (start_loc + text1.len()).min(text.len()),
                Some(end_loc) => (end_loc + self.match_max_bits).min(text.len()),
            };
            let text2 = &text[start_loc..end];
            if text1 == text2 {
                // Perfect match, just shove the replacement text in.
                let replacement: Vec<char> = diff::diff_text2(&patch.diffs).chars().collect();
                text.splice(start_loc..start_loc + text1.len(), replacement);
            } else {
                // Imperfect match. Run a diff to get a framework of
                // equivalent indices.
                let text1_str = diff::string_of(&text1);
                let text2_str = diff::string_of(text2);
                let mut diffs = self.diff_main(&text1_str, &text2_str, false);
                if text1.len() > self.match_max_bits
                    && diff::diff_levenshtein(&diffs) as f64 / text1.len() as f64
                        > self.patch_delete_threshold
                {
                    // The end points match, but the content is unacceptably
                    // bad.
                    results[x] = false;
                } else {
                    diff::cleanup_semantic_lossless(&mut diffs);
                    let mut index1 = 0;
                    for d in &patch.diffs {
                        if !matches!(d, Diff::Equal(_)) {
                            let index2 = diff::diff_x_index(&diffs, index1);
                            match d {
                                Diff::Insert(inserted) => {
                                    text.splice(
                                        start_loc + index2..start_loc + index2,
                                        inserted.chars(),
                                    );
                                }
                                Diff::Delete(deleted) => {
                                    let deletion_end = diff::diff_x_index(
                                        &diffs,
                                        index1 + utils::char_len(deleted),
                                    );
                                    text.drain(start_loc + index2..start_loc + deletion_end);
                                }
                                Diff::Equal(_) => {}
                            }
                        }
                        if !matches!(d, Diff::Delete(_)) {
                            index1 += d.char_len();
                        }
                    }
                }
            }
        }

        // Strip the padding off.
        let padding_len = null_padding.len();
        let patched: String = text[padding_len..text.len() - padding_len].iter().collect();
        (patched, results)
    }

    /// Add some padding on text start and end so that edges can match
    /// something. Returns the padding added to each end.
    pub(crate) fn patch_add_padding(&self, patches: &mut [Patch]) -> Vec<char> {
        let padding_length = self.patch_margin;
        let null_padding: Vec<char> = PADDING.iter().copied().cycle().take(padding_length).collect();
        let null_padding_str: String = null_padding.iter().collect();

        // Bump all the patches forward.
        for patch in patches.iter_mut() {
            patch.start1 += padding_length;
            patch.start2 += padding_length;
        }

        // Add some padding on the start of the first diff.
        if let Some(patch) = patches.first_mut() {
            let needs_leading_equal = !matches!(patch.diffs.first(), Some(Diff::Equal(_)));
            if needs_leading_equal {
                patch.diffs.insert(0, Diff::Equal(null_padding_str.clone()));
                patch.start1 -= padding_length; // Should be 0.
                patch.start2 -= padding_length; // Should be 0.
                patch.length1 += padding_length;
                patch.length2 += padding_length;
            } else if let Some(Diff::Equal(text)) = patch.diffs.first_mut() {
                let existing = utils::char_len(text);
                if padding_length > existing {
                    // Grow first equality.
                    let extra = padding_length - existing;
                    let mut grown: String =
                        null_padding[existing..].iter().collect();
                    grown.push_str(text);
                    *text = grown;
                    patch.start1 -= extra;
                    patch.start2 -= extra;
                    patch.length1 += extra;
                    patch.length2 += extra;
                }
            }
        }

        // Add some padding on the end of the last diff.
        if let Some(patch) = patches.last_mut() {
            let needs_trailing_equal = !matches!(patch.diffs.last(), Some(Diff::Equal(_)));
            if needs_trailing_equal {
                patch.diffs.push(Diff::Equal(null_padding_str));
                patch.length1 += padding_length;
                patch.length2 += padding_length;
            } else if let Some(Diff::Equal(text)) = patch.diffs.last_mut() {
                let existing = utils::char_len(text);
                if padding_length > existing {
                    // Grow last equality.
                    let extra = padding_length - existing;
                    let grown: String = null_padding[..extra].iter().collect();
                    text.push_str(&grown);
                    patch.length1 += extra;
                    patch.length2 += extra;
                }
            }
        }

        null_padding
    }

    /// Look through the patches and break up any which are longer than the
    /// maximum width of the match algorithm, keeping `patch_margin` context
    /// between the pieces.
    pub(crate) fn patch_split_max(&self, patches: &mut Vec<Patch>) {
        let patch_size = self.match_max_bits;
        let mut x = 0;
        while x < patches.len() {
            if patches[x].length1 <= patch_size {
                x += 1;
                continue;
            }
            let mut bigpatch = patches.remove(x);
            let mut start1 = bigpatch.start1;
            let mut start2 = bigpatch.start2;
            let mut precontext: Vec<char> = Vec::new();
            while !bigpatch.diffs.is_empty() {
                // Create one of several smaller patches.
                let mut patch = Patch::default();
                let mut empty = true;
                patch.start1 = start1 - precontext.len();
                patch.start2 = start2 - precontext.len();
                if !precontext.is_empty() {
                    patch.length1 = precontext.len();
                    patch.length2 = precontext.len();
                    patch.diffs.push(Diff::Equal(diff::string_of(&precontext)));
                }
                while !bigpatch.diffs.is_empty()
                    && patch.length1 < patch_size.saturating_sub(self.patch_margin)
                {
                    let diff_length = bigpatch.diffs[0].char_len();
                    let is_insert = matches!(bigpatch.diffs[0], Diff::Insert(_));
                    let is_equal = matches!(bigpatch.diffs[0], Diff::Equal(_));
                    if is_insert {
                        // Insertions are harmless.
                        patch.length2 += diff_length;
                        start2 += diff_length;
                        patch.diffs.push(bigpatch.diffs.remove(0));
                        empty = false;
                    } else if !is_equal
                        && patch.diffs.len() == 1
                        && matches!(patch.diffs[0], Diff::Equal(_))
                        && diff_length > 2 * patch_size
                    {
                        // This is a large deletion. Let it pass in one
                        // chunk.
                        patch.length1 += diff_length;
                        start1 += diff_length;
                        empty = false;
                        patch.diffs.push(bigpatch.diffs.remove(0));
                    } else {
                        // Deletion or equality. Only take as much as we can
                        // stomach.
                        let keep =
                            diff_length.min(patch_size - patch.length1 - self.patch_margin);
                        let keep_byte = utils::char_to_byte(bigpatch.diffs[0].text(), keep);
                        let taken = bigpatch.diffs[0].text()[..keep_byte].to_string();
                        patch.length1 += keep;
                        start1 += keep;
                        if is_equal {
                            patch.length2 += keep;
                            start2 += keep;
                            patch.diffs.push(Diff::Equal(taken.clone()));
                        } else {
                            empty = false;
                            patch.diffs.push(Diff::Delete(taken.clone()));
                        }
                        if taken == bigpatch.diffs[0].text() {
                            bigpatch.diffs.remove(0);
                        } else {
                            let rest = bigpatch.diffs[0].text()[keep_byte..].to_string();
                            bigpatch.diffs[0].set_text(rest);
                        }
                    }
                }
                // Compute the head context for the next patch.
                precontext = diff::diff_text2(&patch.diffs).chars().collect();
                let skip = precontext.len().saturating_sub(self.patch_margin);
                precontext.drain(..skip);
                // Append the end context for this patch.
                let text1: Vec<char> = diff::diff_text1(&bigpatch.diffs).chars().collect();
                let postcontext = &text1[..self.patch_margin.min(text1.len())];
                if !postcontext.is_empty() {
                    patch.length1 += postcontext.len();
                    patch.length2 += postcontext.len();
                    match patch.diffs.last_mut() {
                        Some(Diff::Equal(text)) => {
                            text.push_str(&diff::string_of(postcontext));
                        }
                        _ => patch.diffs.push(Diff::Equal(diff::string_of(postcontext))),
                    }
                }
                if !empty {
                    patches.insert(x, patch);
                    x += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{patch_from_text, patch_make, patch_to_text};

    #[test]
    fn test_patch_add_padding() {
        let options = Options::default();

        // Both edges full.
        let mut patches = patch_make("", "test");
        assert_eq!(patch_to_text(&patches), "@@ -0,0 +1,4 @@\n+test\n");
        options.patch_add_padding(&mut patches);
        assert_eq!(
            patch_to_text(&patches),
            "@@ -1,8 +1,12 @@\n %01%02%03%04\n+test\n %01%02%03%04\n"
        );

        // Both edges partial.
        let mut patches = patch_make("XY", "XtestY");
        assert_eq!(patch_to_text(&patches), "@@ -1,2 +1,6 @@\n X\n+test\n Y\n");
        options.patch_add_padding(&mut patches);
        assert_eq!(
            patch_to_text(&patches),
            "@@ -2,8 +2,12 @@\n %02%03%04X\n+test\n Y%01%02%03\n"
        );

        // Both edges none.
        let mut patches = patch_make("XXXXYYYY", "XXXXtestYYYY");
        assert_eq!(
            patch_to_text(&patches),
            "@@ -1,8 +1,12 @@\n XXXX\n+test\n YYYY\n"
        );
        options.patch_add_padding(&mut patches);
        assert_eq!(
            patch_to_text(&patches),
            "@@ -5,8 +5,12 @@\n XXXX\n+test\n YYYY\n"
        );
    }

    #[test]
    fn test_patch_split_max() {
        // Assumes that match_max_bits is 32.
        let options = Options::default();

        let mut patches = patch_make(
            "abcdefghijklmnopqrstuvwxyz01234567890",
            "XabXcdXefXghXijXklXmnXopXqrXstXuvXwxXyzX01X23X45X67X89X0",
        );
        options.patch_split_max(&mut patches);
        assert_eq!(
            patch_to_text(&patches),
            "@@ -1,32 +1,46 @@\n+X\n ab\n+X\n cd\n+X\n ef\n+X\n gh\n+X\n ij\n+X\n kl\n+X\n mn\n+X\n op\n+X\n qr\n+X\n st\n+X\n uv\n+X\n wx\n+X\n yz\n+X\n 012345\n@@ -25,13 +39,18 @@\n zX01\n+X\n 23\n+X\n 45\n+X\n 67\n+X\n 89\n+X\n 0\n"
        );

        let mut patches = patch_make(
            "abcdef1234567890123456789012345678901234567890123456789012345678901234567890uvwxyz",
            "abcdefuvwxyz",
        );
        let old_text = patch_to_text(&patches);
        options.patch_split_max(&mut patches);
        assert_eq!(patch_to_text(&patches), old_text);

        let mut patches = patch_make(
            "1234567890123456789012345678901234567890123456789012345678901234567890",
            "abc",
        );
        options.patch_split_max(&mut patches);
        assert_eq!(
            patch_to_text(&patches),
            "@@ -1,32 +1,4 @@\n-1234567890123456789012345678\n 9012\n@@ -29,32 +1,4 @@\n-9012345678901234567890123456\n 7890\n@@ -57,14 +1,3 @@\n-78901234567890\n+abc\n"
        );

        let mut patches = patch_make(
            "abcdefghij , h : 0 , t : 1 abcdefghij , h : 0 , t : 1 abcdefghij , h : 0 , t : 1",
            "abcdefghij , h : 1 , t : 1 abcdefghij , h : 1 , t : 1 abcdefghij , h : 0 , t : 1",
        );
        options.patch_split_max(&mut patches);
        assert_eq!(
            patch_to_text(&patches),
            "@@ -2,32 +2,32 @@\n bcdefghij , h : \n-0\n+1\n  , t : 1 abcdef\n@@ -29,32 +29,32 @@\n bcdefghij , h : \n-0\n+1\n  , t : 1 abcdef\n"
        );
    }

    #[test]
    fn test_patch_apply() {
        let patches = patch_make("", "");
        let (text, results) = patch_apply(&patches, "Hello world.");
        assert_eq!(text, "Hello world.");
        assert_eq!(results, Vec::<bool>::new());

        let patches = patch_make(
            "The quick brown fox jumps over the lazy dog.",
            "That quick brown fox jumped over a lazy dog.",
        );

        // Exact match.
        let (text, results) =
            patch_apply(&patches, "The quick brown fox jumps over the lazy dog.");
        assert_eq!(text, "That quick brown fox jumped over a lazy dog.");
        assert_eq!(results, vec![true, true]);

        // Partial match.
        let (text, results) =
            patch_apply(&patches, "The quick red rabbit jumps over the tired tiger.");
        assert_eq!(text, "That quick red rabbit jumped over a tired tiger.");
        assert_eq!(results, vec![true, true]);

        // Failed match.
        let (text, results) =
            patch_apply(&patches, "I am the very model of a modern major general.");
        assert_eq!(text, "I am the very model of a modern major general.");
        assert_eq!(results, vec![false, false]);
    }

    #[test]
    fn test_patch_apply_big_delete() {
        // Big delete, small change.
        let patches = patch_make(
            "x1234567890123456789012345678901234567890123456789012345678901234567890y",
            "xabcy",
        );
        let (text, results) = patch_apply(
            &patches,
            "x123456789012345678901234567890-----++++++++++-----123456789012345678901234567890y",
        );
        assert_eq!(text, "xabcy");
        assert_eq!(results, vec![true, true]);

        // Big delete, big change, rejected under the default threshold.
        let patches = patch_make(
            "x1234567890123456789012345678901234567890123456789012345678901234567890y",
            "xabcy",
        );
        let (text, results) = patch_apply(
            &patches,
            "x12345678901234567890---------------++++++++++---------------12345678901234567890y",
        );
        assert_eq!(
            text,
            "xabc12345678901234567890---------------++++++++++---------------12345678901234567890y"
        );
        assert_eq!(results, vec![false, true]);

        // Big delete, big change, accepted with a looser delete threshold.
        let mut options = Options::default();
        options.set_patch_delete_threshold(0.6);
        let patches = options.patch_from_texts(
            "x1234567890123456789012345678901234567890123456789012345678901234567890y",
            "xabcy",
        );
        let (text, results) = options.patch_apply(
            &patches,
            "x12345678901234567890---------------++++++++++---------------12345678901234567890y",
        );
        assert_eq!(text, "xabcy");
        assert_eq!(results, vec![true, true]);
    }

    #[test]
    fn test_patch_apply_compensates_for_failed_patch() {
        let mut options = Options::default();
        options.set_match_threshold(0.0).set_match_distance(0);
        let patches = options.patch_from_texts(
            "abcdefghijklmnopqrstuvwxyz--------------------1234567890",
            "abcXXXXXXXXXXdefghijklmnopqrstuvwxyz--------------------1234567YYYYYYYYYY890",
        );
        let (text, results) = options.patch_apply(
            &patches,
            "ABCDEFGHIJKLMNOPQRSTUVWXYZ--------------------1234567890",
        );
        assert_eq!(
            text,
            "ABCDEFGHIJKLMNOPQRSTUVWXYZ--------------------1234567YYYYYYYYYY890"
        );
        assert_eq!(results, vec![false, true]);
    }

    #[test]
    fn test_patch_apply_no_side_effects() {
        let patches = patch_make("", "test");
        let patch_text = patch_to_text(&patches);
        patch_apply(&patches, "");
        assert_eq!(patch_to_text(&patches), patch_text);

        let patches = patch_make("The quick brown fox jumps over the lazy dog.", "Woof");
        let patch_text = patch_to_text(&patches);
        patch_apply(&patches, "The quick brown fox jumps over the lazy dog.");
        assert_eq!(patch_to_text(&patches), patch_text);
    }

    #[test]
    fn test_patch_apply_edge_cases() {
        // Edge exact match.
        let patches = patch_make("", "test");
        let (text, results) = patch_apply(&patches, "");
        assert_eq!(text, "test");
        assert_eq!(results, vec![true]);

        // Near edge exact match.
        let patches = patch_make("XY", "XtestY");
        let (text, results) = patch_apply(&patches, "XY");
        assert_eq!(text, "XtestY");
        assert_eq!(results, vec![true]);

        // Edge partial match.
        let patches = patch_make("y", "y123");
        let (text, results) = patch_apply(&patches, "x");
        assert_eq!(text, "x123");
        assert_eq!(results, vec![true]);
    }

    #[test]
    fn test_patch_apply_from_parsed_text() {
        let source = "The quick brown fox jumps over the lazy dog.";
        let target = "That quick brown fox jumped over a lazy dog.";
        let wire = patch_to_text(&patch_make(source, target));
        let patches = patch_from_text(&wire).expect("valid patch text");
        let (text, results) = patch_apply(&patches, source);
        assert_eq!(text, target);
        assert_eq!(results, vec![true, true]);
    }
}

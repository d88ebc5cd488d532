//! Patch model
//!
//! A patch is a localized hunk of a diff: its edit operations plus up to
//! [`Options::patch_margin`](crate::Options) codepoints of surrounding
//! context, and the source/destination windows the hunk covers. Patches
//! survive context drift: [`patch_apply`](crate::patch_apply) re-locates
//! each hunk with the fuzzy matcher before splicing its edits in.

mod format;
mod parse;

pub use format::patch_to_text;
pub use parse::{patch_from_text, ParsePatchError};

use crate::diff::{self, Diff};
use crate::options::Options;
use crate::utils;

/// One hunk: a window into the source and destination texts plus the edit
/// operations transforming one into the other.
///
/// `start1`/`length1` describe the source window and `start2`/`length2` the
/// destination window, all measured in codepoints.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Patch {
    pub(crate) diffs: Vec<Diff>,
    pub(crate) start1: usize,
    pub(crate) start2: usize,
    pub(crate) length1: usize,
    pub(crate) length2: usize,
}

impl Patch {
    /// The edit operations within this hunk, context included.
    pub fn diffs(&self) -> &[Diff] {
        &self.diffs
    }

    /// Start of the source window, in codepoints.
    pub fn start1(&self) -> usize {
        self.start1
    }

    /// Start of the destination window, in codepoints.
    pub fn start2(&self) -> usize {
        self.start2
    }

    /// Length of the source window, in codepoints.
    pub fn length1(&self) -> usize {
        self.length1
    }

    /// Length of the destination window, in codepoints.
    pub fn length2(&self) -> usize {
        self.length2
    }
}

/// Compute a list of patches turning `text1` into `text2`, with default
/// options.
///
/// ```
/// use mend::{patch_apply, patch_make};
///
/// let text1 = "The quick brown fox jumps over the lazy dog.";
/// let text2 = "That quick brown fox jumped over a lazy dog.";
/// let patches = patch_make(text1, text2);
/// let (patched, results) = patch_apply(&patches, text1);
/// assert_eq!(patched, text2);
/// assert!(results.iter().all(|&applied| applied));
/// ```
pub fn patch_make(text1: &str, text2: &str) -> Vec<Patch> {
    Options::default().patch_from_texts(text1, text2)
}

/// Compute a list of patches from two texts, with default options.
pub fn patch_from_texts(text1: &str, text2: &str) -> Vec<Patch> {
    Options::default().patch_from_texts(text1, text2)
}

/// Compute a list of patches from a diff; the source text is reconstructed
/// from the script.
pub fn patch_from_diffs(diffs: &[Diff]) -> Vec<Patch> {
    Options::default().patch_from_diffs(diffs)
}

/// Compute a list of patches from a source text and a diff over it.
pub fn patch_from_text1_and_diffs(text1: &str, diffs: &[Diff]) -> Vec<Patch> {
    Options::default().patch_from_text1_and_diffs(text1, diffs)
}

impl Options {
    /// Compute a list of patches turning `text1` into `text2`. A diff is
    /// computed internally and run through the semantic and efficiency
    /// cleanups first.
    pub fn patch_from_texts(&self, text1: &str, text2: &str) -> Vec<Patch> {
        let mut diffs = self.diff_main(text1, text2, true);
        if diffs.len() > 2 {
            diff::cleanup_semantic(&mut diffs);
            self.cleanup_efficiency(&mut diffs);
        }
        self.patch_from_text1_and_diffs(text1, &diffs)
    }

    /// Compute a list of patches from a diff alone; the source text is
    /// reconstructed from the script.
    pub fn patch_from_diffs(&self, diffs: &[Diff]) -> Vec<Patch> {
        let text1 = diff::diff_text1(diffs);
        self.patch_from_text1_and_diffs(&text1, diffs)
    }

    /// Compute a list of patches from a source text and a diff over it.
    pub fn patch_from_text1_and_diffs(&self, text1: &str, diffs: &[Diff]) -> Vec<Patch> {
        let mut patches = Vec::new();
        if diffs.is_empty() {
            return patches; // Get rid of the null case.
        }

        let mut patch = Patch::default();
        let mut char_count1 = 0; // Number of codepoints into the text1 string.
        let mut char_count2 = 0; // Number of codepoints into the text2 string.

        // `prepatch` recreates the text1 state the hunk expects; `postpatch`
        // rolls the edits forward so the next hunk's context is drawn from
        // the patched text.
        let mut prepatch: Vec<char> = text1.chars().collect();
        let mut postpatch: Vec<char> = prepatch.clone();

        for (i, diff) in diffs.iter().enumerate() {
            let diff_length = diff.char_len();
            if patch.diffs.is_empty() && !matches!(diff, Diff::Equal(_)) {
                // A new patch starts here.
                patch.start1 = char_count1;
                patch.start2 = char_count2;
            }
            match diff {
                Diff::Insert(text) => {
                    patch.diffs.push(diff.clone());
                    patch.length2 += diff_length;
                    postpatch.splice(char_count2..char_count2, text.chars());
                }
                Diff::Delete(_) => {
                    patch.length1 += diff_length;
                    patch.diffs.push(diff.clone());
                    postpatch.drain(char_count2..char_count2 + diff_length);
                }
                Diff::Equal(_) => {
                    if diff_length <= 2 * self.patch_margin
                        && !patch.diffs.is_empty()
                        && i != diffs.len() - 1
                    {
                        // Small equality inside a patch.
                        patch.diffs.push(diff.clone());
                        patch.length1 += diff_length;
                        patch.length2 += diff_length;
                    }
                    if diff_length >= 2 * self.patch_margin && !patch.diffs.is_empty() {
                        // Time for a new patch.
                        self.patch_add_context(&mut patch, &prepatch);
                        patches.push(std::mem::take(&mut patch));
                        // Unlike Unidiff, our patch lists have a rolling
                        // context. Update prepatch to reflect the application
                        // of the just completed patch.
                        prepatch = postpatch.clone();
                        char_count1 = char_count2;
                    }
                }
            }
            if !matches!(diff, Diff::Insert(_)) {
                char_count1 += diff_length;
            }
            if !matches!(diff, Diff::Delete(_)) {
                char_count2 += diff_length;
            }
        }
        // Pick up the leftover patch if not empty.
        if !patch.diffs.is_empty() {
            self.patch_add_context(&mut patch, &prepatch);
            patches.push(patch);
        }

        patches
    }

    // Increase the context until it is unique, but don't let the pattern
    // expand beyond the width the matcher can scan.
    pub(crate) fn patch_add_context(&self, patch: &mut Patch, text: &[char]) {
        if text.is_empty() {
            return;
        }
        let mut pattern = text[patch.start2..patch.start2 + patch.length1].to_vec();
        let mut padding = 0;

        while utils::index_of(text, &pattern, 0) != utils::last_index_of(text, &pattern, text.len())
            && pattern.len() < self.match_max_bits.saturating_sub(2 * self.patch_margin)
        {
            padding += self.patch_margin;
            let begin = patch.start2.saturating_sub(padding);
            let end = (patch.start2 + patch.length1 + padding).min(text.len());
            pattern = text[begin..end].to_vec();
        }
        // Add one chunk for good luck.
        padding += self.patch_margin;

        // Add the prefix.
        let begin = patch.start2.saturating_sub(padding);
        let prefix = &text[begin..patch.start2];
        if !prefix.is_empty() {
            patch
                .diffs
                .insert(0, Diff::Equal(diff::string_of(prefix)));
        }
        // Add the suffix.
        let end = (patch.start2 + patch.length1 + padding).min(text.len());
        let suffix = &text[patch.start2 + patch.length1..end];
        if !suffix.is_empty() {
            patch.diffs.push(Diff::Equal(diff::string_of(suffix)));
        }

        // Roll back the start points and extend the lengths.
        patch.start1 -= prefix.len();
        patch.start2 -= prefix.len();
        patch.length1 += prefix.len() + suffix.len();
        patch.length2 += prefix.len() + suffix.len();
    }
}

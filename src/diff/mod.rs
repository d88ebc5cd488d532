//! Character-level differencing
//!
//! The entry point is [`diff_main`], which produces an edit script of
//! [`Diff`] operations transforming one text into another. The script is
//! built by Myers' O(ND) bisection over codepoint arrays, fronted by a set
//! of shortcuts (common affixes, containment, half-match, line mode) and
//! followed by a merge cleanup. The semantic and efficiency cleanups are
//! opt-in passes over a finished script.

mod bisect;
mod cleanup;
mod format;
mod lines;


pub use cleanup::{cleanup_efficiency, cleanup_merge, cleanup_semantic, cleanup_semantic_lossless};
pub use format::{diff_pretty_html, DiffFormatter};

use crate::{options::Options, utils};
use std::time::Instant;
use tracing::trace;

/// A single edit operation over a run of codepoints.
///
/// A script like `[Delete("Hello"), Insert("Goodbye"), Equal(" world.")]`
/// means: delete `"Hello"`, add `"Goodbye"`, and keep `" world."`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diff {
    Equal(String),
    Delete(String),
    Insert(String),
}

impl Diff {
    /// The payload carried by this operation.
    pub fn text(&self) -> &str {
        match self {
            Diff::Equal(text) | Diff::Delete(text) | Diff::Insert(text) => text,
        }
    }

    pub(crate) fn set_text(&mut self, new_text: String) {
        match self {
            Diff::Equal(text) | Diff::Delete(text) | Diff::Insert(text) => *text = new_text,
        }
    }

    pub(crate) fn char_len(&self) -> usize {
        utils::char_len(self.text())
    }
}

/// Find the differences between two texts.
///
/// When `check_lines` is true and both texts are over 100 codepoints, a
/// faster line-level diff runs first and its replacement blocks are
/// re-diffed character by character. The speedup can produce a slightly
/// non-minimal script.
///
/// ```
/// use mend::{diff_main, diff_text1, diff_text2};
///
/// let diffs = diff_main("Hello World.", "Goodbye World.", false);
/// assert_eq!(diff_text1(&diffs), "Hello World.");
/// assert_eq!(diff_text2(&diffs), "Goodbye World.");
/// ```
pub fn diff_main(text1: &str, text2: &str, check_lines: bool) -> Vec<Diff> {
    Options::default().diff_main(text1, text2, check_lines)
}

impl Options {
    /// Find the differences between two texts under this configuration.
    ///
    /// See the free function [`diff_main`] for the `check_lines` semantics.
    pub fn diff_main(&self, text1: &str, text2: &str, check_lines: bool) -> Vec<Diff> {
        let deadline = self.diff_timeout.map(|timeout| Instant::now() + timeout);
        let chars1: Vec<char> = text1.chars().collect();
        let chars2: Vec<char> = text2.chars().collect();
        trace!(
            len1 = chars1.len(),
            len2 = chars2.len(),
            check_lines,
            "diffing texts"
        );
        main_chars(self, &chars1, &chars2, check_lines, deadline)
    }
}

pub(crate) fn main_chars(
    options: &Options,
    text1: &[char],
    text2: &[char],
    check_lines: bool,
    deadline: Option<Instant>,
) -> Vec<Diff> {
    if text1 == text2 {
        if text1.is_empty() {
            return Vec::new();
        }
        return vec![Diff::Equal(string_of(text1))];
    }

    // Trim off the common prefix and suffix.
    let prefix_len = common_prefix_chars(text1, text2);
    let prefix = &text1[..prefix_len];
    let (text1, text2) = (&text1[prefix_len..], &text2[prefix_len..]);

    let suffix_len = common_suffix_chars(text1, text2);
    let suffix = &text1[text1.len() - suffix_len..];
    let (text1, text2) = (
        &text1[..text1.len() - suffix_len],
        &text2[..text2.len() - suffix_len],
    );

    // Diff the middle block and restore the affixes.
    let mut diffs = compute(options, text1, text2, check_lines, deadline);
    if !prefix.is_empty() {
        diffs.insert(0, Diff::Equal(string_of(prefix)));
    }
    if !suffix.is_empty() {
        diffs.push(Diff::Equal(string_of(suffix)));
    }
    cleanup_merge(&mut diffs);
    diffs
}

// Assumes the texts share no common prefix or suffix.
fn compute(
    options: &Options,
    text1: &[char],
    text2: &[char],
    check_lines: bool,
    deadline: Option<Instant>,
) -> Vec<Diff> {
    if text1.is_empty() {
        return vec![Diff::Insert(string_of(text2))];
    }
    if text2.is_empty() {
        return vec![Diff::Delete(string_of(text1))];
    }

    let (long, short) = if text1.len() > text2.len() {
        (text1, text2)
    } else {
        (text2, text1)
    };

    if let Some(i) = utils::index_of(long, short, 0) {
        // The shorter text sits inside the longer one.
        let op = if text1.len() > text2.len() {
            Diff::Delete
        } else {
            Diff::Insert
        };
        return vec![
            op(string_of(&long[..i])),
            Diff::Equal(string_of(short)),
            op(string_of(&long[i + short.len()..])),
        ];
    }

    if short.len() == 1 {
        // After the containment check the single codepoint can't be part of
        // an equality.
        return vec![
            Diff::Delete(string_of(text1)),
            Diff::Insert(string_of(text2)),
        ];
    }

    if let Some(hm) = half_match(options, text1, text2) {
        // Diff the two outer pairs and stitch them around the common middle.
        let mut diffs = main_chars(options, &hm.prefix1, &hm.prefix2, check_lines, deadline);
        diffs.push(Diff::Equal(string_of(&hm.common)));
        diffs.extend(main_chars(
            options,
            &hm.suffix1,
            &hm.suffix2,
            check_lines,
            deadline,
        ));
        return diffs;
    }

    if check_lines && text1.len() > 100 && text2.len() > 100 {
        return line_mode(options, text1, text2, deadline);
    }

    bisect::bisect(options, text1, text2, deadline)
}

// Line-level diff first, then rediff the replacement blocks for accuracy.
fn line_mode(
    options: &Options,
    text1: &[char],
    text2: &[char],
    deadline: Option<Instant>,
) -> Vec<Diff> {
    let (chars1, chars2, line_array) = lines::lines_to_chars(text1, text2);
    trace!(lines = line_array.len(), "line-mode diff");

    let mut diffs = main_chars(options, &chars1, &chars2, false, deadline);
    lines::chars_to_lines(&mut diffs, &line_array);
    // Eliminate freak matches such as blank lines.
    cleanup_semantic(&mut diffs);

    // Rediff each replacement block, this time codepoint by codepoint.
    diffs.push(Diff::Equal(String::new()));
    let mut pointer = 0;
    let mut count_delete = 0;
    let mut count_insert = 0;
    let mut text_delete = String::new();
    let mut text_insert = String::new();
    while pointer < diffs.len() {
        match &diffs[pointer] {
            Diff::Insert(text) => {
                count_insert += 1;
                text_insert.push_str(text);
            }
            Diff::Delete(text) => {
                count_delete += 1;
                text_delete.push_str(text);
            }
            Diff::Equal(_) => {
                if count_delete >= 1 && count_insert >= 1 {
                    let sub1: Vec<char> = text_delete.chars().collect();
                    let sub2: Vec<char> = text_insert.chars().collect();
                    let sub_diffs = main_chars(options, &sub1, &sub2, false, deadline);
                    let start = pointer - count_delete - count_insert;
                    let sub_len = sub_diffs.len();
                    diffs.splice(start..pointer, sub_diffs);
                    pointer = start + sub_len;
                }
                count_insert = 0;
                count_delete = 0;
                text_delete.clear();
                text_insert.clear();
            }
        }
        pointer += 1;
    }
    diffs.pop(); // Drop the dummy entry.
    diffs
}

struct HalfMatch {
    prefix1: Vec<char>,
    suffix1: Vec<char>,
    prefix2: Vec<char>,
    suffix2: Vec<char>,
    common: Vec<char>,
}

// Check whether the texts share a substring at least half the length of the
// longer text. Such a split can produce non-minimal diffs, so it is skipped
// when no deadline is configured and optimality is affordable.
fn half_match(options: &Options, text1: &[char], text2: &[char]) -> Option<HalfMatch> {
    if options.diff_timeout.is_none() {
        // With unlimited time, don't risk a non-minimal diff.
        return None;
    }

    let (long, short) = if text1.len() > text2.len() {
        (text1, text2)
    } else {
        (text2, text1)
    };
    if long.len() < 10 || short.len() * 4 < long.len() {
        return None; // Pointless.
    }

    // Seed a match from the second quarter and from the midpoint.
    let hm1 = half_match_at(long, short, (long.len() + 3) / 4);
    let hm2 = half_match_at(long, short, (long.len() + 1) / 2);
    let (long_a, long_b, short_a, short_b, common) = match (hm1, hm2) {
        (None, None) => return None,
        (Some(hm), None) => hm,
        (None, Some(hm)) => hm,
        (Some(hm1), Some(hm2)) => {
            if hm1.4.len() > hm2.4.len() {
                hm1
            } else {
                hm2
            }
        }
    };

    if text1.len() > text2.len() {
        Some(HalfMatch {
            prefix1: long_a,
            suffix1: long_b,
            prefix2: short_a,
            suffix2: short_b,
            common,
        })
    } else {
        Some(HalfMatch {
            prefix1: short_a,
            suffix1: short_b,
            prefix2: long_a,
            suffix2: long_b,
            common,
        })
    }
}

type Halves = (Vec<char>, Vec<char>, Vec<char>, Vec<char>, Vec<char>);

// Does a quarter-length seed starting at long[i] grow into a substring
// covering at least half of the long text?
fn half_match_at(long: &[char], short: &[char], i: usize) -> Option<Halves> {
    let seed = &long[i..i + long.len() / 4];
    let mut best_common: Vec<char> = Vec::new();
    let mut best_long_a = Vec::new();
    let mut best_long_b = Vec::new();
    let mut best_short_a = Vec::new();
    let mut best_short_b = Vec::new();

    let mut j = utils::index_of(short, seed, 0);
    while let Some(found) = j {
        let prefix_len = common_prefix_chars(&long[i..], &short[found..]);
        let suffix_len = common_suffix_chars(&long[..i], &short[..found]);
        if best_common.len() < suffix_len + prefix_len {
            best_common = short[found - suffix_len..found + prefix_len].to_vec();
            best_long_a = long[..i - suffix_len].to_vec();
            best_long_b = long[i + prefix_len..].to_vec();
            best_short_a = short[..found - suffix_len].to_vec();
            best_short_b = short[found + prefix_len..].to_vec();
        }
        j = utils::index_of(short, seed, found + 1);
    }

    if best_common.len() * 2 >= long.len() {
        Some((
            best_long_a,
            best_long_b,
            best_short_a,
            best_short_b,
            best_common,
        ))
    } else {
        None
    }
}

/// Source text of a script: all equalities and deletions.
pub fn diff_text1(diffs: &[Diff]) -> String {
    diffs
        .iter()
        .filter(|diff| !matches!(diff, Diff::Insert(_)))
        .map(Diff::text)
        .collect()
}

/// Destination text of a script: all equalities and insertions.
pub fn diff_text2(diffs: &[Diff]) -> String {
    diffs
        .iter()
        .filter(|diff| !matches!(diff, Diff::Delete(_)))
        .map(Diff::text)
        .collect()
}

/// Number of inserted, deleted, or substituted codepoints; a paired
/// deletion and insertion counts as one substitution.
pub fn diff_levenshtein(diffs: &[Diff]) -> usize {
    let mut levenshtein = 0;
    let mut insertions = 0;
    let mut deletions = 0;
    for diff in diffs {
        match diff {
            Diff::Insert(_) => insertions += diff.char_len(),
            Diff::Delete(_) => deletions += diff.char_len(),
            Diff::Equal(_) => {
                levenshtein += insertions.max(deletions);
                insertions = 0;
                deletions = 0;
            }
        }
    }
    levenshtein + insertions.max(deletions)
}

/// Translate a location in `text1` to the equivalent location in `text2`.
/// e.g. "The cat" vs "The big cat": 1 -> 1, 5 -> 8
pub fn diff_x_index(diffs: &[Diff], loc: usize) -> usize {
    let mut chars1 = 0;
    let mut chars2 = 0;
    let mut last_chars1 = 0;
    let mut last_chars2 = 0;
    let mut overshot_deletion = false;
    for diff in diffs {
        let len = diff.char_len();
        if !matches!(diff, Diff::Insert(_)) {
            chars1 += len;
        }
        if !matches!(diff, Diff::Delete(_)) {
            chars2 += len;
        }
        if chars1 > loc {
            overshot_deletion = matches!(diff, Diff::Delete(_));
            break;
        }
        last_chars1 = chars1;
        last_chars2 = chars2;
    }
    if overshot_deletion {
        // The location itself was deleted.
        return last_chars2;
    }
    last_chars2 + (loc - last_chars1)
}

pub(crate) fn common_prefix_chars(text1: &[char], text2: &[char]) -> usize {
    text1
        .iter()
        .zip(text2.iter())
        .take_while(|(c1, c2)| c1 == c2)
        .count()
}

pub(crate) fn common_suffix_chars(text1: &[char], text2: &[char]) -> usize {
    text1
        .iter()
        .rev()
        .zip(text2.iter().rev())
        .take_while(|(c1, c2)| c1 == c2)
        .count()
}

pub(crate) fn string_of(chars: &[char]) -> String {
    chars.iter().collect()
}

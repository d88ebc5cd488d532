//! Fuzzy pattern location
//!
//! [`match_main`] locates the best instance of a pattern near an expected
//! location, using the bit-parallel Bitap algorithm under a combined
//! error/distance score. A candidate is accepted only while its score stays
//! at or below the configured match threshold.

use crate::{options::Options, utils};
use std::collections::HashMap;

/// Locate the best instance of `pattern` in `text` near `loc`.
///
/// Returns `None` if no acceptable match is found.
///
/// ```
/// use mend::match_main;
///
/// assert_eq!(match_main("abcdef", "de", 3), Some(3));
/// assert_eq!(match_main("abcdef", "xyz", 3), None);
/// ```
pub fn match_main(text: &str, pattern: &str, loc: usize) -> Option<usize> {
    Options::default().match_main(text, pattern, loc)
}

impl Options {
    /// Locate the best instance of `pattern` in `text` near `loc` under
    /// this configuration.
    pub fn match_main(&self, text: &str, pattern: &str, loc: usize) -> Option<usize> {
        let text: Vec<char> = text.chars().collect();
        let pattern: Vec<char> = pattern.chars().collect();
        self.match_chars(&text, &pattern, loc)
    }

    pub(crate) fn match_chars(&self, text: &[char], pattern: &[char], loc: usize) -> Option<usize> {
        let loc = loc.min(text.len());
        if text == pattern {
            // Shortcut (potentially not guaranteed by the algorithm).
            return Some(0);
        }
        if text.is_empty() {
            // Nothing to match.
            return None;
        }
        if loc + pattern.len() <= text.len() && text[loc..loc + pattern.len()] == pattern[..] {
            // Perfect match at the perfect spot! (Includes the case of an
            // empty pattern.)
            return Some(loc);
        }
        // Do a fuzzy compare.
        self.match_bitap(text, pattern, loc)
    }

    // Bit-parallel scan across error levels d = 0..|pattern|; at each level
    // a binary search bounds how far from `loc` a hit could sit and still
    // beat the running score threshold.
    fn match_bitap(&self, text: &[char], pattern: &[char], loc: usize) -> Option<usize> {
        if pattern.is_empty() {
            return Some(loc);
        }
        if pattern.len() > self.match_max_bits {
            // The state vector is one machine word; wider patterns are the
            // caller's responsibility to split.
            return None;
        }

        let alphabet = match_alphabet(pattern);

        // Highest score beyond which we give up.
        let mut score_threshold = self.match_threshold;
        // Is there a nearby exact match? (speedup)
        if let Some(best_loc) = utils::index_of(text, pattern, loc) {
            score_threshold = self.bitap_score(0, best_loc, loc, pattern.len()).min(score_threshold);
            // What about in the other direction? (speedup)
            if let Some(best_loc) = utils::last_index_of(text, pattern, loc + pattern.len()) {
                score_threshold = self
                    .bitap_score(0, best_loc, loc, pattern.len())
                    .min(score_threshold);
            }
        }

        let match_mask: u64 = 1 << (pattern.len() - 1);
        let mut best_loc: Option<usize> = None;

        let mut bin_max = pattern.len() + text.len();
        let mut last_rd: Vec<u64> = Vec::new();
        for d in 0..pattern.len() {
            // Scan for the best match; each iteration allows for one more
            // error. Run a binary search to determine how far from `loc` we
            // can stray at this error level.
            let mut bin_min = 0;
            let mut bin_mid = bin_max;
            while bin_min < bin_mid {
                if self.bitap_score(d, loc + bin_mid, loc, pattern.len()) <= score_threshold {
                    bin_min = bin_mid;
                } else {
                    bin_max = bin_mid;
                }
                bin_mid = (bin_max - bin_min) / 2 + bin_min;
            }
            // Use the result from this iteration as the maximum for the next.
            bin_max = bin_mid;
            let mut start = 1.max(loc.saturating_sub(bin_mid) + 1);
            let finish = (loc + bin_mid).min(text.len()) + pattern.len();

            let mut rd = vec![0u64; finish + 2];
            rd[finish + 1] = (1 << d) - 1;
            let mut j = finish;
            while j >= start {
                let char_match = if text.len() < j {
                    // Out of range.
                    0
                } else {
                    alphabet.get(&text[j - 1]).copied().unwrap_or(0)
                };
                rd[j] = if d == 0 {
                    // First pass: exact match.
                    ((rd[j + 1] << 1) | 1) & char_match
                } else {
                    // Subsequent passes: fuzzy match.
                    (((rd[j + 1] << 1) | 1) & char_match)
                        | (((last_rd[j + 1] | last_rd[j]) << 1) | 1)
                        | last_rd[j + 1]
                };
                if rd[j] & match_mask != 0 {
                    let score = self.bitap_score(d, j - 1, loc, pattern.len());
                    // This match will almost certainly be better than any
                    // existing match, but check anyway.
                    if score <= score_threshold {
                        // Told you so.
                        score_threshold = score;
                        best_loc = Some(j - 1);
                        if j - 1 > loc {
                            // When passing `loc`, don't exceed our current
                            // distance from it.
                            start = 1.max((2 * loc).saturating_sub(j - 1));
                        } else {
                            // Already passed `loc`; downhill from here.
                            break;
                        }
                    }
                }
                j -= 1;
            }
            // No hope for a better match at greater error levels.
            if self.bitap_score(d + 1, loc, loc, pattern.len()) > score_threshold {
                break;
            }
            last_rd = rd;
        }
        best_loc
    }

    // Score a candidate: 0.0 is perfect, 1.0 is terrible. Errors weigh in
    // proportion to the pattern length, distance in proportion to
    // `match_distance` (0 demands the exact expected location).
    fn bitap_score(&self, errors: usize, x: usize, loc: usize, pattern_len: usize) -> f64 {
        let accuracy = errors as f64 / pattern_len as f64;
        let proximity = loc.abs_diff(x);
        if self.match_distance == 0 {
            return if proximity == 0 { accuracy } else { 1.0 };
        }
        accuracy + proximity as f64 / self.match_distance as f64
    }
}

// Map each codepoint of the pattern to its bitmask; the highest bit stands
// for the first codepoint.
fn match_alphabet(pattern: &[char]) -> HashMap<char, u64> {
    let mut alphabet = HashMap::new();
    for (i, &c) in pattern.iter().enumerate() {
        *alphabet.entry(c).or_insert(0) |= 1 << (pattern.len() - i - 1);
    }
    alphabet
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    fn bitap(options: &Options, text: &str, pattern: &str, loc: usize) -> Option<usize> {
        options.match_bitap(&chars(text), &chars(pattern), loc)
    }

    #[test]
    fn test_match_alphabet() {
        let mut expected = HashMap::new();
        expected.insert('a', 4);
        expected.insert('b', 2);
        expected.insert('c', 1);
        assert_eq!(match_alphabet(&chars("abc")), expected);

        let mut expected = HashMap::new();
        expected.insert('a', 37);
        expected.insert('b', 18);
        expected.insert('c', 8);
        assert_eq!(match_alphabet(&chars("abcaba")), expected);
    }

    #[test]
    fn test_match_bitap() {
        let mut options = Options::default();
        options.set_match_distance(100).set_match_threshold(0.5);

        // Exact matches.
        assert_eq!(bitap(&options, "abcdefghijk", "fgh", 5), Some(5));
        assert_eq!(bitap(&options, "abcdefghijk", "fgh", 0), Some(5));

        // Fuzzy matches.
        assert_eq!(bitap(&options, "abcdefghijk", "efxhi", 0), Some(4));
        assert_eq!(bitap(&options, "abcdefghijk", "cdefxyhijk", 5), Some(2));
        assert_eq!(bitap(&options, "abcdefghijk", "bxy", 1), None);

        // Overflow.
        assert_eq!(bitap(&options, "123456789xx0", "3456789x0", 2), Some(2));

        // Edges.
        assert_eq!(bitap(&options, "abcdef", "xxabc", 4), Some(0));
        assert_eq!(bitap(&options, "abcdef", "defyy", 4), Some(3));
        assert_eq!(bitap(&options, "abcdef", "xabcdefy", 0), Some(0));

        // Threshold sweep.
        options.set_match_threshold(0.4);
        assert_eq!(bitap(&options, "abcdefghijk", "efxyhi", 1), Some(4));
        options.set_match_threshold(0.3);
        assert_eq!(bitap(&options, "abcdefghijk", "efxyhi", 1), None);
        options.set_match_threshold(0.0);
        assert_eq!(bitap(&options, "abcdefghijk", "bcdef", 1), Some(1));
        options.set_match_threshold(0.5);

        // Multiple selection.
        assert_eq!(bitap(&options, "abcdexyzabcde", "abccde", 3), Some(0));
        assert_eq!(bitap(&options, "abcdexyzabcde", "abccde", 5), Some(8));

        // Distance test.
        options.set_match_distance(10); // Strict location.
        assert_eq!(
            bitap(&options, "abcdefghijklmnopqrstuvwxyz", "abcdefg", 24),
            None
        );
        assert_eq!(
            bitap(&options, "abcdefghijklmnopqrstuvwxyz", "abcdxxefg", 1),
            Some(0)
        );
        options.set_match_distance(1000); // Loose location.
        assert_eq!(
            bitap(&options, "abcdefghijklmnopqrstuvwxyz", "abcdefg", 24),
            Some(0)
        );
    }

    #[test]
    fn test_match_main() {
        // Shortcuts.
        assert_eq!(match_main("abcdef", "abcdef", 1000), Some(0));
        assert_eq!(match_main("", "abcdef", 1), None);
        assert_eq!(match_main("abcdef", "", 3), Some(3));
        assert_eq!(match_main("abcdef", "de", 3), Some(3));

        // Edges.
        assert_eq!(match_main("abcdef", "defy", 4), Some(3));
        assert_eq!(match_main("abcdef", "abcdefy", 0), Some(0));

        // Complex match.
        let mut options = Options::default();
        options.set_match_threshold(0.7);
        assert_eq!(
            options.match_main(
                "I am the very model of a modern major general.",
                " that berry ",
                5
            ),
            Some(4)
        );
    }

    #[test]
    fn test_match_oversized_pattern() {
        let mut options = Options::default();
        options.set_match_max_bits(4);
        // No exact occurrence and too wide to scan.
        assert_eq!(options.match_main("abcdef", "abcxx", 0), None);
    }
}

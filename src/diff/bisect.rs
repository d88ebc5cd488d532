//! Myers' O(ND) bisection
//!
//! Finds the "middle snake" of an optimal path through the edit graph by
//! advancing forward and reverse d-paths simultaneously, then splits the
//! problem at the overlap and recurses. See Myers' 1986 paper: An O(ND)
//! Difference Algorithm and Its Variations.

use super::{main_chars, string_of, Diff};
use crate::options::Options;
use std::time::Instant;

// The v arrays record, per diagonal k, the furthest-reaching x coordinate.
// k can be negative, so indices are shifted by `v_offset`; one extra slot is
// reserved so the k+1 reads stay in bounds for the smallest inputs.
pub(crate) fn bisect(
    options: &Options,
    text1: &[char],
    text2: &[char],
    deadline: Option<Instant>,
) -> Vec<Diff> {
    let len1 = text1.len() as isize;
    let len2 = text2.len() as isize;

    let max_d = (len1 + len2 + 1) / 2;
    let v_offset = max_d;
    let v_length = (2 * max_d + 2) as usize;
    let mut v1 = vec![-1isize; v_length];
    let mut v2 = vec![-1isize; v_length];
    v1[(v_offset + 1) as usize] = 0;
    v2[(v_offset + 1) as usize] = 0;

    let delta = len1 - len2;
    // If the total number of codepoints is odd, the front path will collide
    // with the reverse path.
    let front = delta % 2 != 0;
    // Offsets for the start and end of the k loops, shrinking the active
    // range once a path runs off the edge of the grid.
    let mut k1start = 0isize;
    let mut k1end = 0isize;
    let mut k2start = 0isize;
    let mut k2end = 0isize;

    for d in 0..max_d {
        // Bail out if the deadline is reached.
        if deadline.map_or(false, |deadline| Instant::now() > deadline) {
            break;
        }

        // Walk the front path one step.
        let mut k1 = -d + k1start;
        while k1 <= d - k1end {
            let k1_offset = (v_offset + k1) as usize;
            let mut x1 = if k1 == -d || (k1 != d && v1[k1_offset - 1] < v1[k1_offset + 1]) {
                v1[k1_offset + 1]
            } else {
                v1[k1_offset - 1] + 1
            };
            let mut y1 = x1 - k1;
            while x1 < len1 && y1 < len2 && text1[x1 as usize] == text2[y1 as usize] {
                x1 += 1;
                y1 += 1;
            }
            v1[k1_offset] = x1;
            if x1 > len1 {
                // Ran off the right of the graph.
                k1end += 2;
            } else if y1 > len2 {
                // Ran off the bottom of the graph.
                k1start += 2;
            } else if front {
                let k2_offset = v_offset + delta - k1;
                if k2_offset >= 0 && (k2_offset as usize) < v_length && v2[k2_offset as usize] != -1
                {
                    // Mirror x2 onto the top-left coordinate system.
                    let x2 = len1 - v2[k2_offset as usize];
                    if x1 >= x2 {
                        // Overlap detected.
                        return split(options, text1, text2, x1 as usize, y1 as usize, deadline);
                    }
                }
            }
            k1 += 2;
        }

        // Walk the reverse path one step.
        let mut k2 = -d + k2start;
        while k2 <= d - k2end {
            let k2_offset = (v_offset + k2) as usize;
            let mut x2 = if k2 == -d || (k2 != d && v2[k2_offset - 1] < v2[k2_offset + 1]) {
                v2[k2_offset + 1]
            } else {
                v2[k2_offset - 1] + 1
            };
            let mut y2 = x2 - k2;
            while x2 < len1
                && y2 < len2
                && text1[(len1 - x2 - 1) as usize] == text2[(len2 - y2 - 1) as usize]
            {
                x2 += 1;
                y2 += 1;
            }
            v2[k2_offset] = x2;
            if x2 > len1 {
                // Ran off the left of the graph.
                k2end += 2;
            } else if y2 > len2 {
                // Ran off the top of the graph.
                k2start += 2;
            } else if !front {
                let k1_offset = v_offset + delta - k2;
                if k1_offset >= 0 && (k1_offset as usize) < v_length && v1[k1_offset as usize] != -1
                {
                    let x1 = v1[k1_offset as usize];
                    let y1 = v_offset + x1 - k1_offset;
                    // Mirror x2 onto the top-left coordinate system.
                    let x2 = len1 - x2;
                    if x1 >= x2 {
                        // Overlap detected.
                        return split(options, text1, text2, x1 as usize, y1 as usize, deadline);
                    }
                }
            }
            k2 += 2;
        }
    }

    // The diff hit the deadline, or the number of edits equals the number of
    // codepoints and there is no commonality at all.
    vec![
        Diff::Delete(string_of(text1)),
        Diff::Insert(string_of(text2)),
    ]
}

// Split the problem at the middle snake and diff both halves. A path that
// ran off the edge of the graph may report a coordinate one past the end.
fn split(
    options: &Options,
    text1: &[char],
    text2: &[char],
    x: usize,
    y: usize,
    deadline: Option<Instant>,
) -> Vec<Diff> {
    let x = x.min(text1.len());
    let y = y.min(text2.len());
    let mut diffs = main_chars(options, &text1[..x], &text2[..y], false, deadline);
    diffs.extend(main_chars(options, &text1[x..], &text2[y..], false, deadline));
    diffs
}

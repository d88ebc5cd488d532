//! Line compressor
//!
//! Maps whole lines to single codepoints so the character diff can run over
//! a drastically smaller alphabet, then expands the result back. Lines keep
//! their trailing newline; the final line may be partial.

use super::Diff;
use std::collections::HashMap;

// Slot 0 of the dictionary is reserved, so line n maps to codepoint n
// counting from U+0001. Rust chars cannot hold surrogates, so indices at or
// above 0xD800 shift past the gap; the shifted ceiling caps how many
// distinct lines can be interned before the remainder is taken as one line.
const SURROGATE_START: usize = 0xD800;
const SURROGATE_SPAN: usize = 0x800;
const MAX_LINES: usize = 0x10FFFF - SURROGATE_SPAN;

fn index_to_char(index: usize) -> char {
    let scalar = if index < SURROGATE_START {
        index
    } else {
        index + SURROGATE_SPAN
    };
    char::from_u32(scalar as u32).unwrap_or('\u{fffd}')
}

fn char_to_index(c: char) -> usize {
    let scalar = c as usize;
    if scalar < SURROGATE_START {
        scalar
    } else {
        scalar - SURROGATE_SPAN
    }
}

/// Compress both texts to one codepoint per line, sharing one dictionary.
/// The dictionary's first slot is reserved empty so indices start at 1.
pub(crate) fn lines_to_chars(
    text1: &[char],
    text2: &[char],
) -> (Vec<char>, Vec<char>, Vec<String>) {
    let mut line_array: Vec<String> = vec![String::new()];
    let mut line_hash: HashMap<String, usize> = HashMap::new();

    let chars1 = munge(text1, &mut line_array, &mut line_hash);
    let chars2 = munge(text2, &mut line_array, &mut line_hash);
    (chars1, chars2, line_array)
}

fn munge(
    text: &[char],
    line_array: &mut Vec<String>,
    line_hash: &mut HashMap<String, usize>,
) -> Vec<char> {
    let mut chars = Vec::new();
    let mut line_start = 0;
    while line_start < text.len() {
        let mut line_end = text[line_start..]
            .iter()
            .position(|&c| c == '\n')
            .map_or(text.len(), |at| line_start + at + 1);
        if line_array.len() == MAX_LINES {
            // Dictionary full; swallow the rest of the text as one line.
            line_end = text.len();
        }
        let line: String = text[line_start..line_end].iter().collect();
        let index = match line_hash.get(&line) {
            Some(&index) => index,
            None => {
                line_array.push(line.clone());
                let index = line_array.len() - 1;
                line_hash.insert(line, index);
                index
            }
        };
        chars.push(index_to_char(index));
        line_start = line_end;
    }
    chars
}

/// Rehydrate each compressed payload back into its lines.
pub(crate) fn chars_to_lines(diffs: &mut [Diff], line_array: &[String]) {
    for diff in diffs.iter_mut() {
        let text: String = diff
            .text()
            .chars()
            .map(|c| line_array[char_to_index(c)].as_str())
            .collect();
        diff.set_text(text);
    }
}

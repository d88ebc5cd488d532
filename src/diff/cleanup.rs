//! Cleanup passes over a finished edit script
//!
//! [`cleanup_merge`] normalizes a script into canonical form: runs of
//! like operations fused, common affixes of delete/insert pairs factored
//! into the surrounding equalities, no empty payloads. The semantic and
//! efficiency passes then trade minimality for human- or machine-friendly
//! scripts by eliminating small equalities.

use super::Diff;
use crate::options::Options;
use crate::utils;

/// Reorder and merge like edit sections, factoring out commonalities.
/// Any edit section can move as long as it doesn't cross an equality.
pub fn cleanup_merge(diffs: &mut Vec<Diff>) {
    if diffs.is_empty() {
        return;
    }

    diffs.push(Diff::Equal(String::new())); // Dummy sentinel.
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
                pointer += 1;
            }
            Diff::Delete(text) => {
                count_delete += 1;
                text_delete.push_str(text);
                pointer += 1;
            }
            Diff::Equal(_) => {
                // Upon reaching an equality, check for prior redundancies.
                if count_delete + count_insert > 1 {
                    if count_delete != 0 && count_insert != 0 {
                        // Factor out any common prefix.
                        let common = utils::common_prefix(&text_insert, &text_delete);
                        if common != 0 {
                            let ins_byte = utils::char_to_byte(&text_insert, common);
                            let del_byte = utils::char_to_byte(&text_delete, common);
                            let start = pointer - count_delete - count_insert;
                            if start > 0 && matches!(diffs[start - 1], Diff::Equal(_)) {
                                if let Diff::Equal(text) = &mut diffs[start - 1] {
                                    text.push_str(&text_insert[..ins_byte]);
                                }
                            } else {
                                diffs.insert(0, Diff::Equal(text_insert[..ins_byte].to_string()));
                                pointer += 1;
                            }
                            text_insert.drain(..ins_byte);
                            text_delete.drain(..del_byte);
                        }
                        // Factor out any common suffix.
                        let common = utils::common_suffix(&text_insert, &text_delete);
                        if common != 0 {
                            let ins_byte = utils::char_to_byte(
                                &text_insert,
                                utils::char_len(&text_insert) - common,
                            );
                            let del_byte = utils::char_to_byte(
                                &text_delete,
                                utils::char_len(&text_delete) - common,
                            );
                            if let Diff::Equal(text) = &mut diffs[pointer] {
                                text.insert_str(0, &text_insert[ins_byte..]);
                            }
                            text_insert.truncate(ins_byte);
                            text_delete.truncate(del_byte);
                        }
                    }
                    // Delete the offending records and restore the merged ones.
                    let start = pointer - count_delete - count_insert;
                    let mut merged = Vec::with_capacity(2);
                    if !text_delete.is_empty() {
                        merged.push(Diff::Delete(text_delete.clone()));
                    }
                    if !text_insert.is_empty() {
                        merged.push(Diff::Insert(text_insert.clone()));
                    }
                    let merged_len = merged.len();
                    diffs.splice(start..pointer, merged);
                    pointer = start + merged_len + 1;
                } else if pointer != 0 && matches!(diffs[pointer - 1], Diff::Equal(_)) {
                    // Merge this equality with the previous one.
                    if let Diff::Equal(text) = diffs.remove(pointer) {
                        if let Diff::Equal(previous) = &mut diffs[pointer - 1] {
                            previous.push_str(&text);
                        }
                    }
                } else {
                    pointer += 1;
                }
                count_insert = 0;
                count_delete = 0;
                text_delete.clear();
                text_insert.clear();
            }
        }
    }
    if diffs.last().map_or(false, |diff| diff.text().is_empty()) {
        diffs.pop(); // Drop the dummy sentinel.
    }

    // Second pass: look for single edits surrounded on both sides by
    // equalities which can be shifted sideways to eliminate an equality.
    // e.g: A<ins>BA</ins>C -> <ins>AB</ins>AC
    let mut changes = false;
    let mut pointer = 1;
    while pointer + 1 < diffs.len() {
        if matches!(diffs[pointer - 1], Diff::Equal(_)) && matches!(diffs[pointer + 1], Diff::Equal(_))
        {
            let previous = diffs[pointer - 1].text().to_string();
            let edit = diffs[pointer].text().to_string();
            let next = diffs[pointer + 1].text().to_string();
            if edit.ends_with(&previous) {
                // Shift the edit over the previous equality.
                let mut shifted = previous.clone();
                shifted.push_str(&edit[..edit.len() - previous.len()]);
                diffs[pointer].set_text(shifted);
                diffs[pointer + 1].set_text(format!("{previous}{next}"));
                diffs.remove(pointer - 1);
                changes = true;
            } else if edit.starts_with(&next) {
                // Shift the edit over the next equality.
                diffs[pointer - 1].set_text(format!("{previous}{next}"));
                diffs[pointer].set_text(format!("{}{}", &edit[next.len()..], next));
                diffs.remove(pointer + 1);
                changes = true;
            }
        }
        pointer += 1;
    }
    // If shifts were made, the diff needs reordering and another sweep.
    if changes {
        cleanup_merge(diffs);
    }
}

/// Reduce the number of edits by eliminating semantically trivial
/// equalities, then factor out any overlaps between deletions and
/// insertions.
pub fn cleanup_semantic(diffs: &mut Vec<Diff>) {
    let mut changes = false;
    // Stack of indices where equalities are found.
    let mut equalities: Vec<usize> = Vec::new();
    // Always equal to the payload at the top of the stack.
    let mut last_equality: Option<String> = None;
    // Codepoints changed before and after the candidate equality.
    let mut length_insertions1 = 0;
    let mut length_deletions1 = 0;
    let mut length_insertions2 = 0;
    let mut length_deletions2 = 0;

    let mut pointer: isize = 0;
    while (pointer as usize) < diffs.len() {
        let index = pointer as usize;
        if let Diff::Equal(text) = &diffs[index] {
            equalities.push(index);
            length_insertions1 = length_insertions2;
            length_deletions1 = length_deletions2;
            length_insertions2 = 0;
            length_deletions2 = 0;
            last_equality = Some(text.clone());
        } else {
            match &diffs[index] {
                Diff::Insert(text) => length_insertions2 += utils::char_len(text),
                _ => length_deletions2 += diffs[index].char_len(),
            }
            // Eliminate an equality smaller than or equal to the edits on
            // both sides of it.
            let eliminate = last_equality.as_ref().map_or(false, |equality| {
                let length = utils::char_len(equality);
                !equality.is_empty()
                    && length <= length_insertions1.max(length_deletions1)
                    && length <= length_insertions2.max(length_deletions2)
            });
            if eliminate {
                if let (Some(equality), Some(&insertion_point)) =
                    (last_equality.take(), equalities.last())
                {
                    // Replace the equality with a delete + insert pair.
                    diffs[insertion_point] = Diff::Delete(equality.clone());
                    diffs.insert(insertion_point + 1, Diff::Insert(equality));
                    // Throw away the equality we just deleted and the one
                    // before it, which needs to be reevaluated.
                    equalities.pop();
                    equalities.pop();
                    pointer = equalities.last().map_or(-1, |&index| index as isize);
                    length_insertions1 = 0;
                    length_deletions1 = 0;
                    length_insertions2 = 0;
                    length_deletions2 = 0;
                    changes = true;
                }
            }
        }
        pointer += 1;
    }

    // Normalize the diff.
    if changes {
        cleanup_merge(diffs);
    }
    cleanup_semantic_lossless(diffs);

    // Find any overlaps between deletions and insertions.
    // e.g: <del>abcxxx</del><ins>xxxdef</ins>
    //   -> <del>abc</del>xxx<ins>def</ins>
    // e.g: <del>xxxabc</del><ins>defxxx</ins>
    //   -> <ins>def</ins>xxx<del>abc</del>
    // Only extract an overlap if it is as big as the edit ahead or behind it.
    let mut pointer = 1;
    while pointer < diffs.len() {
        if let (Diff::Delete(deletion), Diff::Insert(insertion)) =
            (&diffs[pointer - 1], &diffs[pointer])
        {
            let deletion = deletion.clone();
            let insertion = insertion.clone();
            let overlap_length1 = utils::common_overlap(&deletion, &insertion);
            let overlap_length2 = utils::common_overlap(&insertion, &deletion);
            let deletion_length = utils::char_len(&deletion);
            let insertion_length = utils::char_len(&insertion);
            if overlap_length1 >= overlap_length2 {
                if overlap_length1 * 2 >= deletion_length || overlap_length1 * 2 >= insertion_length
                {
                    // Overlap found. Insert an equality and trim the
                    // surrounding edits.
                    let ins_byte = utils::char_to_byte(&insertion, overlap_length1);
                    let del_byte =
                        utils::char_to_byte(&deletion, deletion_length - overlap_length1);
                    diffs[pointer - 1] = Diff::Delete(deletion[..del_byte].to_string());
                    diffs[pointer] = Diff::Insert(insertion[ins_byte..].to_string());
                    diffs.insert(pointer, Diff::Equal(insertion[..ins_byte].to_string()));
                    pointer += 1;
                }
            } else if overlap_length2 * 2 >= deletion_length
                || overlap_length2 * 2 >= insertion_length
            {
                // Reverse overlap found. Insert an equality and swap and
                // trim the surrounding edits.
                let ins_byte =
                    utils::char_to_byte(&insertion, insertion_length - overlap_length2);
                let del_byte = utils::char_to_byte(&deletion, overlap_length2);
                diffs[pointer - 1] = Diff::Insert(insertion[..ins_byte].to_string());
                diffs[pointer] = Diff::Delete(deletion[del_byte..].to_string());
                diffs.insert(pointer, Diff::Equal(deletion[..del_byte].to_string()));
                pointer += 1;
            }
            pointer += 1;
        }
        pointer += 1;
    }
}

/// Look for single edits surrounded on both sides by equalities which can be
/// shifted sideways to align the edit to a word boundary.
/// e.g: The c<ins>at c</ins>ame. -> The <ins>cat </ins>came.
pub fn cleanup_semantic_lossless(diffs: &mut Vec<Diff>) {
    let mut pointer = 1;
    // Intentionally ignore the first and last element (they don't qualify).
    while pointer + 1 < diffs.len() {
        if matches!(diffs[pointer - 1], Diff::Equal(_)) && matches!(diffs[pointer + 1], Diff::Equal(_))
        {
            // This is a single edit surrounded by equalities.
            let mut equality1 = diffs[pointer - 1].text().to_string();
            let mut edit = diffs[pointer].text().to_string();
            let mut equality2 = diffs[pointer + 1].text().to_string();

            // First, shift the edit as far left as possible.
            let common_offset = utils::common_suffix(&equality1, &edit);
            if common_offset > 0 {
                let edit_byte =
                    utils::char_to_byte(&edit, utils::char_len(&edit) - common_offset);
                let common = edit[edit_byte..].to_string();
                let equality_byte =
                    utils::char_to_byte(&equality1, utils::char_len(&equality1) - common_offset);
                equality1.truncate(equality_byte);
                edit = format!("{}{}", common, &edit[..edit_byte]);
                equality2 = format!("{common}{equality2}");
            }

            // Second, step codepoint by codepoint right, looking for the
            // best fit.
            let mut best_equality1 = equality1.clone();
            let mut best_edit = edit.clone();
            let mut best_equality2 = equality2.clone();
            let mut best_score =
                semantic_score(&equality1, &edit) + semantic_score(&edit, &equality2);
            loop {
                let (edit_first, equality_first) = match (edit.chars().next(), equality2.chars().next()) {
                    (Some(e), Some(q)) if e == q => (e, q),
                    _ => break,
                };
                equality1.push(edit_first);
                edit = format!("{}{}", &edit[edit_first.len_utf8()..], edit_first);
                equality2 = equality2[equality_first.len_utf8()..].to_string();
                let score = semantic_score(&equality1, &edit) + semantic_score(&edit, &equality2);
                // The >= encourages trailing rather than leading whitespace
                // on edits.
                if score >= best_score {
                    best_score = score;
                    best_equality1 = equality1.clone();
                    best_edit = edit.clone();
                    best_equality2 = equality2.clone();
                }
            }

            if diffs[pointer - 1].text() != best_equality1 {
                // We have an improvement, save it back to the diff.
                if !best_equality1.is_empty() {
                    diffs[pointer - 1].set_text(best_equality1);
                } else {
                    diffs.remove(pointer - 1);
                    pointer -= 1;
                }
                diffs[pointer].set_text(best_edit);
                if !best_equality2.is_empty() {
                    diffs[pointer + 1].set_text(best_equality2);
                } else {
                    diffs.remove(pointer + 1);
                    pointer -= 1;
                }
            }
        }
        pointer += 1;
    }
}

// Score a boundary between `one` and `two` from 6 (best) to 0 (worst).
// The notion of whitespace and alphanumerics here is deliberately simple;
// the function is cosmetic.
fn semantic_score(one: &str, two: &str) -> u32 {
    let (char1, char2) = match (one.chars().next_back(), two.chars().next()) {
        (Some(char1), Some(char2)) => (char1, char2),
        // Edges are the best.
        _ => return 6,
    };

    let non_alphanumeric1 = !char1.is_ascii_alphanumeric();
    let non_alphanumeric2 = !char2.is_ascii_alphanumeric();
    let whitespace1 = non_alphanumeric1 && char1.is_whitespace();
    let whitespace2 = non_alphanumeric2 && char2.is_whitespace();
    let line_break1 = whitespace1 && (char1 == '\r' || char1 == '\n');
    let line_break2 = whitespace2 && (char2 == '\r' || char2 == '\n');
    let blank_line1 = line_break1 && (one.ends_with("\n\n") || one.ends_with("\n\r\n"));
    let blank_line2 =
        line_break2 && (two.starts_with("\n\n") || two.starts_with("\r\n\n") || two.starts_with("\n\r\n") || two.starts_with("\r\n\r\n"));

    if blank_line1 || blank_line2 {
        // Five points for blank lines.
        5
    } else if line_break1 || line_break2 {
        // Four points for line breaks.
        4
    } else if non_alphanumeric1 && !whitespace1 && whitespace2 {
        // Three points for end of sentences.
        3
    } else if whitespace1 || whitespace2 {
        // Two points for whitespace.
        2
    } else if non_alphanumeric1 || non_alphanumeric2 {
        // One point for non-alphanumeric.
        1
    } else {
        0
    }
}

/// Reduce the number of edits by eliminating operationally trivial
/// equalities, using the default edit cost.
pub fn cleanup_efficiency(diffs: &mut Vec<Diff>) {
    Options::default().cleanup_efficiency(diffs);
}

impl Options {
    /// Reduce the number of edits by eliminating equalities shorter than
    /// this configuration's edit cost that sit between other edits.
    pub fn cleanup_efficiency(&self, diffs: &mut Vec<Diff>) {
        cleanup_efficiency_with_cost(diffs, self.diff_edit_cost);
    }
}

fn cleanup_efficiency_with_cost(diffs: &mut Vec<Diff>, edit_cost: usize) {
    let mut changes = false;
    // Stack of indices where equalities are found.
    let mut equalities: Vec<usize> = Vec::new();
    // Always equal to the payload at the top of the stack.
    let mut last_equality: Option<String> = None;
    // Is there an insertion or deletion before/after the last equality?
    let mut pre_ins = false;
    let mut pre_del = false;
    let mut post_ins = false;
    let mut post_del = false;

    let mut pointer: isize = 0;
    while (pointer as usize) < diffs.len() {
        let index = pointer as usize;
        if let Diff::Equal(text) = &diffs[index] {
            if utils::char_len(text) < edit_cost && (post_ins || post_del) {
                // Candidate found.
                equalities.push(index);
                pre_ins = post_ins;
                pre_del = post_del;
                last_equality = Some(text.clone());
            } else {
                // Not a candidate, and can never become one.
                equalities.clear();
                last_equality = None;
            }
            post_ins = false;
            post_del = false;
        } else {
            if matches!(diffs[index], Diff::Delete(_)) {
                post_del = true;
            } else {
                post_ins = true;
            }
            // Five types to be split:
            // <ins>A</ins><del>B</del>XY<ins>C</ins><del>D</del>
            // <ins>A</ins>X<ins>C</ins><del>D</del>
            // <ins>A</ins><del>B</del>X<ins>C</ins>
            // <del>A</del>X<ins>C</ins><del>D</del>
            // <ins>A</ins><del>B</del>X<del>C</del>
            let flanks =
                usize::from(pre_ins) + usize::from(pre_del) + usize::from(post_ins) + usize::from(post_del);
            let eliminate = last_equality.as_ref().map_or(false, |equality| {
                !equality.is_empty()
                    && ((pre_ins && pre_del && post_ins && post_del)
                        || (utils::char_len(equality) < edit_cost / 2 && flanks == 3))
            });
            if eliminate {
                if let (Some(equality), Some(&insertion_point)) =
                    (last_equality.take(), equalities.last())
                {
                    // Replace the equality with a delete + insert pair.
                    diffs[insertion_point] = Diff::Delete(equality.clone());
                    diffs.insert(insertion_point + 1, Diff::Insert(equality));
                    equalities.pop(); // Throw away the equality we just deleted.
                    if pre_ins && pre_del {
                        // No changes made which could affect previous entry,
                        // keep going.
                        post_ins = true;
                        post_del = true;
                        equalities.clear();
                    } else {
                        // Throw away the previous equality; it needs to be
                        // reevaluated.
                        equalities.pop();
                        pointer = equalities.last().map_or(-1, |&index| index as isize);
                        post_ins = false;
                        post_del = false;
                    }
                    changes = true;
                }
            }
        }
        pointer += 1;
    }

    if changes {
        cleanup_merge(diffs);
    }
}

//! Property tests for the library's round-trip invariants.

use mend::{
    diff_from_delta, diff_main, diff_text1, diff_text2, diff_to_delta, patch_apply,
    patch_from_text, patch_make, patch_to_text,
};
use proptest::prelude::*;

proptest! {
    // A diff must reconstruct both of its inputs exactly.
    #[test]
    fn diff_reconstructs_both_texts(a in "\\PC{0,80}", b in "\\PC{0,80}") {
        let diffs = diff_main(&a, &b, false);
        prop_assert_eq!(diff_text1(&diffs), a);
        prop_assert_eq!(diff_text2(&diffs), b);
    }

    // Same invariant through the line-mode path.
    #[test]
    fn line_diff_reconstructs_both_texts(
        a in proptest::collection::vec("[ab]{0,12}\n", 0..20),
        b in proptest::collection::vec("[ab]{0,12}\n", 0..20),
    ) {
        let a = a.concat();
        let b = b.concat();
        let diffs = diff_main(&a, &b, true);
        prop_assert_eq!(diff_text1(&diffs), a);
        prop_assert_eq!(diff_text2(&diffs), b);
    }

    // A delta encodes a diff losslessly against its source text.
    #[test]
    fn delta_round_trips(a in "\\PC{0,80}", b in "\\PC{0,80}") {
        let diffs = diff_main(&a, &b, false);
        let delta = diff_to_delta(&diffs);
        let decoded = diff_from_delta(&a, &delta).expect("delta built from a valid diff");
        prop_assert_eq!(decoded, diffs);
    }

    // Patch text parses back to the exact patch list it was built from.
    #[test]
    fn patch_text_round_trips(a in "\\PC{0,80}", b in "\\PC{0,80}") {
        let patches = patch_make(&a, &b);
        let text = patch_to_text(&patches);
        let parsed = patch_from_text(&text).expect("serialized patches parse");
        prop_assert_eq!(parsed, patches);
    }

    // Applying a patch to the exact text it was made from recovers the
    // target with every hunk reporting success.
    #[test]
    fn clean_apply_recovers_target(a in "\\PC{0,80}", b in "\\PC{0,80}") {
        let patches = patch_make(&a, &b);
        let (patched, results) = patch_apply(&patches, &a);
        prop_assert_eq!(patched, b);
        prop_assert!(results.iter().all(|&applied| applied));
    }
}

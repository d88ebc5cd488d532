//! Tools for synchronizing plain text
//!
//! ## Overview
//!
//! This library solves three related problems on plain-text documents:
//!
//! * **Diff** — compute an edit script transforming one text into another,
//!   using Myers' [O(ND) algorithm] with a time-bounded bisection and a
//!   cascade of cleanup passes ([`diff_main`]).
//! * **Match** — locate an approximate occurrence of a pattern near a given
//!   position, using the bit-parallel Bitap algorithm ([`match_main`]).
//! * **Patch** — represent a set of localized edits with surrounding
//!   context, serialize and parse them, and apply them to a possibly
//!   drifted text ([`patch_make`], [`patch_apply`]).
//!
//! All positions and lengths are measured in Unicode codepoints, never
//! bytes, so scripts and patches survive a round trip through any
//! conforming implementation regardless of how it stores text.
//!
//! ## Diffing
//!
//! ```
//! use mend::{diff_main, diff_text1, diff_text2};
//!
//! let diffs = diff_main("Hello World.", "Goodbye World.", false);
//!
//! // The script reconstructs both inputs.
//! assert_eq!(diff_text1(&diffs), "Hello World.");
//! assert_eq!(diff_text2(&diffs), "Goodbye World.");
//! ```
//!
//! A script can be shipped to a peer that already holds the source text as
//! a compact delta ([`diff_to_delta`] / [`diff_from_delta`]), rendered as
//! HTML ([`diff_pretty_html`]), or colored for a terminal with a
//! [`DiffFormatter`]:
//!
//! ```
//! use mend::{diff_main, DiffFormatter};
//!
//! let diffs = diff_main("Hello World.", "Goodbye World.", false);
//!
//! // Without color
//! println!("{}", DiffFormatter::new().fmt_diffs(&diffs));
//!
//! // With color
//! let f = DiffFormatter::new().with_color();
//! println!("{}", f.fmt_diffs(&diffs));
//! ```
//!
//! ## Patching
//!
//! Patches carry context around each hunk, so they still apply when the
//! target text has drifted from the source the patch was made against.
//! Application is best-effort and reports a flag per hunk:
//!
//! ```
//! use mend::{patch_apply, patch_from_text, patch_make, patch_to_text};
//!
//! let text1 = "The quick brown fox jumps over the lazy dog.";
//! let text2 = "That quick brown fox jumped over a lazy dog.";
//!
//! // Serialize on one side...
//! let wire = patch_to_text(&patch_make(text1, text2));
//!
//! // ...parse and apply on the other, against a drifted text.
//! let patches = patch_from_text(&wire).unwrap();
//! let (patched, results) = patch_apply(
//!     &patches,
//!     "The quick red rabbit jumps over the tired tiger.",
//! );
//! assert_eq!(patched, "That quick red rabbit jumped over a tired tiger.");
//! assert_eq!(results, vec![true, true]);
//! ```
//!
//! ## Matching
//!
//! ```
//! use mend::{match_main, Options};
//!
//! let mut opts = Options::default();
//! opts.set_match_threshold(0.7);
//! let loc = opts.match_main(
//!     "I am the very model of a modern major general.",
//!     " that berry ",
//!     5,
//! );
//! assert_eq!(loc, Some(4));
//! ```
//!
//! Every operation reads its tuning from an [`Options`] value; the free
//! functions use [`Options::default`].
//!
//! [O(ND) algorithm]: http://www.xmailserver.org/diff2.pdf

mod apply;
mod delta;
mod diff;
mod matcher;
mod options;
mod patch;
mod utils;

pub use apply::patch_apply;
pub use delta::{diff_from_delta, diff_to_delta, ParseDeltaError};
pub use diff::{
    cleanup_efficiency, cleanup_merge, cleanup_semantic, cleanup_semantic_lossless,
    diff_levenshtein, diff_main, diff_pretty_html, diff_text1, diff_text2, diff_x_index, Diff,
    DiffFormatter,
};
pub use matcher::match_main;
pub use options::Options;
pub use patch::{
    patch_from_diffs, patch_from_text, patch_from_text1_and_diffs, patch_from_texts, patch_make,
    patch_to_text, ParsePatchError, Patch,
};
pub use utils::{common_overlap, common_prefix, common_suffix};

use std::time::Duration;

/// Tunable knobs shared by the diff, match, and patch operations.
///
/// All lengths and distances are measured in Unicode codepoints. The
/// defaults match the behavior most callers want; construct with
/// [`Options::default`] and override individual fields with the setters.
///
/// ```
/// use std::time::Duration;
/// use mend::Options;
///
/// let mut opts = Options::default();
/// opts.set_diff_timeout(Some(Duration::from_millis(100)))
///     .set_match_threshold(0.7);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub(crate) diff_timeout: Option<Duration>,
    pub(crate) diff_edit_cost: usize,
    pub(crate) match_threshold: f64,
    pub(crate) match_distance: usize,
    pub(crate) match_max_bits: usize,
    pub(crate) patch_margin: usize,
    pub(crate) patch_delete_threshold: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            diff_timeout: Some(Duration::from_secs(1)),
            diff_edit_cost: 4,
            match_threshold: 0.5,
            match_distance: 1000,
            match_max_bits: 32,
            patch_margin: 4,
            patch_delete_threshold: 0.5,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Soft deadline for a diff. `None` removes the deadline entirely, which
    /// also disables the half-match speedup so the result is minimal.
    pub fn set_diff_timeout(&mut self, timeout: Option<Duration>) -> &mut Self {
        self.diff_timeout = timeout;
        self
    }

    /// Cost of an empty edit operation in terms of edit characters, used by
    /// the efficiency cleanup to decide when a short equality is cheaper to
    /// fold into the surrounding edits.
    pub fn set_diff_edit_cost(&mut self, edit_cost: usize) -> &mut Self {
        self.diff_edit_cost = edit_cost;
        self
    }

    /// At what point is no match declared (0.0 = perfection, 1.0 = very
    /// loose).
    pub fn set_match_threshold(&mut self, threshold: f64) -> &mut Self {
        self.match_threshold = threshold;
        self
    }

    /// How far to search for a match (0 = exact location, 1000+ = broad
    /// match). A match this many codepoints away from the expected location
    /// adds 1.0 to the score.
    pub fn set_match_distance(&mut self, distance: usize) -> &mut Self {
        self.match_distance = distance;
        self
    }

    /// Widest pattern the bit-parallel matcher will scan. The state fits a
    /// `u64`, so values above 63 are clamped.
    pub fn set_match_max_bits(&mut self, max_bits: usize) -> &mut Self {
        self.match_max_bits = max_bits.min(63);
        self
    }

    /// Chunk size of context carried on each side of a patch hunk.
    pub fn set_patch_margin(&mut self, margin: usize) -> &mut Self {
        self.patch_margin = margin;
        self
    }

    /// When deleting a large block of text (over ~64 codepoints), how close
    /// do the contents have to be to match the expected contents (0.0 =
    /// perfection, 1.0 = very loose).
    pub fn set_patch_delete_threshold(&mut self, threshold: f64) -> &mut Self {
        self.patch_delete_threshold = threshold;
        self
    }

    pub fn diff_timeout(&self) -> Option<Duration> {
        self.diff_timeout
    }

    pub fn diff_edit_cost(&self) -> usize {
        self.diff_edit_cost
    }

    pub fn match_threshold(&self) -> f64 {
        self.match_threshold
    }

    pub fn match_distance(&self) -> usize {
        self.match_distance
    }

    pub fn match_max_bits(&self) -> usize {
        self.match_max_bits
    }

    pub fn patch_margin(&self) -> usize {
        self.patch_margin
    }

    pub fn patch_delete_threshold(&self) -> f64 {
        self.patch_delete_threshold
    }
}

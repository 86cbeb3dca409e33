use std::collections::HashSet;

/// Remembers which file names the poller has already reported.
///
/// Names are never removed, so a file deleted and recreated under the same
/// name is not reported again.
#[derive(Debug, Default, Clone)]
pub struct ChangeTracker {
    seen: HashSet<String>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `filename` was previously marked.
    pub fn has_seen(&self, filename: &str) -> bool {
        self.seen.contains(filename)
    }

    /// Record `filename`. Returns `false` if it was already present.
    pub fn mark_seen(&mut self, filename: impl Into<String>) -> bool {
        self.seen.insert(filename.into())
    }

    /// Number of distinct names seen so far.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

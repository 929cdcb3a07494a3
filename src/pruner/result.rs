use serde::Serialize;

/// What one directory level contributed, folded upward into its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TraversalResult {
    /// Files deleted (or that would be, on a dry run)
    pub deleted_count: u64,
    pub deleted_bytes: u64,
    /// Newest mtime among entries left in place; 0 when nothing is retained
    pub newest_retained: u64,
    /// Every entry below this level would go
    pub all_removable: bool,
}

impl Default for TraversalResult {
    fn default() -> Self {
        Self::empty()
    }
}

impl TraversalResult {
    /// The result for a directory with no entries
    pub fn empty() -> Self {
        Self {
            deleted_count: 0,
            deleted_bytes: 0,
            newest_retained: 0,
            all_removable: true,
        }
    }

    pub(crate) fn record_deleted(&mut self, size: u64) {
        self.deleted_count += 1;
        self.deleted_bytes = self.deleted_bytes.saturating_add(size);
    }

    /// An entry stays; an unknown mtime pins the level without moving the maximum
    pub(crate) fn record_retained(&mut self, modified: Option<u64>) {
        self.all_removable = false;
        if let Some(modified) = modified {
            self.newest_retained = self.newest_retained.max(modified);
        }
    }

    /// Something here stays, but contributes nothing to the statistics
    pub(crate) fn mark_kept(&mut self) {
        self.all_removable = false;
    }

    /// Fold a subdirectory's result into this level
    pub(crate) fn absorb(&mut self, sub: &TraversalResult) {
        self.deleted_count += sub.deleted_count;
        self.deleted_bytes = self.deleted_bytes.saturating_add(sub.deleted_bytes);
        self.newest_retained = self.newest_retained.max(sub.newest_retained);
        if !sub.all_removable {
            self.all_removable = false;
        }
    }
}

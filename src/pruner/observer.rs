use serde::Serialize;

use super::TraversalResult;
use crate::remote::Entry;

/// Hooks called by the pruner as it walks the tree.
///
/// Purely observational: nothing an observer does changes what gets
/// deleted. All hooks default to doing nothing. `dry_run` tells whether a
/// removal actually happened or was only decided.
pub trait PruneObserver {
    fn enter_dir(&mut self, _path: &str) {}

    fn leave_dir(&mut self, _path: &str, _result: &TraversalResult) {}

    /// Entry matched the exclusion pattern and was skipped
    fn excluded(&mut self, _path: &str, _entry: &Entry) {}

    /// File left in place, either too young or not an include match
    fn retained(&mut self, _path: &str, _entry: &Entry) {}

    fn file_removed(&mut self, _path: &str, _entry: &Entry, _dry_run: bool) {}

    fn dir_removed(&mut self, _path: &str, _dry_run: bool) {}
}

/// Observes nothing
impl PruneObserver for () {}

impl<T: PruneObserver + ?Sized> PruneObserver for &mut T {
    fn enter_dir(&mut self, path: &str) {
        (**self).enter_dir(path)
    }

    fn leave_dir(&mut self, path: &str, result: &TraversalResult) {
        (**self).leave_dir(path, result)
    }

    fn excluded(&mut self, path: &str, entry: &Entry) {
        (**self).excluded(path, entry)
    }

    fn retained(&mut self, path: &str, entry: &Entry) {
        (**self).retained(path, entry)
    }

    fn file_removed(&mut self, path: &str, entry: &Entry, dry_run: bool) {
        (**self).file_removed(path, entry, dry_run)
    }

    fn dir_removed(&mut self, path: &str, dry_run: bool) {
        (**self).dir_removed(path, dry_run)
    }
}

/// Both observers see every event, first `A` then `B`
impl<A: PruneObserver, B: PruneObserver> PruneObserver for (A, B) {
    fn enter_dir(&mut self, path: &str) {
        self.0.enter_dir(path);
        self.1.enter_dir(path);
    }

    fn leave_dir(&mut self, path: &str, result: &TraversalResult) {
        self.0.leave_dir(path, result);
        self.1.leave_dir(path, result);
    }

    fn excluded(&mut self, path: &str, entry: &Entry) {
        self.0.excluded(path, entry);
        self.1.excluded(path, entry);
    }

    fn retained(&mut self, path: &str, entry: &Entry) {
        self.0.retained(path, entry);
        self.1.retained(path, entry);
    }

    fn file_removed(&mut self, path: &str, entry: &Entry, dry_run: bool) {
        self.0.file_removed(path, entry, dry_run);
        self.1.file_removed(path, entry, dry_run);
    }

    fn dir_removed(&mut self, path: &str, dry_run: bool) {
        self.0.dir_removed(path, dry_run);
        self.1.dir_removed(path, dry_run);
    }
}

/// Reports traversal events through `tracing`.
///
/// Levels follow the `-v` count: exclusions at info, removals at debug,
/// per-entry detail at trace.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PruneObserver for TracingObserver {
    fn enter_dir(&mut self, path: &str) {
        tracing::trace!(path, "checking path");
    }

    fn leave_dir(&mut self, path: &str, result: &TraversalResult) {
        tracing::trace!(
            path,
            deleted = result.deleted_count,
            bytes = result.deleted_bytes,
            removable = result.all_removable,
            "done with path"
        );
    }

    fn excluded(&mut self, path: &str, entry: &Entry) {
        tracing::info!(path, kind = ?entry.kind, "matched exclude pattern, skipping");
    }

    fn retained(&mut self, path: &str, entry: &Entry) {
        tracing::trace!(path, mtime = ?entry.modified, size = entry.size, "keeping");
    }

    fn file_removed(&mut self, path: &str, entry: &Entry, dry_run: bool) {
        if dry_run {
            tracing::debug!(path, size = entry.size, "list-only, not removing file");
        } else {
            tracing::debug!(path, size = entry.size, "removing file");
        }
    }

    fn dir_removed(&mut self, path: &str, dry_run: bool) {
        if dry_run {
            tracing::debug!(path, "list-only, not removing directory");
        } else {
            tracing::debug!(path, "removing directory");
        }
    }
}

/// Collects every path removed, or that would be removed on a dry run
#[derive(Debug, Default, Clone, Serialize)]
pub struct RemovalList {
    pub files: Vec<String>,
    pub dirs: Vec<String>,
}

impl RemovalList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len() + self.dirs.len()
    }
}

impl PruneObserver for RemovalList {
    fn file_removed(&mut self, path: &str, _entry: &Entry, _dry_run: bool) {
        self.files.push(path.to_string());
    }

    fn dir_removed(&mut self, path: &str, _dry_run: bool) {
        self.dirs.push(path.to_string());
    }
}

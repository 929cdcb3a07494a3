use super::{Cutoff, EntryFilter, Interrupt, PruneObserver, TraversalResult};
use crate::common::errors::PruneError;
use crate::remote::{Entry, EntryKind, RemoteFs, RemotePath};

/// Parameters that stay fixed for a whole traversal
#[derive(Debug, Clone)]
pub struct PruneOptions {
    pub cutoff: Cutoff,
    pub filter: EntryFilter,
    /// Decide and count, but never mutate the remote tree
    pub dry_run: bool,
}

impl PruneOptions {
    pub fn new(cutoff: Cutoff) -> Self {
        Self {
            cutoff,
            filter: EntryFilter::default(),
            dry_run: false,
        }
    }

    pub fn with_filter(mut self, filter: EntryFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Delete expired files below `path`, then every directory they emptied.
///
/// Depth-first and post-order: a subdirectory is removed by this level
/// only after its own walk reported it fully removable. `path` itself is
/// never removed; the returned `all_removable` tells the caller whether it
/// could be.
///
/// On a dry run the statistics are exactly those a real run would produce.
/// Any remote failure aborts the walk; deletions already made stay made.
pub fn prune<F, O>(
    fs: &mut F,
    path: &str,
    options: &PruneOptions,
    observer: &mut O,
    interrupt: &Interrupt,
) -> Result<TraversalResult, PruneError>
where
    F: RemoteFs + ?Sized,
    O: PruneObserver + ?Sized,
{
    walk(fs, &RemotePath::from(path), options, observer, interrupt)
}

fn walk<F, O>(
    fs: &mut F,
    dir: &RemotePath,
    options: &PruneOptions,
    observer: &mut O,
    interrupt: &Interrupt,
) -> Result<TraversalResult, PruneError>
where
    F: RemoteFs + ?Sized,
    O: PruneObserver + ?Sized,
{
    // Checked before every listing as well as before every entry, so an
    // interrupt never lets another remote call start
    if interrupt.is_triggered() {
        return Err(PruneError::Interrupted);
    }

    let shown = dir.to_string();
    observer.enter_dir(&shown);
    let entries = fs.list_entries(dir)?;
    let mut result = TraversalResult::empty();

    for entry in &entries {
        if interrupt.is_triggered() {
            return Err(PruneError::Interrupted);
        }

        // Remote calls get the exact bytes, observers the readable form
        let entry_path = dir.join(&entry.raw_name);
        let entry_shown = entry_path.to_string();

        // Excluded entries are invisible: no recursion, no statistics
        if options.filter.is_excluded(&entry.name) {
            observer.excluded(&entry_shown, entry);
            result.mark_kept();
            continue;
        }

        match entry.kind {
            EntryKind::Directory => {
                let sub = walk(fs, &entry_path, options, observer, interrupt)?;
                result.absorb(&sub);
                if sub.all_removable {
                    if !options.dry_run {
                        fs.remove_dir(&entry_path)?;
                    }
                    observer.dir_removed(&entry_shown, options.dry_run);
                }
            }
            EntryKind::File => {
                prune_file(fs, &entry_path, &entry_shown, entry, options, observer, &mut result)?
            }
        }
    }

    observer.leave_dir(&shown, &result);
    Ok(result)
}

/// An unknown modification time never counts as expired
fn prune_file<F, O>(
    fs: &mut F,
    entry_path: &RemotePath,
    entry_shown: &str,
    entry: &Entry,
    options: &PruneOptions,
    observer: &mut O,
    result: &mut TraversalResult,
) -> Result<(), PruneError>
where
    F: RemoteFs + ?Sized,
    O: PruneObserver + ?Sized,
{
    let expired = entry
        .modified
        .is_some_and(|modified| options.cutoff.is_expired(modified));
    if !expired || !options.filter.is_candidate(&entry.name) {
        result.record_retained(entry.modified);
        observer.retained(entry_shown, entry);
        return Ok(());
    }

    if !options.dry_run {
        fs.remove_file(entry_path)?;
    }
    result.record_deleted(entry.size);
    observer.file_removed(entry_shown, entry, options.dry_run);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::errors::RemoteError;
    use crate::pruner::RemovalList;
    use crate::remote::MemoryFs;

    const DAY: u64 = 86_400;
    const NOW: u64 = 1_700_000_000;

    fn cutoff_days(days: u64) -> Cutoff {
        Cutoff::at_timestamp((NOW - days * DAY) as i64)
    }

    fn days_old(days: u64) -> u64 {
        NOW - days * DAY
    }

    /// root: a.txt (10 days), sub/b.txt (10 days)
    fn sample_tree() -> MemoryFs {
        let mut fs = MemoryFs::new();
        fs.add_file("a.txt", days_old(10), 100)
            .add_file("sub/b.txt", days_old(10), 50);
        fs
    }

    fn run(fs: &mut MemoryFs, options: &PruneOptions) -> TraversalResult {
        prune(fs, ".", options, &mut (), &Interrupt::new()).unwrap()
    }

    #[test]
    fn test_everything_expired_is_removed() {
        let mut fs = sample_tree();
        let result = run(&mut fs, &PruneOptions::new(cutoff_days(5)));

        assert_eq!(result.deleted_count, 2);
        assert_eq!(result.deleted_bytes, 150);
        assert_eq!(result.newest_retained, 0);
        assert!(result.all_removable);
        assert!(!fs.exists("a.txt"));
        assert!(!fs.exists("sub"));
        // Sub's file goes first, then sub itself, from the parent's level
        assert_eq!(fs.removed(), &["./a.txt", "./sub/b.txt", "./sub"]);
    }

    #[test]
    fn test_excluded_leaf_is_invisible_and_pins_parent() {
        let mut fs = sample_tree();
        let options = PruneOptions::new(cutoff_days(5))
            .with_filter(EntryFilter::excluding("^b").unwrap());
        let result = run(&mut fs, &options);

        assert_eq!(result.deleted_count, 1);
        assert_eq!(result.deleted_bytes, 100);
        assert_eq!(result.newest_retained, 0);
        assert!(!result.all_removable);
        assert!(fs.exists("sub/b.txt"));
        assert!(fs.exists("sub"));
        assert!(!fs.exists("a.txt"));
    }

    #[test]
    fn test_excluded_directory_is_not_entered() {
        let mut fs = MemoryFs::new();
        fs.add_file("keep/old.txt", days_old(30), 10)
            .fail_list("keep");
        let options = PruneOptions::new(cutoff_days(5))
            .with_filter(EntryFilter::excluding("^keep$").unwrap());

        // Listing "keep" would fail, so success proves it was never listed
        let result = run(&mut fs, &options);
        assert_eq!(result.deleted_count, 0);
        assert!(!result.all_removable);
        assert!(fs.exists("keep/old.txt"));
    }

    #[test]
    fn test_file_at_cutoff_is_retained() {
        let mut fs = MemoryFs::new();
        fs.add_file("edge.txt", days_old(5), 1)
            .add_file("older.txt", days_old(5) - 1, 2);
        let result = run(&mut fs, &PruneOptions::new(cutoff_days(5)));

        assert_eq!(result.deleted_count, 1);
        assert_eq!(result.newest_retained, days_old(5));
        assert!(!result.all_removable);
        assert!(fs.exists("edge.txt"));
        assert!(!fs.exists("older.txt"));
    }

    #[test]
    fn test_young_file_keeps_directory_chain() {
        let mut fs = MemoryFs::new();
        fs.add_file("a/b/c/new.txt", days_old(1), 5)
            .add_file("a/b/old.txt", days_old(20), 7)
            .add_file("a/gone/old.txt", days_old(20), 9);
        let result = run(&mut fs, &PruneOptions::new(cutoff_days(5)));

        assert_eq!(result.deleted_count, 2);
        assert_eq!(result.deleted_bytes, 16);
        assert_eq!(result.newest_retained, days_old(1));
        assert!(!result.all_removable);
        assert!(fs.exists("a/b/c/new.txt"));
        assert!(!fs.exists("a/b/old.txt"));
        assert!(!fs.exists("a/gone"));
    }

    #[test]
    fn test_empty_directories_collapse() {
        let mut fs = MemoryFs::new();
        fs.add_dir("x/y/z", days_old(0));
        let result = run(&mut fs, &PruneOptions::new(cutoff_days(5)));

        assert_eq!(result, TraversalResult::empty());
        assert_eq!(fs.removed(), &["./x/y/z", "./x/y", "./x"]);
    }

    #[test]
    fn test_root_never_removed() {
        let mut fs = MemoryFs::new();
        fs.add_file("data/old.txt", days_old(10), 1);
        let result = prune(
            &mut fs,
            "data",
            &PruneOptions::new(cutoff_days(5)),
            &mut (),
            &Interrupt::new(),
        )
        .unwrap();

        assert!(result.all_removable);
        assert!(fs.exists("data"));
        assert_eq!(fs.removed(), &["data/old.txt"]);
    }

    #[test]
    fn test_dry_run_matches_real_run() {
        let build = || {
            let mut fs = MemoryFs::new();
            fs.add_file("a.txt", days_old(10), 100)
                .add_file("logs/new.log", days_old(1), 3)
                .add_file("logs/old.log", days_old(9), 4)
                .add_file("tmp/x/y.bin", days_old(40), 11)
                .add_dir("empty", days_old(2));
            fs
        };
        let options = PruneOptions::new(cutoff_days(5));

        let mut dry_fs = build();
        let mut dry_list = RemovalList::new();
        let dry = prune(&mut dry_fs, ".", &options.clone().dry_run(true), &mut dry_list, &Interrupt::new()).unwrap();

        let mut real_fs = build();
        let mut real_list = RemovalList::new();
        let real = prune(&mut real_fs, ".", &options, &mut real_list, &Interrupt::new()).unwrap();

        assert_eq!(dry, real);
        assert!(dry_fs.removed().is_empty());
        assert_eq!(dry_fs.file_count(), 4);
        assert_eq!(dry_list.files, real_list.files);
        assert_eq!(dry_list.dirs, real_list.dirs);
        assert_eq!(real_list.dirs, vec!["./tmp/x", "./tmp", "./empty"]);
    }

    #[test]
    fn test_include_limits_deletion_to_matches() {
        let mut fs = MemoryFs::new();
        fs.add_file("old.log", days_old(10), 1)
            .add_file("old.txt", days_old(10), 2);
        let options = PruneOptions::new(cutoff_days(5))
            .with_filter(EntryFilter::new(None, Some(r"\.log$")).unwrap());
        let result = run(&mut fs, &options);

        assert_eq!(result.deleted_count, 1);
        assert_eq!(result.newest_retained, days_old(10));
        assert!(!result.all_removable);
        assert!(fs.exists("old.txt"));
    }

    #[test]
    fn test_remove_failure_aborts() {
        let mut fs = MemoryFs::new();
        fs.add_file("a.txt", days_old(10), 1)
            .add_file("b.txt", days_old(10), 1)
            .add_file("c.txt", days_old(10), 1)
            .fail_remove("./b.txt");
        let err = prune(&mut fs, ".", &PruneOptions::new(cutoff_days(5)), &mut (), &Interrupt::new())
            .unwrap_err();

        assert!(matches!(err, PruneError::Remote(ref e) if e.path() == "./b.txt"));
        // a.txt stays deleted, c.txt was never reached
        assert!(!fs.exists("a.txt"));
        assert!(fs.exists("c.txt"));
    }

    #[test]
    fn test_file_without_mtime_is_kept() {
        let mut fs = MemoryFs::new();
        fs.add_file_without_mtime("no_mtime.dat", 64)
            .add_file("old.dat", days_old(10), 8);
        let result = run(&mut fs, &PruneOptions::new(cutoff_days(5)));

        assert_eq!(result.deleted_count, 1);
        assert_eq!(result.deleted_bytes, 8);
        assert_eq!(result.newest_retained, 0);
        assert!(!result.all_removable);
        assert!(fs.exists("no_mtime.dat"));
        assert_eq!(fs.removed(), &["./old.dat"]);
    }

    /// One flat directory whose names are not valid UTF-8
    struct RawNameFs {
        entries: Vec<Entry>,
        removed: Vec<Vec<u8>>,
    }

    impl RemoteFs for RawNameFs {
        fn list_entries(&mut self, _path: &RemotePath) -> Result<Vec<Entry>, RemoteError> {
            Ok(self.entries.clone())
        }

        fn remove_file(&mut self, path: &RemotePath) -> Result<(), RemoteError> {
            self.removed.push(path.as_bytes().to_vec());
            Ok(())
        }

        fn remove_dir(&mut self, path: &RemotePath) -> Result<(), RemoteError> {
            Err(RemoteError::remove_dir(path, "unexpected"))
        }
    }

    #[test]
    fn test_non_utf8_name_is_removed_by_its_raw_bytes() {
        let mut fs = RawNameFs {
            entries: vec![Entry::from_raw(
                b"caf\xe9.log".to_vec(),
                EntryKind::File,
                Some(days_old(10)),
                5,
            )],
            removed: Vec::new(),
        };
        let mut list = RemovalList::new();
        let result = prune(&mut fs, "/d", &PruneOptions::new(cutoff_days(5)), &mut list, &Interrupt::new())
            .unwrap();

        assert_eq!(result.deleted_count, 1);
        assert_eq!(fs.removed, vec![b"/d/caf\xe9.log".to_vec()]);
        assert_eq!(list.files, vec!["/d/caf\u{FFFD}.log"]);
    }

    #[test]
    fn test_exclude_matches_readable_name() {
        let mut fs = RawNameFs {
            entries: vec![Entry::from_raw(
                b"caf\xe9.keep".to_vec(),
                EntryKind::File,
                Some(days_old(10)),
                5,
            )],
            removed: Vec::new(),
        };
        let options = PruneOptions::new(cutoff_days(5))
            .with_filter(EntryFilter::excluding(r"\.keep$").unwrap());
        let result = prune(&mut fs, "/d", &options, &mut (), &Interrupt::new()).unwrap();

        assert_eq!(result.deleted_count, 0);
        assert!(fs.removed.is_empty());
    }

    #[test]
    fn test_interrupt_before_listing_empty_dir() {
        let mut fs = MemoryFs::new();
        fs.add_dir("root", days_old(1));
        let interrupt = Interrupt::new();
        interrupt.trigger();

        let err = prune(&mut fs, "root", &PruneOptions::new(cutoff_days(5)), &mut (), &interrupt)
            .unwrap_err();
        assert!(err.is_interrupted());
    }

    #[test]
    fn test_interrupt_stops_before_next_entry() {
        let mut fs = sample_tree();
        let interrupt = Interrupt::new();
        interrupt.trigger();
        let err = prune(&mut fs, ".", &PruneOptions::new(cutoff_days(5)), &mut (), &interrupt)
            .unwrap_err();

        assert!(err.is_interrupted());
        assert!(fs.removed().is_empty());
    }
}

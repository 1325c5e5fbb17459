//! End-to-end tracker integration tests.
//!
//! These tests exercise the real event→flush→publish cycle: a tracker fed
//! by a crossbeam channel, a background thread flushing on a short tick,
//! and read queries observing snapshot swaps. The statistics source is an
//! in-memory map that records every read it serves, so the tests can assert
//! not just *what* the tracker published but *how many* queries it took.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use compact_str::CompactString;
use foldersight_core::model::path::{is_under, normalize_folder};
use foldersight_core::model::{FolderEntry, TYPE_FOLDER};
use foldersight_core::source::{FolderStatsScope, FolderStatsSource, StatsError};
use foldersight_core::tracker::{ChangeEvent, ResourceRef};
use foldersight_core::{FolderSizeTracker, TrackerConfig};
use parking_lot::Mutex;
use uuid::Uuid;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// A read served by [`RecordingSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
struct Read {
    root_path: CompactString,
    recursive: bool,
}

/// Mutable in-memory statistics source that logs every read.
///
/// Folder ids derive from paths, so an unchanged folder always reads back
/// as an identical record. Paths added to `failing` make any query rooted
/// there return a backend error.
struct RecordingSource {
    folders: Mutex<BTreeMap<CompactString, u64>>,
    reads: Mutex<Vec<Read>>,
    failing: Mutex<Vec<CompactString>>,
}

impl RecordingSource {
    fn new(folders: &[(&str, u64)]) -> Arc<Self> {
        Arc::new(Self {
            folders: Mutex::new(
                folders
                    .iter()
                    .map(|&(path, size)| (normalize_folder(path), size))
                    .collect(),
            ),
            reads: Mutex::new(Vec::new()),
            failing: Mutex::new(Vec::new()),
        })
    }

    fn set(&self, path: &str, size: u64) {
        self.folders.lock().insert(normalize_folder(path), size);
    }

    fn remove(&self, path: &str) {
        self.folders.lock().remove(normalize_folder(path).as_str());
    }

    fn fail_on(&self, path: &str) {
        self.failing.lock().push(normalize_folder(path));
    }

    fn clear_reads(&self) {
        self.reads.lock().clear();
    }

    fn single_reads_of(&self, path: &str) -> usize {
        let path = normalize_folder(path);
        self.reads
            .lock()
            .iter()
            .filter(|read| !read.recursive && read.root_path == path)
            .count()
    }
}

impl FolderStatsSource for RecordingSource {
    fn read_folder_stats(&self, scope: &FolderStatsScope) -> Result<Vec<FolderEntry>, StatsError> {
        self.reads.lock().push(Read {
            root_path: scope.root_path.clone(),
            recursive: scope.recursive,
        });
        if self
            .failing
            .lock()
            .iter()
            .any(|path| path == &scope.root_path)
        {
            return Err(StatsError::Backend("simulated store failure".into()));
        }

        let record = |path: &str, size: u64| {
            FolderEntry::new(
                Uuid::new_v5(&Uuid::NAMESPACE_OID, path.as_bytes()),
                path,
                size,
                TYPE_FOLDER,
            )
        };
        let folders = self.folders.lock();
        if scope.recursive {
            Ok(folders
                .iter()
                .filter(|(path, _)| is_under(path, &scope.root_path))
                .map(|(path, &size)| record(path, size))
                .collect())
        } else {
            Ok(folders
                .get(scope.root_path.as_str())
                .map(|&size| record(&scope.root_path, size))
                .into_iter()
                .collect())
        }
    }
}

/// The standing fixture: /a/ (10), /a/b/ (5), /a/b/c/ (2).
fn fixture() -> Arc<RecordingSource> {
    RecordingSource::new(&[("/a/", 10), ("/a/b/", 5), ("/a/b/c/", 2)])
}

fn fast_config() -> TrackerConfig {
    TrackerConfig {
        flush_interval: Duration::from_millis(50),
        resync_interval: Duration::from_secs(3_600),
        online: true,
    }
}

/// Poll `condition` every 10 ms until it holds, failing after 10 seconds —
/// generous for any CI machine, short enough that a stuck test does not
/// block the suite.
fn wait_for(description: &str, mut condition: impl FnMut() -> bool) {
    let deadline = std::time::Instant::now() + Duration::from_secs(10);
    while !condition() {
        assert!(
            std::time::Instant::now() < deadline,
            "timed out waiting for: {description}"
        );
        std::thread::sleep(Duration::from_millis(10));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

/// An event sent through the channel must become visible in read queries
/// within a flush cycle.
#[test]
fn event_becomes_visible_after_flush() {
    let source = fixture();
    let tracker = Arc::new(FolderSizeTracker::new(fast_config(), source.clone()));
    let (tx, rx) = crossbeam_channel::unbounded();
    let handle = Arc::clone(&tracker).initialize(rx);

    // `initialize` performs the initial load synchronously.
    assert_eq!(tracker.total_folder_size("/a/"), Some(17));

    source.set("/a/b/", 50);
    tx.send(ChangeEvent::Modified(ResourceRef::file("/a/b/new.bin")))
        .unwrap();

    wait_for("updated size to be published", || {
        tracker.total_folder_size("/a/") == Some(62)
    });

    handle.stop();
}

/// Three events for the same file before a flush must trigger exactly one
/// single-folder read for its parent.
#[test]
fn event_burst_dedups_to_one_read() {
    let source = fixture();
    let tracker = Arc::new(FolderSizeTracker::new(fast_config(), source.clone()));
    tracker.reload();
    source.clear_reads();

    let event = ChangeEvent::Modified(ResourceRef::file("/a/b/file.txt"));
    tracker.notify(&event);
    tracker.notify(&event);
    tracker.notify(&event);
    assert_eq!(tracker.pending_folders(), 1);

    tracker.flush();
    assert_eq!(source.single_reads_of("/a/b/"), 1);
}

/// A per-folder query failure must leave that folder's stale entry in
/// place while the rest of the flush goes through.
#[test]
fn failed_folder_keeps_stale_entry() {
    let source = fixture();
    let tracker = Arc::new(FolderSizeTracker::new(fast_config(), source.clone()));
    tracker.reload();

    source.set("/a/b/", 500);
    source.set("/a/b/c/", 900);
    source.fail_on("/a/b/");

    tracker.notify(&ChangeEvent::Modified(ResourceRef::folder("/a/b/")));
    tracker.notify(&ChangeEvent::Modified(ResourceRef::folder("/a/b/c/")));
    tracker.flush();

    // /a/b/ kept its stale 5; /a/b/c/ refreshed to 900.
    assert_eq!(tracker.total_folder_size("/a/b/"), Some(905));
    assert_eq!(tracker.stats().flush_count, 1);
}

/// A moved folder drops its source entry and appears at the destination;
/// descendants of the old path stay stale until a subtree refresh, by
/// design.
#[test]
fn folder_move_converges_with_refresh() {
    let source = fixture();
    let tracker = Arc::new(FolderSizeTracker::new(fast_config(), source.clone()));
    tracker.reload();

    // Move /a/b/ (and its child) to /z/b/ in the backing store.
    source.remove("/a/b/");
    source.remove("/a/b/c/");
    source.set("/z/", 0);
    source.set("/z/b/", 5);
    source.set("/z/b/c/", 2);

    tracker.notify(&ChangeEvent::Moved {
        source: ResourceRef::folder("/a/b/"),
        destination: ResourceRef::folder("/z/b/"),
    });
    tracker.flush();

    // Source folder entry is gone, destination is indexed; the moved
    // subtree's descendant (/a/b/c/) is still indexed stale under /a/.
    assert_eq!(tracker.snapshot().unwrap().get("/a/b/"), None);
    assert_eq!(tracker.total_folder_size("/z/b/"), Some(5));
    assert_eq!(tracker.total_folder_size("/a/"), Some(12));

    // The explicit subtree refresh clears the stale descendant.
    tracker.refresh("/a/");
    assert_eq!(tracker.total_folder_size("/a/"), Some(10));
    tracker.refresh("/z/");
    assert_eq!(tracker.total_folder_size("/z/"), Some(7));
}

/// Dropping every event sender shuts the background thread down after a
/// final drain of the pending set.
#[test]
fn sender_drop_drains_pending_updates() {
    let source = fixture();
    let tracker = Arc::new(FolderSizeTracker::new(fast_config(), source.clone()));
    let (tx, rx) = crossbeam_channel::unbounded();
    let _handle = Arc::clone(&tracker).initialize(rx);

    source.set("/a/", 100);
    tx.send(ChangeEvent::Modified(ResourceRef::file("/a/direct.bin")))
        .unwrap();
    drop(tx);

    wait_for("final drain to publish the update", || {
        tracker.total_folder_size("/a/") == Some(107)
    });
}

/// A full reload failure must keep the last good table serving reads.
#[test]
fn reload_failure_keeps_last_good_table() {
    let source = fixture();
    let tracker = Arc::new(FolderSizeTracker::new(fast_config(), source.clone()));
    tracker.reload();
    assert_eq!(tracker.total_folder_size("/a/"), Some(17));

    source.fail_on("/");
    tracker.reload();
    assert_eq!(tracker.total_folder_size("/a/"), Some(17));
    assert_eq!(tracker.stats().reload_count, 1);
}

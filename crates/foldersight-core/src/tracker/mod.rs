//! Long-lived folder size tracker.
//!
//! The tracker owns the currently published [`FolderSizeTable`] snapshot, a
//! deduplicating set of folders awaiting recomputation, and a background
//! thread that multiplexes change-event intake with the periodic flush and
//! the daily full resync.
//!
//! # Consistency model
//!
//! Readers always see a fully built, previously published table — updates
//! clone the current table, refresh the affected entries on the clone, and
//! swap the shared reference in one step. Flush, reload, and refresh are
//! serialized through a single update mutex; reads never take it. There is
//! no read-after-write guarantee: results may trail reality by up to one
//! flush interval, which is the point of the design — size figures here are
//! advisory, never authoritative.

pub mod events;

pub use events::{ChangeEvent, ResourceKind, ResourceRef};

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local};
use compact_str::CompactString;
use crossbeam_channel::Receiver;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, trace, warn};

use crate::config::TrackerConfig;
use crate::model::FolderReportEntry;
use crate::source::FolderStatsSource;
use crate::table::FolderSizeTable;

/// Coordinator that keeps a folder size table continuously refreshed.
///
/// Construct with [`FolderSizeTracker::new`], wrap in an `Arc`, and call
/// [`initialize`](FolderSizeTracker::initialize) once. All read queries
/// return their "unknown" sentinel (`None` / empty map) until the first
/// successful load, and forever when the configuration disables tracking.
pub struct FolderSizeTracker {
    config: TrackerConfig,
    source: Arc<dyn FolderStatsSource>,

    /// The published snapshot. `None` until the first successful load.
    /// Written only under `update_lock`; read without it.
    table: RwLock<Option<Arc<FolderSizeTable>>>,

    /// Folders awaiting recomputation. A set, so event bursts for one
    /// folder collapse to a single pending entry.
    pending: Mutex<HashSet<CompactString>>,

    /// Serializes flush / reload / refresh. Readers never take this.
    update_lock: Mutex<()>,

    flush_count: AtomicU64,
    reload_count: AtomicU64,
    last_flush: Mutex<Option<DateTime<Local>>>,
}

/// Handle to a running tracker's background thread.
///
/// Call [`TrackerHandle::stop`] to shut the thread down; it exits within
/// ~400 ms of the signal. Dropping the handle leaves the thread running
/// detached for the lifetime of the process.
pub struct TrackerHandle {
    cancel: Arc<AtomicBool>,
    _thread: Option<thread::JoinHandle<()>>,
}

impl TrackerHandle {
    /// Signal the background thread to stop. Non-blocking.
    pub fn stop(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

/// Point-in-time counters for host observability.
#[derive(Debug, Clone)]
pub struct TrackerStats {
    /// Folders in the published table, or `None` before the first load.
    pub indexed_folders: Option<usize>,
    /// Folders currently awaiting recomputation.
    pub pending_folders: usize,
    /// Completed incremental flushes.
    pub flush_count: u64,
    /// Completed full reloads.
    pub reload_count: u64,
    /// Wall-clock time of the most recent flush.
    pub last_flush: Option<DateTime<Local>>,
}

impl FolderSizeTracker {
    /// Create a tracker. Nothing is loaded until
    /// [`initialize`](Self::initialize) (or an explicit
    /// [`reload`](Self::reload)) runs.
    pub fn new(config: TrackerConfig, source: Arc<dyn FolderStatsSource>) -> Self {
        Self {
            config,
            source,
            table: RwLock::new(None),
            pending: Mutex::new(HashSet::new()),
            update_lock: Mutex::new(()),
            flush_count: AtomicU64::new(0),
            reload_count: AtomicU64::new(0),
            last_flush: Mutex::new(None),
        }
    }

    /// Whether tracking is enabled at all.
    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    /// Perform the initial load, subscribe to `events`, and start the
    /// background thread running the periodic flush and the full resync.
    ///
    /// With a disabled configuration this is a no-op returning an inert
    /// handle: no thread, no loads, sentinel reads forever.
    ///
    /// Consumes one `Arc` to hand the background thread its reference;
    /// call as `Arc::clone(&tracker).initialize(events)` to keep yours.
    pub fn initialize(self: Arc<Self>, events: Receiver<ChangeEvent>) -> TrackerHandle {
        let cancel = Arc::new(AtomicBool::new(false));
        if !self.is_enabled() {
            info!("folder size tracking disabled (flush interval is zero)");
            return TrackerHandle {
                cancel,
                _thread: None,
            };
        }

        self.reload();

        let tracker = Arc::clone(&self);
        let cancel_flag = Arc::clone(&cancel);
        let flush_interval = self.config.flush_interval;
        let resync_interval = self.config.resync_interval;

        let thread = thread::Builder::new()
            .name("foldersight-tracker".to_owned())
            .spawn(move || {
                run_tracker(tracker, events, flush_interval, resync_interval, cancel_flag)
            })
            .expect("failed to spawn tracker thread");

        TrackerHandle {
            cancel,
            _thread: Some(thread),
        }
    }

    // ─── Event intake ───────────────────────────────────────────────────────

    /// Record a change notification. Cheap; callable from arbitrary threads.
    ///
    /// The affected folders are added to the pending set and picked up by
    /// the next flush. Repeat notifications for the same folder before that
    /// flush collapse to one entry.
    pub fn notify(&self, event: &ChangeEvent) {
        if !self.is_enabled() {
            return;
        }
        let folders = event.affected_folders();
        if folders.is_empty() {
            return;
        }
        let mut pending = self.pending.lock();
        for folder in folders {
            if pending.insert(folder.clone()) {
                trace!("queued size refresh for {folder}");
            }
        }
    }

    /// Number of folders currently awaiting recomputation.
    pub fn pending_folders(&self) -> usize {
        self.pending.lock().len()
    }

    // ─── Update cycle ───────────────────────────────────────────────────────

    /// Drain the pending set and publish a new table with each affected
    /// folder's entry refreshed.
    ///
    /// A per-folder query failure is logged and leaves that folder's stale
    /// entry in place — one broken folder must not block the whole flush.
    /// Normally driven by the background thread; public so hosts and tests
    /// can force a deterministic flush.
    pub fn flush(&self) {
        if !self.is_enabled() {
            return;
        }
        let folders: Vec<CompactString> = {
            let mut pending = self.pending.lock();
            pending.drain().collect()
        };
        if folders.is_empty() {
            return;
        }

        let _update = self.update_lock.lock();
        let current = self.table.read().clone();
        match current {
            Some(current) => {
                let mut next = (*current).clone();
                let mut failed = 0usize;
                for folder in &folders {
                    if let Err(err) = next.update_single(folder) {
                        failed += 1;
                        warn!("size refresh for {folder} failed, keeping stale entry: {err}");
                    }
                }
                self.publish(next);
                self.flush_count.fetch_add(1, Ordering::Relaxed);
                *self.last_flush.lock() = Some(Local::now());
                debug!("flushed {} folder updates ({failed} failed)", folders.len());
            }
            None => {
                // Nothing published yet (the initial load failed) — a full
                // build covers the drained folders as well.
                self.reload_locked();
            }
        }
    }

    /// Force a full rebuild. Usable at any time as a correctness backstop;
    /// on failure the previous table keeps serving reads.
    pub fn reload(&self) {
        if !self.is_enabled() {
            return;
        }
        let _update = self.update_lock.lock();
        self.reload_locked();
    }

    /// Immediately re-query one subtree outside the normal flush cycle.
    pub fn refresh(&self, root_path: &str) {
        if !self.is_enabled() {
            return;
        }
        let _update = self.update_lock.lock();
        let mut next = match self.table.read().clone() {
            Some(current) => (*current).clone(),
            None => FolderSizeTable::new(self.source.clone(), self.config.online),
        };
        match next.update_tree(root_path) {
            Ok(()) => self.publish(next),
            Err(err) => {
                warn!("subtree refresh of {root_path} failed, keeping previous table: {err}");
            }
        }
    }

    /// Rebuild into a fresh table and publish it. Caller holds `update_lock`.
    fn reload_locked(&self) {
        let mut fresh = FolderSizeTable::new(self.source.clone(), self.config.online);
        match fresh.load_all() {
            Ok(()) => {
                info!("folder size table reloaded: {} folders indexed", fresh.len());
                self.publish(fresh);
                self.reload_count.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                warn!("folder size reload failed, keeping previous table: {err}");
            }
        }
    }

    /// Swap the published snapshot. Caller holds `update_lock`.
    fn publish(&self, next: FolderSizeTable) {
        *self.table.write() = Some(Arc::new(next));
    }

    // ─── Read queries ───────────────────────────────────────────────────────

    /// The currently published table, if any. Never blocks on updates.
    pub fn snapshot(&self) -> Option<Arc<FolderSizeTable>> {
        self.table.read().clone()
    }

    /// Recursive byte total for a folder, or `None` while no table has been
    /// published (uninitialized or disabled tracker).
    pub fn total_folder_size(&self, root_path: &str) -> Option<u64> {
        self.snapshot()
            .map(|table| table.total_folder_size(root_path))
    }

    /// Recursive byte total excluding separately accounted subtrees; `None`
    /// sentinel as above.
    pub fn total_folder_size_exclusive<S: AsRef<str>>(
        &self,
        root_path: &str,
        other_paths: &[S],
    ) -> Option<u64> {
        self.snapshot()
            .map(|table| table.total_folder_size_exclusive(root_path, other_paths))
    }

    /// Batched per-folder aggregates; empty map while no table is published.
    pub fn folder_report<S: AsRef<str>>(
        &self,
        folders: &[S],
    ) -> HashMap<CompactString, FolderReportEntry> {
        match self.snapshot() {
            Some(table) => table.folder_report(folders),
            None => HashMap::new(),
        }
    }

    /// Current counters.
    pub fn stats(&self) -> TrackerStats {
        TrackerStats {
            indexed_folders: self.snapshot().map(|table| table.len()),
            pending_folders: self.pending_folders(),
            flush_count: self.flush_count.load(Ordering::Relaxed),
            reload_count: self.reload_count.load(Ordering::Relaxed),
            last_flush: *self.last_flush.lock(),
        }
    }
}

// ─── Background thread ──────────────────────────────────────────────────────

/// Multiplex event intake with the flush and resync ticks until cancelled.
fn run_tracker(
    tracker: Arc<FolderSizeTracker>,
    events: Receiver<ChangeEvent>,
    flush_interval: Duration,
    resync_interval: Duration,
    cancel: Arc<AtomicBool>,
) {
    debug!("tracker thread started, flushing every {flush_interval:?}");

    let flush_tick = crossbeam_channel::tick(flush_interval);
    let resync_tick = crossbeam_channel::tick(resync_interval);

    loop {
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        crossbeam_channel::select! {
            recv(events) -> event => match event {
                Ok(event) => tracker.notify(&event),
                Err(_) => {
                    // Every sender is gone — the host is shutting down.
                    // Drain what we have and stop instead of spinning on a
                    // dead channel.
                    debug!("event channel closed, draining pending updates");
                    tracker.flush();
                    break;
                }
            },
            recv(flush_tick) -> _ => tracker.flush(),
            recv(resync_tick) -> _ => tracker.reload(),
            // Wake up periodically to re-check the cancel flag.
            default(Duration::from_millis(200)) => {}
        }
    }

    debug!("tracker thread stopped");
}

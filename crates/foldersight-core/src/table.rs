//! Snapshot table answering folder size queries.
//!
//! A table is a [`PathTrie`] of single-folder records plus the procedures
//! that refresh them from the statistics source. Subtree totals are never
//! stored — they are computed on demand by summing a prefix range, so a
//! single-folder refresh can never leave a precomputed aggregate stale.
//!
//! Once a table has been published for readers it is treated as immutable:
//! updates clone the table, mutate the clone, and swap it in whole (the
//! tracker owns that discipline). The update procedures here query the
//! source **before** touching the store, so a failed query propagates
//! without leaving the receiver half-mutated.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use compact_str::CompactString;
use tracing::debug;

use crate::model::path::{is_under, normalize_folder, parent_folder};
use crate::model::{FolderEntry, FolderReportEntry, PathTrie};
use crate::source::{FolderStatsScope, FolderStatsSource, StatsError};

/// Prefix-indexed folder size table over an injected statistics source.
#[derive(Clone)]
pub struct FolderSizeTable {
    store: PathTrie,
    source: Arc<dyn FolderStatsSource>,
    online: bool,
}

impl fmt::Debug for FolderSizeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FolderSizeTable")
            .field("folders", &self.store.len())
            .field("online", &self.online)
            .finish()
    }
}

impl FolderSizeTable {
    /// Create an empty table reading from `source`, scoped to the online or
    /// offline project.
    pub fn new(source: Arc<dyn FolderStatsSource>, online: bool) -> Self {
        Self {
            store: PathTrie::new(),
            source,
            online,
        }
    }

    /// Which project this table reads statistics from.
    pub fn online(&self) -> bool {
        self.online
    }

    /// Look up the direct-children size record for one folder.
    pub fn get(&self, root_path: &str) -> Option<&FolderEntry> {
        self.store.get(&normalize_folder(root_path))
    }

    /// Iterate all indexed entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = &FolderEntry> {
        self.store.iter()
    }

    /// Number of indexed folders.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    // ─── Aggregate queries ──────────────────────────────────────────────────

    /// Recursive byte total for `root_path`: its own entry plus every
    /// indexed descendant. A path with no indexed entries totals 0.
    pub fn total_folder_size(&self, root_path: &str) -> u64 {
        let root = normalize_folder(root_path);
        self.store.entries_under(&root).map(|entry| entry.size).sum()
    }

    /// Recursive byte total for `root_path`, excluding every subtree rooted
    /// at a path in `other_paths` that is not an ancestor-or-self of
    /// `root_path`.
    ///
    /// This is how a caller reporting on several folders at once avoids
    /// charging a nested folder's bytes to more than one of them.
    pub fn total_folder_size_exclusive<S: AsRef<str>>(
        &self,
        root_path: &str,
        other_paths: &[S],
    ) -> u64 {
        let root = normalize_folder(root_path);

        // An "other" that encloses `root` would strip the entire range;
        // only genuinely separate subtrees are excluded.
        let exclusions: Vec<CompactString> = other_paths
            .iter()
            .map(|path| normalize_folder(path.as_ref()))
            .filter(|other| !is_under(&root, other))
            .collect();

        self.store
            .entries_under(&root)
            .filter(|entry| {
                !exclusions
                    .iter()
                    .any(|excluded| is_under(&entry.root_path, excluded))
            })
            .map(|entry| entry.size)
            .sum()
    }

    /// Batched aggregates for many folders in one pass over the index.
    ///
    /// Every requested folder appears in the result. `tree_size` is its full
    /// recursive total; `tree_size_exclusive` attributes each indexed entry
    /// only to the nearest requested ancestor, so nested requests are not
    /// double-charged.
    ///
    /// Sorting the normalized requests places descendants immediately after
    /// their ancestors, so one forward scan keeping only paths that are not
    /// under the previously kept one yields the minimal set of non-nested
    /// root prefixes to walk. Each indexed entry under a root is then
    /// attributed by climbing its ancestor chain once, instead of rescanning
    /// the range per requested folder.
    pub fn folder_report<S: AsRef<str>>(
        &self,
        folders: &[S],
    ) -> HashMap<CompactString, FolderReportEntry> {
        let mut requested: Vec<CompactString> = folders
            .iter()
            .map(|folder| normalize_folder(folder.as_ref()))
            .collect();
        requested.sort_unstable();
        requested.dedup();

        let mut report: HashMap<CompactString, FolderReportEntry> = requested
            .iter()
            .map(|path| (path.clone(), FolderReportEntry::default()))
            .collect();

        // Minimal mutually non-nested prefixes covering every request.
        let mut scan_roots: Vec<&CompactString> = Vec::new();
        for path in &requested {
            match scan_roots.last() {
                Some(last) if is_under(path, last) => {}
                _ => scan_roots.push(path),
            }
        }

        for &root in &scan_roots {
            for entry in self.store.entries_under(root) {
                let size = entry.size;
                let mut nearest_taken = false;
                let mut cursor = entry.root_path.clone();
                loop {
                    if let Some(folder_report) = report.get_mut(cursor.as_str()) {
                        folder_report.tree_size += size;
                        if !nearest_taken {
                            folder_report.tree_size_exclusive += size;
                            nearest_taken = true;
                        }
                    }
                    if cursor.as_str() == root.as_str() {
                        break;
                    }
                    match parent_folder(&cursor) {
                        Some(parent) => cursor = parent,
                        None => break,
                    }
                }
            }
        }

        report
    }

    // ─── Refresh procedures ─────────────────────────────────────────────────

    /// Full rebuild from a recursive root query. Expensive; used for cold
    /// start and the periodic correctness resync.
    pub fn load_all(&mut self) -> Result<(), StatsError> {
        let scope = FolderStatsScope::tree("/", self.online);
        let records = self.source.read_folder_stats(&scope)?;

        let mut store = PathTrie::new();
        for record in records {
            store.insert(record);
        }
        debug!("full reload indexed {} folders", store.len());
        self.store = store;
        Ok(())
    }

    /// Re-query exactly one folder and replace its entry, or remove the
    /// entry when the folder no longer exists.
    pub fn update_single(&mut self, root_path: &str) -> Result<(), StatsError> {
        let root = normalize_folder(root_path);
        let scope = FolderStatsScope::single(&root, self.online);
        let records = self.source.read_folder_stats(&scope)?;

        match records.into_iter().next() {
            Some(record) => {
                self.store.insert(record);
            }
            None => {
                self.store.remove(&root);
            }
        }
        Ok(())
    }

    /// Re-query a folder and its whole subtree: the indexed prefix range is
    /// cleared and the fresh records take its place.
    pub fn update_tree(&mut self, root_path: &str) -> Result<(), StatsError> {
        let root = normalize_folder(root_path);
        let scope = FolderStatsScope::tree(&root, self.online);
        let records = self.source.read_folder_stats(&scope)?;

        let cleared = self.store.remove_under(&root);
        for record in records {
            self.store.insert(record);
        }
        debug!(
            "subtree refresh of {root}: {cleared} entries cleared, {} now indexed",
            self.store.entries_under(&root).count()
        );
        Ok(())
    }
}

//! Filesystem-backed statistics source.
//!
//! Maps a virtual folder tree rooted at `/` onto a base directory and
//! answers statistics queries by reading the real filesystem: one
//! `read_dir` pass for single-folder scopes, a `jwalk` walk for subtree
//! scopes. Per-folder sizes count **direct child files only**, matching the
//! table's aggregation contract.
//!
//! Unreadable entries are skipped with a warning rather than failing the
//! whole query — one permission error must not blank out an entire subtree.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use tracing::warn;
use uuid::Uuid;

use crate::model::{path::normalize_folder, FolderEntry, TYPE_FOLDER};

use super::{FolderStatsScope, FolderStatsSource, StatsError};

/// Statistics source reading a local directory tree.
///
/// The virtual root `/` corresponds to `base`. Structure ids are derived
/// from the virtual path (UUID v5), so repeated reads of an unchanged
/// folder produce identical records.
///
/// The filesystem has no online/offline split; the scope's project flag is
/// accepted and ignored.
#[derive(Debug, Clone)]
pub struct FsStatsSource {
    base: PathBuf,
}

impl FsStatsSource {
    /// Create a source serving the tree rooted at `base`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Map a virtual folder path onto the filesystem.
    fn resolve(&self, virtual_path: &str) -> PathBuf {
        virtual_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.base.clone(), |path, segment| path.join(segment))
    }

    /// Map a filesystem directory back to its virtual folder path.
    ///
    /// Returns `None` for paths outside the base directory.
    fn virtual_path(&self, path: &Path) -> Option<CompactString> {
        let relative = path.strip_prefix(&self.base).ok()?;
        let mut virtual_path = CompactString::const_new("/");
        for component in relative.components() {
            virtual_path.push_str(&component.as_os_str().to_string_lossy());
            virtual_path.push('/');
        }
        Some(virtual_path)
    }

    /// Stable id for a virtual path.
    fn structure_id(virtual_path: &str) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_URL, virtual_path.as_bytes())
    }

    /// Read exactly one folder: sum the direct child files.
    fn read_single(&self, virtual_path: &str, dir: &Path) -> Result<Vec<FolderEntry>, StatsError> {
        let mut size: u64 = 0;
        for entry in std::fs::read_dir(dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("skipping unreadable entry in {}: {err}", dir.display());
                    continue;
                }
            };
            match entry.metadata() {
                Ok(meta) if meta.is_file() => size += meta.len(),
                Ok(_) => {}
                Err(err) => {
                    warn!("skipping unreadable entry in {}: {err}", dir.display());
                }
            }
        }
        Ok(vec![FolderEntry::new(
            Self::structure_id(virtual_path),
            virtual_path,
            size,
            TYPE_FOLDER,
        )])
    }

    /// Read a folder and its whole subtree in one walk.
    fn read_tree(&self, virtual_root: &str, dir: &Path) -> Result<Vec<FolderEntry>, StatsError> {
        // Every folder gets a record even when it holds no files, so the
        // table can index empty folders and drop them when they vanish.
        let mut sums: BTreeMap<CompactString, u64> = BTreeMap::new();
        sums.insert(CompactString::new(virtual_root), 0);

        let walker = jwalk::WalkDir::new(dir).skip_hidden(false).follow_links(false);
        for entry_result in walker {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(err) => {
                    // Typically access-denied on a directory.
                    warn!("skipping unreadable subtree entry: {err}");
                    continue;
                }
            };

            let path = entry.path();
            if entry.file_type().is_dir() {
                if let Some(virtual_path) = self.virtual_path(&path) {
                    sums.entry(virtual_path).or_insert(0);
                }
            } else {
                let size = match std::fs::symlink_metadata(&path) {
                    Ok(meta) => meta.len(),
                    Err(err) => {
                        warn!("skipping unreadable file {}: {err}", path.display());
                        continue;
                    }
                };
                let parent_virtual = path.parent().and_then(|parent| self.virtual_path(parent));
                if let Some(parent_virtual) = parent_virtual {
                    *sums.entry(parent_virtual).or_insert(0) += size;
                }
            }
        }

        Ok(sums
            .into_iter()
            .map(|(virtual_path, size)| {
                FolderEntry::new(
                    Self::structure_id(&virtual_path),
                    &virtual_path,
                    size,
                    TYPE_FOLDER,
                )
            })
            .collect())
    }
}

impl FolderStatsSource for FsStatsSource {
    fn read_folder_stats(&self, scope: &FolderStatsScope) -> Result<Vec<FolderEntry>, StatsError> {
        let virtual_path = normalize_folder(&scope.root_path);
        let dir = self.resolve(&virtual_path);

        // A vanished folder is absence, not a fault.
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        if scope.recursive {
            self.read_tree(&virtual_path, &dir)
        } else {
            self.read_single(&virtual_path, &dir)
        }
    }
}

//! The folder-statistics collaborator contract.
//!
//! The size table never reads the underlying resource store itself; it asks
//! an injected [`FolderStatsSource`] for fresh per-folder records. Anything
//! that can answer "what are the direct-child byte totals for these
//! folders?" can back the engine — a database, a remote service, or the
//! local filesystem ([`fs::FsStatsSource`]).

pub mod fs;

use compact_str::CompactString;
use thiserror::Error;

use crate::model::{path::normalize_folder, FolderEntry};

/// Scope of one statistics query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderStatsScope {
    /// Normalized folder path the query is rooted at.
    pub root_path: CompactString,

    /// Whether to read from the online (published) or offline (staging)
    /// project of the resource store.
    pub online: bool,

    /// `false` reads exactly one folder; `true` reads the folder and its
    /// whole subtree.
    pub recursive: bool,
}

impl FolderStatsScope {
    /// Scope covering exactly one folder.
    pub fn single(root_path: &str, online: bool) -> Self {
        Self {
            root_path: normalize_folder(root_path),
            online,
            recursive: false,
        }
    }

    /// Scope covering a folder and its full subtree.
    pub fn tree(root_path: &str, online: bool) -> Self {
        Self {
            root_path: normalize_folder(root_path),
            online,
            recursive: true,
        }
    }
}

/// Failure reading folder statistics from the backing store.
#[derive(Debug, Error)]
pub enum StatsError {
    /// The backing store reported a failure of its own.
    #[error("statistics backend error: {0}")]
    Backend(String),

    /// I/O failure while reading statistics.
    #[error("I/O error reading folder statistics: {0}")]
    Io(#[from] std::io::Error),
}

/// Supplier of per-folder size records.
///
/// Implementations must be callable from the tracker's background thread as
/// well as host threads. A folder that does not exist is reported as an
/// empty result, not an error — absence drives entry removal in the table.
pub trait FolderStatsSource: Send + Sync {
    /// Read one record per folder in `scope`.
    fn read_folder_stats(&self, scope: &FolderStatsScope) -> Result<Vec<FolderEntry>, StatsError>;
}

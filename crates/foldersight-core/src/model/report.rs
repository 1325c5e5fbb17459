//! Per-folder aggregate results returned by batch reports.

use serde::{Deserialize, Serialize};

/// Aggregates for one requested folder in a batch report.
///
/// `tree_size` is the full recursive total for the folder. When several of
/// the requested folders are nested inside each other, `tree_size_exclusive`
/// attributes every indexed entry only to the **nearest** requested ancestor,
/// so summing the exclusive totals never double-counts a nested subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderReportEntry {
    /// Recursive byte total: the folder's own entry plus every indexed descendant.
    pub tree_size: u64,

    /// Same total, minus contributions already attributed to a nested
    /// requested folder.
    pub tree_size_exclusive: u64,
}

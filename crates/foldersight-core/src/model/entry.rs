//! A single folder's size record.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::path::normalize_folder;

/// Resource type id for plain folders.
pub const TYPE_FOLDER: i32 = 0;

/// Size record for one folder, as reported by the statistics source.
///
/// `size` is the byte total of the folder's **direct child files only** —
/// never recursive. Subtree totals are always computed on demand by summing
/// over a prefix range of the store, so no precomputed aggregate can go
/// stale independently of its inputs.
///
/// Entries are immutable once constructed; an update replaces the entry,
/// it never mutates one in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
    /// Opaque identifier of the folder resource.
    pub structure_id: Uuid,

    /// Normalized folder path, leading and trailing separator included.
    pub root_path: CompactString,

    /// Byte total of the folder's direct child files.
    pub size: u64,

    /// Resource type id of the folder.
    pub type_id: i32,
}

impl FolderEntry {
    /// Create an entry. `root_path` is normalized on construction.
    pub fn new(structure_id: Uuid, root_path: &str, size: u64, type_id: i32) -> Self {
        Self {
            structure_id,
            root_path: normalize_folder(root_path),
            size,
            type_id,
        }
    }
}

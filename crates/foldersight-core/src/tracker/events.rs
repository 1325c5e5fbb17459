//! Change notifications and their mapping to affected folders.
//!
//! The event taxonomy mirrors the resource mutations the host system
//! publishes: created, modified, moved, deleted, published. The tracker
//! only needs to know which folder records to re-query, so every event
//! reduces to a small set of folder paths via [`ChangeEvent::affected_folders`].

use compact_str::CompactString;
use uuid::Uuid;

use crate::model::path::{normalize_folder, parent_folder};

/// Whether a changed resource is a file or a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    File,
    Folder,
}

/// A resource named by a change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    /// Opaque identifier of the resource.
    pub structure_id: Uuid,
    /// Root path of the resource. Folder paths may arrive without their
    /// trailing separator; mapping normalizes them.
    pub root_path: CompactString,
    /// File or folder.
    pub kind: ResourceKind,
}

impl ResourceRef {
    /// Reference a file resource.
    pub fn file(root_path: &str) -> Self {
        Self {
            structure_id: Uuid::new_v4(),
            root_path: CompactString::new(root_path),
            kind: ResourceKind::File,
        }
    }

    /// Reference a folder resource.
    pub fn folder(root_path: &str) -> Self {
        Self {
            structure_id: Uuid::new_v4(),
            root_path: CompactString::new(root_path),
            kind: ResourceKind::Folder,
        }
    }

    /// The folder whose size record this resource affects: a file changes
    /// its parent folder's direct-children total, a folder changes its own
    /// record.
    fn affected_folder(&self) -> Option<CompactString> {
        match self.kind {
            ResourceKind::File => parent_folder(&self.root_path),
            ResourceKind::Folder => Some(normalize_folder(&self.root_path)),
        }
    }
}

/// A typed change notification delivered to the tracker.
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    /// A resource was created.
    Created(ResourceRef),
    /// A resource's content or properties changed.
    Modified(ResourceRef),
    /// A resource was deleted.
    Deleted(ResourceRef),
    /// A resource was moved from `source` to `destination`.
    Moved {
        source: ResourceRef,
        destination: ResourceRef,
    },
    /// A publish operation completed; carries every resource it included.
    Published { resources: Vec<ResourceRef> },
}

impl ChangeEvent {
    /// Folder paths whose size records this event invalidates.
    ///
    /// A move touches the parent folders on both sides. A moved folder also
    /// enqueues its old and new paths themselves: parents only aggregate
    /// direct child files, so without these the vanished source entry would
    /// stay indexed until the next full resync.
    pub fn affected_folders(&self) -> Vec<CompactString> {
        let mut folders = Vec::new();
        match self {
            ChangeEvent::Created(resource)
            | ChangeEvent::Modified(resource)
            | ChangeEvent::Deleted(resource) => {
                folders.extend(resource.affected_folder());
            }
            ChangeEvent::Moved {
                source,
                destination,
            } => {
                folders.extend(parent_folder(&source.root_path));
                folders.extend(parent_folder(&destination.root_path));
                if source.kind == ResourceKind::Folder {
                    folders.push(normalize_folder(&source.root_path));
                    folders.push(normalize_folder(&destination.root_path));
                }
            }
            ChangeEvent::Published { resources } => {
                for resource in resources {
                    folders.extend(resource.affected_folder());
                }
            }
        }
        folders.sort_unstable();
        folders.dedup();
        folders
    }
}

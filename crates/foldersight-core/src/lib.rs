//! Foldersight Core — eventually-consistent folder size tracking.
//!
//! This crate contains all business logic with zero CLI dependencies.
//! It is designed to be embedded in different hosts (CLI, server, daemon).
//!
//! # Modules
//!
//! - [`model`] — Path normalization, folder entries, and the prefix-indexed store.
//! - [`source`] — The folder-statistics collaborator contract plus a filesystem-backed implementation.
//! - [`table`] — Immutable-per-snapshot size table with subtree aggregation and batch reports.
//! - [`tracker`] — Long-lived coordinator: change events in, fresh table snapshots out.
//! - [`config`] — Tracker configuration (flush interval, resync interval, project flag).
//! - [`export`] — Report export to CSV and JSON.

pub mod config;
pub mod export;
pub mod model;
pub mod source;
pub mod table;
pub mod tracker;

pub use config::TrackerConfig;
pub use model::{FolderEntry, FolderReportEntry, PathTrie};
pub use source::{FolderStatsScope, FolderStatsSource, StatsError};
pub use table::FolderSizeTable;
pub use tracker::{ChangeEvent, FolderSizeTracker, ResourceKind, ResourceRef, TrackerHandle};

//! Tracker configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for [`crate::tracker::FolderSizeTracker`].
///
/// Durations deserialize from human-readable strings (`"30s"`, `"24h"`) so
/// a host can embed this struct in any serde-backed config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// How often the pending-update queue is flushed into a fresh table.
    /// A zero interval disables the tracker permanently: no loads run and
    /// every read query returns its "unknown" sentinel.
    #[serde(with = "humantime_serde", default = "default_flush_interval")]
    pub flush_interval: Duration,

    /// How often a full reload runs as a correctness backstop.
    #[serde(with = "humantime_serde", default = "default_resync_interval")]
    pub resync_interval: Duration,

    /// Whether statistics are read from the online (published) or offline
    /// (staging) project.
    #[serde(default = "default_online")]
    pub online: bool,
}

fn default_flush_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_resync_interval() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_online() -> bool {
    true
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            flush_interval: default_flush_interval(),
            resync_interval: default_resync_interval(),
            online: default_online(),
        }
    }
}

impl TrackerConfig {
    /// A configuration that keeps the tracker permanently disabled.
    pub fn disabled() -> Self {
        Self {
            flush_interval: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Whether the tracker runs at all.
    pub fn is_enabled(&self) -> bool {
        !self.flush_interval.is_zero()
    }
}

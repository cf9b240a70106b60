use serde::{Deserialize, Serialize};

/// Polling cadence for background refresh loops.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PollConfig {
    /// Interval, in milliseconds, between cluster list refreshes.
    ///
    /// The auto-selection policy runs on every refresh.
    pub clusters_interval_ms: u64,

    /// Interval, in milliseconds, between checks for stale resource
    /// collections that need a refetch.
    pub resources_interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            clusters_interval_ms: 30_000,
            resources_interval_ms: 15_000,
        }
    }
}

use serde::{Deserialize, Serialize};

/// Location of durable local state.
///
/// The session credential bundle and the active cluster selection are kept
/// as small files under this directory so they survive restarts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the persisted state files.
    pub state_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_dir: ".console-state".to_owned(),
        }
    }
}

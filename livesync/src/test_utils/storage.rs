use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::SyncResult;
use crate::storage::StateStorage;

/// In-memory [`StateStorage`] for tests.
///
/// Clones share the same backing map, so a "restarted" store built over a
/// clone observes the previously persisted values.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStorage {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStateStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStorage for MemoryStateStorage {
    async fn load(&self, key: &str) -> SyncResult<Option<String>> {
        let inner = self.inner.lock().expect("memory storage lock poisoned");
        Ok(inner.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> SyncResult<()> {
        let mut inner = self.inner.lock().expect("memory storage lock poisoned");
        inner.insert(key.to_owned(), value.to_owned());

        Ok(())
    }

    async fn remove(&self, key: &str) -> SyncResult<()> {
        let mut inner = self.inner.lock().expect("memory storage lock poisoned");
        inner.remove(key);

        Ok(())
    }
}

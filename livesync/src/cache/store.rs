use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::cache::QueryKey;

#[derive(Debug, Default)]
struct Entry {
    value: Option<serde_json::Value>,
    stale: bool,
    generation: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<QueryKey, Entry>,
}

/// In-memory cache of fetched query results.
///
/// Pollers put fetched collections in as JSON snapshots; the invalidation
/// router marks entries stale when a push event affects them, and the
/// refresher refetches whatever is stale. Invalidating a key that was never
/// fetched records a stale placeholder so the first fetch still observes it.
#[derive(Debug, Clone, Default)]
pub struct QueryCache {
    inner: Arc<Mutex<Inner>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a fresh snapshot for the key, clearing its stale flag.
    pub fn put(&self, key: QueryKey, value: serde_json::Value) {
        let mut inner = self.inner.lock().expect("query cache lock poisoned");

        let entry = inner.entries.entry(key).or_default();
        entry.value = Some(value);
        entry.stale = false;
        entry.generation += 1;
    }

    /// Returns the cached snapshot for the key, if any.
    ///
    /// A stale snapshot is still returned; staleness means a refetch is due,
    /// not that the data is unusable.
    pub fn get(&self, key: &QueryKey) -> Option<serde_json::Value> {
        let inner = self.inner.lock().expect("query cache lock poisoned");
        inner.entries.get(key).and_then(|entry| entry.value.clone())
    }

    /// Marks the key as needing a refetch.
    pub fn invalidate(&self, key: QueryKey) {
        let mut inner = self.inner.lock().expect("query cache lock poisoned");
        inner.entries.entry(key).or_default().stale = true;
    }

    /// Returns whether the key is marked stale.
    ///
    /// Keys that were never fetched nor invalidated are not stale.
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        let inner = self.inner.lock().expect("query cache lock poisoned");
        inner.entries.get(key).is_some_and(|entry| entry.stale)
    }

    /// Returns all keys currently marked stale.
    pub fn stale_keys(&self) -> Vec<QueryKey> {
        let inner = self.inner.lock().expect("query cache lock poisoned");
        inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.stale)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Returns how many times the key has been stored.
    ///
    /// Useful in tests to assert that a refetch actually happened.
    pub fn generation(&self, key: &QueryKey) -> u64 {
        let inner = self.inner.lock().expect("query cache lock poisoned");
        inner
            .entries
            .get(key)
            .map(|entry| entry.generation)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Collection;
    use serde_json::json;

    #[test]
    fn put_then_get_round_trips() {
        let cache = QueryCache::new();
        let key = QueryKey::global(Collection::Backups);

        cache.put(key.clone(), json!([{"name": "b1"}]));

        assert_eq!(cache.get(&key), Some(json!([{"name": "b1"}])));
        assert!(!cache.is_stale(&key));
        assert_eq!(cache.generation(&key), 1);
    }

    #[test]
    fn invalidate_marks_existing_entry_stale_but_keeps_value() {
        let cache = QueryCache::new();
        let key = QueryKey::global(Collection::Backups);

        cache.put(key.clone(), json!([]));
        cache.invalidate(key.clone());

        assert!(cache.is_stale(&key));
        assert_eq!(cache.get(&key), Some(json!([])));
    }

    #[test]
    fn invalidate_records_placeholder_for_unfetched_key() {
        let cache = QueryCache::new();
        let key = QueryKey::scoped(Collection::Restores, Some("prod-east"));

        cache.invalidate(key.clone());

        assert!(cache.is_stale(&key));
        assert_eq!(cache.get(&key), None);
        assert_eq!(cache.stale_keys(), vec![key]);
    }

    #[test]
    fn put_clears_staleness() {
        let cache = QueryCache::new();
        let key = QueryKey::global(Collection::Dashboard);

        cache.put(key.clone(), json!({"totalBackups": 1}));
        cache.invalidate(key.clone());
        cache.put(key.clone(), json!({"totalBackups": 2}));

        assert!(!cache.is_stale(&key));
        assert_eq!(cache.generation(&key), 2);
        assert!(cache.stale_keys().is_empty());
    }

    #[test]
    fn scoped_keys_are_independent() {
        let cache = QueryCache::new();
        let east = QueryKey::scoped(Collection::Backups, Some("prod-east"));
        let west = QueryKey::scoped(Collection::Backups, Some("dr-west"));

        cache.invalidate(east.clone());

        assert!(cache.is_stale(&east));
        assert!(!cache.is_stale(&west));
    }
}

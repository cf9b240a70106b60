use std::future::Future;

use crate::error::SyncResult;

/// String-keyed durable storage for small pieces of client state.
///
/// Keys are flat names; values are opaque strings. Writes must be readable
/// back by a later process under the same key (round-trip fidelity), and a
/// missing key is not an error. Implementations are cheap to clone and share
/// one underlying store.
pub trait StateStorage: Clone + Send + Sync + 'static {
    /// Returns the stored value for `key`, or `None` if absent.
    fn load(&self, key: &str) -> impl Future<Output = SyncResult<Option<String>>> + Send;

    /// Stores `value` under `key`, overwriting any previous value.
    fn save(&self, key: &str, value: &str) -> impl Future<Output = SyncResult<()>> + Send;

    /// Removes the value stored under `key`, if any.
    fn remove(&self, key: &str) -> impl Future<Output = SyncResult<()>> + Send;
}

use std::path::PathBuf;
use tokio::fs;

use crate::error::SyncResult;
use crate::storage::StateStorage;

/// File-backed [`StateStorage`].
///
/// Each key is stored as a single file under the state directory. The
/// directory is created on first write. Writes are not atomic with respect
/// to a concurrent process restart; the worst case is losing the most recent
/// value, never corrupting older ones.
#[derive(Debug, Clone)]
pub struct FileStateStorage {
    dir: PathBuf,
}

impl FileStateStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl StateStorage for FileStateStorage {
    async fn load(&self, key: &str) -> SyncResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, key: &str, value: &str) -> SyncResult<()> {
        fs::create_dir_all(&self.dir).await?;
        fs::write(self.path_for(key), value).await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> SyncResult<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

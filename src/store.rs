//! Durable key/value store and the last-success record

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Store key for the epoch-ms timestamp of the last successful fetch
pub const LAST_SUCCESS_KEY: &str = "last_successful_fetch_epoch_ms";

/// Durable key/value persistence, surviving process restarts
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> crate::Result<Option<i64>>;
    fn set(&self, key: &str, value: i64) -> crate::Result<()>;
}

/// Key/value store backed by a JSON file
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_map(&self) -> crate::Result<HashMap<String, i64>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> crate::Result<Option<i64>> {
        Ok(self.read_map()?.get(key).copied())
    }

    fn set(&self, key: &str, value: i64) -> crate::Result<()> {
        // A corrupt file is replaced rather than propagated; losing the
        // record only delays the first connectivity alert.
        let mut map = self.read_map().unwrap_or_default();
        map.insert(key.to_string(), value);
        let content = serde_json::to_string_pretty(&map)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

/// The one durable record: when did a fetch last succeed.
///
/// Store failures fail closed as "no stored value" and never reach the
/// tick path as errors.
pub struct LastSuccessStore {
    inner: Arc<dyn KeyValueStore>,
}

impl LastSuccessStore {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    /// Read the last-success timestamp, initializing it to `now_ms` when
    /// absent so a fresh install never reports an instant outage.
    pub fn read_last_success(&self, now_ms: i64) -> i64 {
        match self.inner.get(LAST_SUCCESS_KEY) {
            Ok(Some(ts)) => ts,
            Ok(None) => {
                tracing::debug!("No last-success record, initializing to now");
                self.write_last_success(now_ms);
                now_ms
            }
            Err(e) => {
                tracing::warn!("Reading last-success record failed, treating as absent: {}", e);
                now_ms
            }
        }
    }

    pub fn write_last_success(&self, ts_ms: i64) {
        if let Err(e) = self.inner.set(LAST_SUCCESS_KEY, ts_ms) {
            tracing::warn!("Persisting last-success record failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_store(dir: &tempfile::TempDir) -> FileStore {
        FileStore::new(dir.path().join("state.json"))
    }

    #[test]
    fn get_missing_file_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = file_store(&dir);
        assert_eq!(store.get(LAST_SUCCESS_KEY).unwrap(), None);
    }

    #[test]
    fn set_then_get_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = file_store(&dir);
        store.set(LAST_SUCCESS_KEY, 1_700_000_000_000).unwrap();
        assert_eq!(
            store.get(LAST_SUCCESS_KEY).unwrap(),
            Some(1_700_000_000_000)
        );
    }

    #[test]
    fn set_preserves_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = file_store(&dir);
        store.set("other", 7).unwrap();
        store.set(LAST_SUCCESS_KEY, 42).unwrap();
        assert_eq!(store.get("other").unwrap(), Some(7));
        assert_eq!(store.get(LAST_SUCCESS_KEY).unwrap(), Some(42));
    }

    #[test]
    fn get_missing_key_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = file_store(&dir);
        store.set("other", 7).unwrap();
        assert_eq!(store.get(LAST_SUCCESS_KEY).unwrap(), None);
    }

    #[test]
    fn get_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("state.json"), "not json").unwrap();
        let store = file_store(&dir);
        assert!(store.get(LAST_SUCCESS_KEY).is_err());
    }

    #[test]
    fn set_replaces_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("state.json"), "not json").unwrap();
        let store = file_store(&dir);
        store.set(LAST_SUCCESS_KEY, 9).unwrap();
        assert_eq!(store.get(LAST_SUCCESS_KEY).unwrap(), Some(9));
    }

    #[test]
    fn fresh_store_initializes_to_now() {
        let dir = tempfile::tempdir().unwrap();
        let store = LastSuccessStore::new(Arc::new(file_store(&dir)));
        assert_eq!(store.read_last_success(1000), 1000);
        // The initialization is persisted: a later read keeps the first now
        assert_eq!(store.read_last_success(9999), 1000);
    }

    #[test]
    fn read_returns_stored_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = LastSuccessStore::new(Arc::new(file_store(&dir)));
        store.write_last_success(555);
        assert_eq!(store.read_last_success(1000), 555);
    }

    #[test]
    fn read_fails_closed_on_store_error() {
        let mut mock = MockKeyValueStore::new();
        mock.expect_get()
            .returning(|_| Err(crate::AlerterError::Store("disk on fire".to_string())));
        let store = LastSuccessStore::new(Arc::new(mock));
        assert_eq!(store.read_last_success(1234), 1234);
    }

    #[test]
    fn write_absorbs_store_error() {
        let mut mock = MockKeyValueStore::new();
        mock.expect_set()
            .returning(|_, _| Err(crate::AlerterError::Store("disk on fire".to_string())));
        let store = LastSuccessStore::new(Arc::new(mock));
        // Must not panic
        store.write_last_success(1234);
    }
}

//! Local key-value storage backing the content cache.
//!
//! Values are opaque strings (JSON in practice). All operations are
//! synchronous and never touch the network.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Results log key.
pub const RESULTS_KEY: &str = "perlan_results";
/// Per-player stats map key.
pub const STATS_KEY: &str = "perlan_stats";
/// Learning progress map key.
pub const PROGRESS_KEY: &str = "perlan_learning_progress";

/// A synchronous string store addressed by key.
pub trait LocalStore: Send + Sync {
    fn read(&self, key: &str) -> io::Result<Option<String>>;

    fn write(&self, key: &str, value: &str) -> io::Result<()>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// Process-local store, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LocalStore for MemoryStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
///
/// Writes go to a temporary file that is then renamed over the target, so a
/// crash mid-write never leaves a truncated value behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> io::Result<PathBuf> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid storage key '{key}'"),
            ));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl LocalStore for FileStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.path(key)?) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        let path = self.path(key)?;
        let temp = self.dir.join(format!(".{key}.tmp"));
        std::fs::write(&temp, value)?;
        std::fs::rename(&temp, &path)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match std::fs::remove_file(self.path(key)?) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &dyn LocalStore) {
        assert_eq!(store.read("perlan_x_v1").unwrap(), None);
        store.write("perlan_x_v1", "[1]").unwrap();
        assert_eq!(store.read("perlan_x_v1").unwrap().as_deref(), Some("[1]"));
        store.write("perlan_x_v1", "[2]").unwrap();
        assert_eq!(store.read("perlan_x_v1").unwrap().as_deref(), Some("[2]"));
        store.remove("perlan_x_v1").unwrap();
        store.remove("perlan_x_v1").unwrap();
        assert_eq!(store.read("perlan_x_v1").unwrap(), None);
    }

    #[test]
    fn memory_store_round_trip() {
        exercise(&MemoryStore::new());
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("data")).unwrap();
        exercise(&store);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        FileStore::open(dir.path()).unwrap().write(STATS_KEY, "{}").unwrap();
        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.read(STATS_KEY).unwrap().as_deref(), Some("{}"));
        assert!(!dir.path().join(format!(".{STATS_KEY}.tmp")).exists());
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let err = store.write("../escape", "x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}

//! Key/value persistence for the JSON records the engine keeps between runs.
//!
//! The active context and the context groups each live in one record. The
//! store is injected so tests can swap the filesystem for memory; production
//! code binds a [`FileStore`] to the state directory once at startup.
//!
//! Every mutation is a read-modify-write of a whole record with no locking.
//! Two concurrent `dev` invocations can race and the last write wins.

use crate::error::Result;
use crate::paths;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

pub trait JsonStore {
    /// Raw record contents, or `None` if the record has never been written.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the record. Implementations must not leave a partial write.
    fn write(&self, key: &str, data: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// One `<key>.json` file per record inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl JsonStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        crate::io::read_if_exists(&paths::record_path(&self.dir, key))
    }

    fn write(&self, key: &str, data: &str) -> Result<()> {
        let path = paths::record_path(&self.dir, key);
        tracing::debug!(path = %path.display(), "writing record");
        crate::io::atomic_write(&path, data.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record, e.g. with deliberately corrupt data.
    pub fn insert(&self, key: &str, data: &str) {
        self.lock().insert(key.to_string(), data.to_string());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map.
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl JsonStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn write(&self, key: &str, data: &str) -> Result<()> {
        self.lock().insert(key.to_string(), data.to_string());
        Ok(())
    }
}

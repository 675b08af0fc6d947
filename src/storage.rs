//! String key-value stores backing persistence
//!
//! Provides:
//! - **MemoryStore**: shared in-process map (session shadow store, tests)
//! - **FileStore**: JSON object on disk, replaced atomically on every mutation

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

use crate::constants::config::{APP_DIR, SESSION_FILENAME, STORAGE_FILENAME};
use crate::error::{MenuError, MenuResult};

/// Synchronous string-keyed store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> MenuResult<()>;

    /// Write several keys as one update
    fn set_many(&self, entries: &[(&str, &str)]) -> MenuResult<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> MenuResult<()>;

    fn is_empty(&self) -> bool;
}

/// In-memory store; clones share the same map
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        // A panic while holding the lock cannot leave the map half-written
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> MenuResult<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> MenuResult<()> {
        self.entries().remove(key);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Store persisted as a single JSON object file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`
    ///
    /// A missing file opens empty. An unreadable or malformed file is logged
    /// and also opens empty; it is overwritten on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Store file is malformed, starting empty");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read store file, starting empty");
                BTreeMap::new()
            }
        };
        info!(path = %path.display(), keys = entries.len(), "Opened store");

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> MenuResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| MenuError::Storage(format!("cannot serialize store: {e}")))?;
        // Readers see either the old file or the new one, never a partial write
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> MenuResult<()> {
        let mut entries = self.entries();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn set_many(&self, updates: &[(&str, &str)]) -> MenuResult<()> {
        let mut entries = self.entries();
        for (key, value) in updates {
            entries.insert(key.to_string(), value.to_string());
        }
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> MenuResult<()> {
        let mut entries = self.entries();
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Default durable store location (platform data dir)
pub fn default_storage_path() -> Result<PathBuf> {
    let data = dirs::data_dir().context("Failed to determine data directory (no HOME?)")?;
    Ok(data.join(APP_DIR).join(STORAGE_FILENAME))
}

/// Default session store location
///
/// XDG_RUNTIME_DIR is cleared at logout, which gives the shadow store its
/// session lifetime. Falls back to the cache dir.
pub fn default_session_path() -> Result<PathBuf> {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return Ok(PathBuf::from(runtime_dir).join(APP_DIR).join(SESSION_FILENAME));
    }

    let cache = dirs::cache_dir()
        .context("Failed to determine cache directory (no XDG_RUNTIME_DIR or HOME)")?;
    Ok(cache.join(APP_DIR).join(SESSION_FILENAME))
}

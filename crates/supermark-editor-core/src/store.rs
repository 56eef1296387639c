//! Content persistence.
//!
//! `ContentStore` is the contract of the external key-value store. The
//! controller never talks to it directly: it goes through `StoreAdapter`,
//! which turns every failure into a logged "nothing there" / "save skipped".
//!
//! Two stores ship with the crate:
//! - `MemoryStore`: process-local, shareable between handles, can be told to
//!   fail (tests, ephemeral sessions)
//! - `FileStore`: one JSON record per key in a directory, written atomically

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// External key-value store holding document snapshots.
///
/// Implementations must make `save` atomic: a reader sees either the previous
/// value or the new one, never a partial write.
pub trait ContentStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn save(&self, key: &str, text: &str) -> Result<(), StoreError>;

    fn clear(&self, key: &str) -> Result<(), StoreError>;
}

impl<T: ContentStore + ?Sized> ContentStore for &T {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, text: &str) -> Result<(), StoreError> {
        (**self).save(key, text)
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        (**self).clear(key)
    }
}

impl<T: ContentStore + ?Sized> ContentStore for Box<T> {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, text: &str) -> Result<(), StoreError> {
        (**self).save(key, text)
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        (**self).clear(key)
    }
}

/// Total wrapper around a [`ContentStore`] bound to the document key.
pub struct StoreAdapter<S> {
    store: S,
    key: String,
}

impl<S: ContentStore> StoreAdapter<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Previously saved text, or `None` if absent or unreadable.
    pub fn load(&self) -> Option<String> {
        match self.store.load(&self.key) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(key = %self.key, %err, "failed to load saved content");
                None
            }
        }
    }

    /// Persist `text`. Returns false if the save was skipped.
    pub fn save(&self, text: &str) -> bool {
        match self.store.save(&self.key, text) {
            Ok(()) => {
                tracing::debug!(key = %self.key, bytes = text.len(), "content saved");
                true
            }
            Err(err) => {
                tracing::warn!(key = %self.key, %err, "failed to save content");
                false
            }
        }
    }

    /// Remove saved content. Returns false on failure.
    pub fn clear(&self) -> bool {
        match self.store.clear(&self.key) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(key = %self.key, %err, "failed to clear saved content");
                false
            }
        }
    }
}

#[derive(Default)]
struct MemoryInner {
    entries: Mutex<HashMap<String, String>>,
    saves: AtomicUsize,
    failing: AtomicBool,
}

/// In-process store. Clones share the same entries.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `text` under `key`.
    pub fn with_entry(key: &str, text: &str) -> Self {
        let store = Self::new();
        store.entries().insert(key.to_string(), text.to_string());
        store
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.inner.saves.load(Ordering::SeqCst)
    }

    /// Make every subsequent operation fail until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    /// Current value under `key`, bypassing failure injection.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.inner.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store set to fail".into()))
        } else {
            Ok(())
        }
    }
}

impl ContentStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        Ok(self.get(key))
    }

    fn save(&self, key: &str, text: &str) -> Result<(), StoreError> {
        self.check()?;
        self.entries().insert(key.to_string(), text.to_string());
        self.inner.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        self.check()?;
        self.entries().remove(key);
        Ok(())
    }
}

/// On-disk record written by [`FileStore`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PersistedSnapshot {
    /// Document text.
    pub content: String,
    /// When the record was written.
    pub saved_at: DateTime<Utc>,
}

/// Directory-backed store, one `<key>.json` file per key.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for `key`. Characters outside `[A-Za-z0-9_-]` map to `_`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }

    /// Full record for `key`, including its timestamp.
    pub fn load_snapshot(&self, key: &str) -> Result<Option<PersistedSnapshot>, StoreError> {
        let path = self.path_for(key);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }
}

impl ContentStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load_snapshot(key)?.map(|snapshot| snapshot.content))
    }

    fn save(&self, key: &str, text: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let snapshot = PersistedSnapshot {
            content: text.to_string(),
            saved_at: Utc::now(),
        };
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&snapshot)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

//! Flat key/value storage backend persisted as a single JSON file.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

use super::traits::{StoreBackend, StoreError, StoreResult};

const NAME: &str = "flat";

/// Default capacity, matching what browsers typically grant simple storage.
pub const DEFAULT_FLAT_CAPACITY: usize = 5 * 1024 * 1024;

/// Simple synchronous key/value store with a fixed capacity.
///
/// Values must be UTF-8 text. When created with a path, every mutation is
/// written through to that file.
pub struct FlatStore {
  path: Option<PathBuf>,
  capacity: usize,
  entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl FlatStore {
  /// A store that lives only as long as the process.
  pub fn in_memory() -> Self {
    Self {
      path: None,
      capacity: DEFAULT_FLAT_CAPACITY,
      entries: Arc::new(Mutex::new(BTreeMap::new())),
    }
  }

  /// Open (or start) the store persisted at `path`.
  ///
  /// An unreadable or corrupt file is discarded and the store starts empty.
  pub fn open(path: impl Into<PathBuf>) -> Self {
    let path = path.into();
    let entries = Self::load(&path);

    Self {
      path: Some(path),
      capacity: DEFAULT_FLAT_CAPACITY,
      entries: Arc::new(Mutex::new(entries)),
    }
  }

  /// Set the capacity in bytes (keys plus values).
  pub fn with_capacity(mut self, capacity: usize) -> Self {
    self.capacity = capacity;
    self
  }

  /// Get the default file path
  pub fn default_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|p| p.join("comicdex").join("flat-cache.json"))
  }

  fn load(path: &Path) -> BTreeMap<String, String> {
    let contents = match std::fs::read(path) {
      Ok(contents) => contents,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
      Err(e) => {
        warn!(path = %path.display(), error = %e, "failed to read flat cache store, starting empty");
        return BTreeMap::new();
      }
    };

    serde_json::from_slice(&contents).unwrap_or_else(|e| {
      warn!(path = %path.display(), error = %e, "discarding corrupt flat cache store");
      BTreeMap::new()
    })
  }

  fn lock(&self) -> StoreResult<MutexGuard<'_, BTreeMap<String, String>>> {
    lock_entries(&self.entries)
  }

  /// Run a mutation on the blocking pool, where it may rewrite the file.
  ///
  /// The map stays locked until the file write finishes, so concurrent
  /// mutations reach disk in the order they were applied.
  async fn mutate<R, F>(&self, op: F) -> StoreResult<R>
  where
    R: Send + 'static,
    F: FnOnce(&mut BTreeMap<String, String>, Option<&Path>) -> StoreResult<R> + Send + 'static,
  {
    let shared = Arc::clone(&self.entries);
    let path = self.path.clone();

    tokio::task::spawn_blocking(move || {
      let mut entries = lock_entries(&shared)?;
      op(&mut *entries, path.as_deref())
    })
    .await
    .map_err(|e| StoreError::backend(NAME, e))?
  }

  /// Write the whole map to disk via a temporary file and rename.
  fn persist(path: Option<&Path>, entries: &BTreeMap<String, String>) -> StoreResult<()> {
    let Some(path) = path else {
      return Ok(());
    };

    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| StoreError::backend(NAME, e))?;
    }

    let json = serde_json::to_vec(entries).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| StoreError::backend(NAME, e))?;
    std::fs::rename(&tmp, path).map_err(|e| StoreError::backend(NAME, e))
  }

  fn used_bytes(entries: &BTreeMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
  }
}

fn lock_entries(
  entries: &Mutex<BTreeMap<String, String>>,
) -> StoreResult<MutexGuard<'_, BTreeMap<String, String>>> {
  entries
    .lock()
    .map_err(|e| StoreError::backend(NAME, format!("lock poisoned: {}", e)))
}

#[async_trait]
impl StoreBackend for FlatStore {
  fn name(&self) -> &'static str {
    NAME
  }

  async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
    Ok(self.lock()?.get(key).map(|v| v.clone().into_bytes()))
  }

  async fn put(&self, key: &str, value: &[u8]) -> StoreResult<()> {
    let value = String::from_utf8(value.to_vec())
      .map_err(|e| StoreError::Serialization(format!("flat store values must be UTF-8: {}", e)))?;
    let key = key.to_string();
    let capacity = self.capacity;

    self
      .mutate(move |entries, path| {
        let replaced = entries.get(&key).map(|old| key.len() + old.len()).unwrap_or(0);
        let needed = Self::used_bytes(entries) - replaced + key.len() + value.len();
        if needed > capacity {
          return Err(StoreError::QuotaExceeded {
            backend: NAME,
            needed,
            capacity,
          });
        }

        let previous = entries.insert(key.clone(), value);
        if let Err(e) = Self::persist(path, entries) {
          // Keep memory and disk in agreement
          match previous {
            Some(old) => entries.insert(key, old),
            None => entries.remove(&key),
          };
          return Err(e);
        }

        Ok(())
      })
      .await
  }

  async fn delete(&self, key: &str) -> StoreResult<()> {
    let key = key.to_string();
    self
      .mutate(move |entries, path| {
        if entries.remove(&key).is_some() {
          Self::persist(path, entries)?;
        }
        Ok(())
      })
      .await
  }

  async fn keys(&self, prefix: &str) -> StoreResult<Vec<String>> {
    Ok(
      self
        .lock()?
        .keys()
        .filter(|k| k.starts_with(prefix))
        .cloned()
        .collect(),
    )
  }

  async fn clear(&self, prefix: &str) -> StoreResult<usize> {
    let prefix = prefix.to_string();
    self
      .mutate(move |entries, path| {
        let before = entries.len();
        entries.retain(|k, _| !k.starts_with(&prefix));
        let removed = before - entries.len();

        if removed > 0 {
          Self::persist(path, entries)?;
        }
        Ok(removed)
      })
      .await
  }
}

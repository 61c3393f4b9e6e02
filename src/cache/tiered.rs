//! Ordered fallback across storage backends.

use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

use super::traits::{StoreBackend, StoreError, StoreResult};

/// An entry found while iterating, tagged with the backend holding it.
#[derive(Debug, Clone)]
pub struct StoredEntry {
  pub backend: &'static str,
  pub key: String,
  pub bytes: Vec<u8>,
}

/// Key/value persistence over an ordered list of backends.
///
/// Reads and writes try each backend in order and move on when one fails, so
/// callers never see "store unavailable". Deletes apply to every backend,
/// since an earlier fallback may have left a copy anywhere.
#[derive(Clone)]
pub struct TieredStore {
  backends: Vec<Arc<dyn StoreBackend>>,
}

impl TieredStore {
  pub fn new(backends: Vec<Arc<dyn StoreBackend>>) -> Self {
    Self { backends }
  }

  /// A store with no backends: every read misses and writes persist nothing.
  pub fn disabled() -> Self {
    Self::new(Vec::new())
  }

  pub fn backend_names(&self) -> Vec<&'static str> {
    self.backends.iter().map(|b| b.name()).collect()
  }

  /// Read `key` from the first backend that has it.
  ///
  /// A miss in one backend does not stop the lookup in the next.
  pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
    for backend in &self.backends {
      match backend.get(key).await {
        Ok(Some(bytes)) => return Some(bytes),
        Ok(None) => {}
        Err(e) => debug!(backend = backend.name(), key, error = %e, "store read failed, trying next"),
      }
    }
    None
  }

  /// Write `key` to the first backend that accepts it.
  ///
  /// Returns the name of that backend, or `None` if no backend was available
  /// at all. Any other failure of the last backend tried is returned so the
  /// caller knows nothing was persisted.
  ///
  /// Copies of `key` in every other backend are removed, so a backend that
  /// refused this write can't keep serving an older value.
  pub async fn put(&self, key: &str, bytes: &[u8]) -> StoreResult<Option<&'static str>> {
    let mut last_failure: Option<StoreError> = None;

    for (index, backend) in self.backends.iter().enumerate() {
      match backend.put(key, bytes).await {
        Ok(()) => {
          self.delete_except(index, key).await;
          return Ok(Some(backend.name()));
        }
        Err(e) if e.is_unavailable() => {
          debug!(backend = backend.name(), key, error = %e, "store unavailable, trying next")
        }
        Err(e) => {
          debug!(backend = backend.name(), key, error = %e, "store write failed, trying next");
          last_failure = Some(e);
        }
      }
    }

    match last_failure {
      Some(e) => Err(e),
      None => Ok(None),
    }
  }

  /// Remove `key` from every backend.
  pub async fn delete(&self, key: &str) {
    for backend in &self.backends {
      if let Err(e) = backend.delete(key).await {
        debug!(backend = backend.name(), key, error = %e, "store delete failed");
      }
    }
  }

  async fn delete_except(&self, keep: usize, key: &str) {
    for (index, backend) in self.backends.iter().enumerate() {
      if index == keep {
        continue;
      }
      match backend.delete(key).await {
        Ok(()) => {}
        Err(e) if e.is_unavailable() => {}
        Err(e) => warn!(backend = backend.name(), key, error = %e, "failed to drop superseded copy"),
      }
    }
  }

  /// Remove `key` from the named backend only.
  pub async fn delete_from(&self, backend_name: &str, key: &str) {
    for backend in self.backends.iter().filter(|b| b.name() == backend_name) {
      if let Err(e) = backend.delete(key).await {
        debug!(backend = backend.name(), key, error = %e, "store delete failed");
      }
    }
  }

  /// Remove every key under `prefix` from every backend.
  pub async fn clear(&self, prefix: &str) -> usize {
    let mut removed = 0;
    for backend in &self.backends {
      match backend.clear(prefix).await {
        Ok(n) => removed += n,
        Err(e) if e.is_unavailable() => {}
        Err(e) => warn!(backend = backend.name(), prefix, error = %e, "store clear failed"),
      }
    }
    removed
  }

  /// Lazily walk every entry under `prefix` in every backend.
  ///
  /// Keys are listed one backend at a time; values are read only as the
  /// stream is polled. A key present in two backends is yielded twice.
  pub fn iterate<'a>(&'a self, prefix: &'a str) -> BoxStream<'a, StoredEntry> {
    stream::iter(self.backends.iter())
      .then(move |backend| async move {
        let keys = match backend.keys(prefix).await {
          Ok(keys) => keys,
          Err(e) => {
            debug!(backend = backend.name(), error = %e, "store key listing failed");
            Vec::new()
          }
        };
        stream::iter(keys.into_iter().map(move |key| (backend, key)))
      })
      .flatten()
      .filter_map(|(backend, key)| async move {
        match backend.get(&key).await {
          Ok(Some(bytes)) => Some(StoredEntry {
            backend: backend.name(),
            key,
            bytes,
          }),
          Ok(None) => None,
          Err(e) => {
            debug!(backend = backend.name(), key = %key, error = %e, "store read failed during iteration");
            None
          }
        }
      })
      .boxed()
  }
}

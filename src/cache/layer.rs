//! Expiring cache layer over the tiered store.

use chrono::{Duration, Utc};
use futures::StreamExt;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::tiered::TieredStore;
use super::traits::CacheEntry;

/// Default freshness window for cached responses, in milliseconds.
pub const DEFAULT_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Default prefix shared by every key this crate writes.
pub const DEFAULT_NAMESPACE: &str = "marvel_";

/// Just the write time of a stored entry, without decoding its payload.
#[derive(Deserialize)]
struct EntryStamp {
  timestamp: i64,
}

/// Cache that expires entries a fixed time after they were written.
///
/// Stale entries are dropped lazily when read and eagerly by [`sweep`](Self::sweep).
/// An entry whose timestamp lies in the future counts as fresh.
pub struct ExpiringCache {
  store: Arc<TieredStore>,
  /// How long an entry stays fresh
  ttl: Duration,
  namespace: String,
}

impl ExpiringCache {
  /// Create a new cache over the given store with the default TTL and namespace.
  pub fn new(store: TieredStore) -> Self {
    Self {
      store: Arc::new(store),
      ttl: Duration::milliseconds(DEFAULT_TTL_MS),
      namespace: DEFAULT_NAMESPACE.to_string(),
    }
  }

  /// Set the freshness window.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  /// Set the key prefix used by [`invalidate`](Self::invalidate) and [`sweep`](Self::sweep).
  pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
    self.namespace = namespace.into();
    self
  }

  pub fn namespace(&self) -> &str {
    &self.namespace
  }

  pub fn store(&self) -> &TieredStore {
    &self.store
  }

  /// Check if an entry written at `timestamp` has outlived the TTL.
  fn is_expired(&self, timestamp: i64, now: i64) -> bool {
    now - timestamp >= self.ttl.num_milliseconds()
  }

  /// Read a fresh value for `key`.
  ///
  /// Expired and undecodable entries are removed from every backend.
  pub async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    let bytes = self.store.get(key).await?;

    let entry: CacheEntry<T> = match serde_json::from_slice(&bytes) {
      Ok(entry) => entry,
      Err(e) => {
        debug!(key, error = %e, "dropping undecodable cache entry");
        self.store.delete(key).await;
        return None;
      }
    };

    if self.is_expired(entry.timestamp, Utc::now().timestamp_millis()) {
      debug!(key, "cache entry expired");
      self.store.delete(key).await;
      return None;
    }

    Some(entry.data)
  }

  /// Store `value` under `key`, stamped with the current time.
  ///
  /// Failures are logged and swallowed; the caller just won't get a hit later.
  pub async fn write<T: Serialize>(&self, key: &str, value: &T) {
    let entry = CacheEntry {
      data: value,
      timestamp: Utc::now().timestamp_millis(),
    };

    let bytes = match serde_json::to_vec(&entry) {
      Ok(bytes) => bytes,
      Err(e) => {
        warn!(key, error = %e, "failed to serialize cache entry");
        return;
      }
    };

    match self.store.put(key, &bytes).await {
      Ok(Some(backend)) => debug!(key, backend, "cached response"),
      Ok(None) => debug!(key, "no cache store available, not caching"),
      Err(e) => warn!(key, error = %e, "failed to cache response, continuing without it"),
    }
  }

  /// Drop `key`, or every namespaced key when `key` is `None`, from every backend.
  pub async fn invalidate(&self, key: Option<&str>) {
    match key {
      Some(key) => self.store.delete(key).await,
      None => {
        let removed = self.store.clear(&self.namespace).await;
        debug!(namespace = %self.namespace, removed, "cleared cache namespace");
      }
    }
  }

  /// Remove every expired or undecodable namespaced entry.
  ///
  /// Returns how many backend entries were removed.
  pub async fn sweep(&self) -> usize {
    let now = Utc::now().timestamp_millis();
    let mut removed = 0;

    let mut entries = self.store.iterate(&self.namespace);
    while let Some(entry) = entries.next().await {
      let stale = match serde_json::from_slice::<EntryStamp>(&entry.bytes) {
        Ok(stamp) => self.is_expired(stamp.timestamp, now),
        Err(_) => true,
      };

      if stale {
        self.store.delete_from(entry.backend, &entry.key).await;
        removed += 1;
      }
    }

    debug!(removed, "swept expired cache entries");
    removed
  }
}

impl Clone for ExpiringCache {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      ttl: self.ttl,
      namespace: self.namespace.clone(),
    }
  }
}

//! Core traits and types for the caching system.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A value as persisted by the expiring cache.
///
/// `timestamp` is the write time in unix milliseconds. Entries are never
/// patched in place; a rewrite replaces both fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
  pub data: T,
  pub timestamp: i64,
}

/// Why a storage backend could not serve a request.
#[derive(Debug, Error)]
pub enum StoreError {
  /// The backend is not present or could not be opened.
  #[error("{backend} store unavailable: {reason}")]
  Unavailable {
    backend: &'static str,
    reason: String,
  },

  /// The write would exceed the backend's capacity.
  #[error("{backend} store quota exceeded ({needed} bytes needed, {capacity} allowed)")]
  QuotaExceeded {
    backend: &'static str,
    needed: usize,
    capacity: usize,
  },

  /// Transaction, IO or driver failure.
  #[error("{backend} store failure: {reason}")]
  Backend {
    backend: &'static str,
    reason: String,
  },

  #[error("serialization error: {0}")]
  Serialization(String),
}

impl StoreError {
  pub fn unavailable(backend: &'static str, reason: impl ToString) -> Self {
    Self::Unavailable {
      backend,
      reason: reason.to_string(),
    }
  }

  pub fn backend(backend: &'static str, reason: impl ToString) -> Self {
    Self::Backend {
      backend,
      reason: reason.to_string(),
    }
  }

  pub fn is_unavailable(&self) -> bool {
    matches!(self, Self::Unavailable { .. })
  }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// One key/value persistence strategy.
///
/// Backends store opaque bytes; serialization is the caller's concern.
#[async_trait]
pub trait StoreBackend: Send + Sync {
  /// Short name used in logs and by [`TieredStore::delete_from`](super::TieredStore::delete_from).
  fn name(&self) -> &'static str;

  async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

  async fn put(&self, key: &str, value: &[u8]) -> StoreResult<()>;

  async fn delete(&self, key: &str) -> StoreResult<()>;

  /// All keys starting with `prefix`.
  async fn keys(&self, prefix: &str) -> StoreResult<Vec<String>>;

  /// Remove every key starting with `prefix`, returning how many were removed.
  async fn clear(&self, prefix: &str) -> StoreResult<usize>;
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
    }
  }

  /// Create a new cache result from cached data.
  pub fn from_cache(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
    }
  }
}

/// Indicates where returned data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fetched from the network on a cache miss
  Network,
  /// Served from a fresh cache entry
  Cache,
}

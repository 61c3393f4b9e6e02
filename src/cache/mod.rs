//! Persistent response caching with backend fallback.
//!
//! This module provides an API-agnostic caching mechanism that:
//! - Persists raw bytes through an ordered list of backends (SQLite first,
//!   a flat JSON file second), falling back when one is unavailable
//! - Expires entries a fixed time after they were written
//! - Derives deterministic keys for API requests and serves repeats from cache

mod flat;
mod key;
mod layer;
mod request;
mod storage;
mod tiered;
mod traits;

pub use flat::{FlatStore, DEFAULT_FLAT_CAPACITY};
pub use key::{cache_key, QueryParams};
pub use layer::{ExpiringCache, DEFAULT_NAMESPACE, DEFAULT_TTL_MS};
pub use request::RequestCache;
pub use storage::SqliteStore;
pub use tiered::{StoredEntry, TieredStore};
pub use traits::{
  CacheEntry, CacheResult, CacheSource, StoreBackend, StoreError, StoreResult,
};

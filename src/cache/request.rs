//! Request-level caching: one cache entry per API call.

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use std::future::Future;
use tracing::debug;

use super::key::{cache_key, QueryParams};
use super::layer::ExpiringCache;
use super::traits::CacheResult;
use crate::error::ApiError;

/// Maps API calls to cache keys and skips the network on a hit.
#[derive(Clone)]
pub struct RequestCache {
  cache: ExpiringCache,
}

impl RequestCache {
  pub fn new(cache: ExpiringCache) -> Self {
    Self { cache }
  }

  pub fn cache(&self) -> &ExpiringCache {
    &self.cache
  }

  /// Key under which the response to `endpoint` with `params` is stored.
  pub fn key_for(&self, endpoint: &str, params: &QueryParams) -> String {
    cache_key(self.cache.namespace(), endpoint, params)
  }

  /// Fetch with a cache-first strategy.
  ///
  /// 1. Check cache - if fresh, return without calling `fetcher`
  /// 2. Otherwise call `fetcher` for the raw response payload
  /// 3. Decode it as `T`; only a payload that decodes is cached
  pub async fn fetch_with_cache<T, F, Fut>(
    &self,
    endpoint: &str,
    params: &QueryParams,
    fetcher: F,
  ) -> Result<CacheResult<T>, ApiError>
  where
    T: DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, ApiError>>,
  {
    let key = self.key_for(endpoint, params);

    if let Some(cached) = self.cache.read::<T>(&key).await {
      debug!(endpoint, "cache hit");
      return Ok(CacheResult::from_cache(cached));
    }

    debug!(endpoint, "cache miss, fetching from API");
    let payload = fetcher().await?;

    let data = T::deserialize(&payload).map_err(|e| ApiError::Decode {
      endpoint: endpoint.to_string(),
      message: e.to_string(),
    })?;

    self.cache.write(&key, &payload).await;

    Ok(CacheResult::from_network(data))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheSource, FlatStore, StoreBackend, TieredStore};
  use serde_json::json;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;

  #[derive(Debug, Deserialize, PartialEq)]
  struct Payload {
    code: u16,
    name: String,
  }

  fn create_request_cache() -> (RequestCache, Arc<FlatStore>) {
    let flat = Arc::new(FlatStore::in_memory());
    let cache = ExpiringCache::new(TieredStore::new(vec![flat.clone()]));
    (RequestCache::new(cache), flat)
  }

  #[tokio::test]
  async fn test_second_call_is_served_from_cache() {
    let (requests, _) = create_request_cache();
    let calls = AtomicUsize::new(0);
    let params = QueryParams::new().limit(1);

    for _ in 0..2 {
      let result: CacheResult<Payload> = requests
        .fetch_with_cache("/characters/1", &params, || async {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok(json!({ "code": 200, "name": "Thor" }))
        })
        .await
        .unwrap();
      assert_eq!(result.data.code, 200);
      assert_eq!(result.data.name, "Thor");
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_reports_source() {
    let (requests, _) = create_request_cache();
    let fetch = || async { Ok(json!({ "code": 200, "name": "Loki" })) };

    let first: CacheResult<Payload> = requests
      .fetch_with_cache("/characters/2", &QueryParams::new(), fetch)
      .await
      .unwrap();
    let second: CacheResult<Payload> = requests
      .fetch_with_cache("/characters/2", &QueryParams::new(), fetch)
      .await
      .unwrap();

    assert_eq!(first.source, CacheSource::Network);
    assert_eq!(second.source, CacheSource::Cache);
  }

  #[tokio::test]
  async fn test_failed_fetch_is_not_cached() {
    let (requests, flat) = create_request_cache();

    let result: Result<CacheResult<Payload>, ApiError> = requests
      .fetch_with_cache("/comics/9", &QueryParams::new(), || async {
        Err(ApiError::Status {
          endpoint: "/comics/9".to_string(),
          status: 500,
        })
      })
      .await;

    assert!(matches!(result, Err(ApiError::Status { status: 500, .. })));
    assert!(flat.keys("").await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_undecodable_payload_is_not_cached() {
    let (requests, flat) = create_request_cache();

    let result: Result<CacheResult<Payload>, ApiError> = requests
      .fetch_with_cache("/comics/9", &QueryParams::new(), || async {
        Ok(json!({ "unexpected": true }))
      })
      .await;

    assert!(matches!(result, Err(ApiError::Decode { .. })));
    assert!(flat.keys("").await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_raw_payload_is_stored_under_derived_key() {
    let (requests, flat) = create_request_cache();
    let params = QueryParams::new().set("b", 2).set("a", 1);

    let _: CacheResult<Payload> = requests
      .fetch_with_cache("/events", &params, || async {
        Ok(json!({ "code": 200, "name": "Secret Wars", "extra": [1, 2] }))
      })
      .await
      .unwrap();

    let stored = flat.get("marvel__events_a=1&b=2").await.unwrap().unwrap();
    let entry: serde_json::Value = serde_json::from_slice(&stored).unwrap();
    assert_eq!(entry["data"]["extra"], json!([1, 2]));
    assert!(entry["timestamp"].is_i64());
  }
}

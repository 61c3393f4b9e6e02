//! Shared fakes for unit tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use url::Url;

use crate::cache::{ExpiringCache, FlatStore, StoreBackend, StoreError, StoreResult, TieredStore};
use crate::marvel::{
  CachedMarvelClient, HttpResponse, HttpTransport, MarvelClient, TransportError,
};

/// A backend whose every operation fails.
pub struct FailingStore {
  unavailable: bool,
}

impl FailingStore {
  /// Fails like a backend hitting IO or transaction errors.
  pub fn broken() -> Self {
    Self { unavailable: false }
  }

  /// Fails like a backend that is not present at all.
  pub fn unavailable() -> Self {
    Self { unavailable: true }
  }

  fn error(&self) -> StoreError {
    if self.unavailable {
      StoreError::unavailable("failing", "not present")
    } else {
      StoreError::backend("failing", "disk I/O error")
    }
  }
}

#[async_trait]
impl StoreBackend for FailingStore {
  fn name(&self) -> &'static str {
    "failing"
  }

  async fn get(&self, _key: &str) -> StoreResult<Option<Vec<u8>>> {
    Err(self.error())
  }

  async fn put(&self, _key: &str, _value: &[u8]) -> StoreResult<()> {
    Err(self.error())
  }

  async fn delete(&self, _key: &str) -> StoreResult<()> {
    Err(self.error())
  }

  async fn keys(&self, _prefix: &str) -> StoreResult<Vec<String>> {
    Err(self.error())
  }

  async fn clear(&self, _prefix: &str) -> StoreResult<usize> {
    Err(self.error())
  }
}

/// Canned HTTP responses keyed by endpoint path, with a request log.
///
/// Routes are matched against the URL path with any `/v1/public` prefix
/// removed; unregistered routes fail at the transport level.
#[derive(Default)]
pub struct MockTransport {
  routes: Mutex<HashMap<String, (u16, Vec<u8>)>>,
  requests: Mutex<Vec<String>>,
}

impl MockTransport {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn respond(&self, route: &str, status: u16, body: Value) {
    self.respond_raw(route, status, serde_json::to_vec(&body).unwrap());
  }

  pub fn respond_raw(&self, route: &str, status: u16, body: Vec<u8>) {
    self
      .routes
      .lock()
      .unwrap()
      .insert(route.to_string(), (status, body));
  }

  /// Total number of requests made.
  pub fn calls(&self) -> usize {
    self.requests.lock().unwrap().len()
  }

  /// Number of requests made to one route.
  pub fn calls_to(&self, route: &str) -> usize {
    self
      .requests
      .lock()
      .unwrap()
      .iter()
      .filter(|r| r.as_str() == route)
      .count()
  }
}

#[async_trait]
impl HttpTransport for MockTransport {
  async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
    let path = url.path();
    let route = path.strip_prefix("/v1/public").unwrap_or(path).to_string();
    self.requests.lock().unwrap().push(route.clone());

    match self.routes.lock().unwrap().get(&route) {
      Some((status, body)) => Ok(HttpResponse {
        status: *status,
        body: body.clone(),
      }),
      None => Err(TransportError(format!("connection refused: {}", route))),
    }
  }
}

/// A successful response envelope around `results`.
pub fn wrapper(results: Vec<Value>) -> Value {
  let count = results.len();
  json!({
    "code": 200,
    "status": "Ok",
    "data": {
      "offset": 0,
      "limit": 20,
      "total": count,
      "count": count,
      "results": results
    }
  })
}

/// A resource reference pointing at `/{path}/{id}`.
pub fn reference(path: &str, id: u64, name: &str) -> Value {
  json!({
    "resourceURI": format!("http://gateway.marvel.com/v1/public/{}/{}", path, id),
    "name": name
  })
}

/// Cache over a single in-memory flat store.
pub fn memory_cache() -> (ExpiringCache, Arc<FlatStore>) {
  let flat = Arc::new(FlatStore::in_memory());
  let cache = ExpiringCache::new(TieredStore::new(vec![flat.clone()]));
  (cache, flat)
}

/// Cached client talking to `transport`, caching in memory.
pub fn mock_client(transport: &Arc<MockTransport>) -> (CachedMarvelClient, Arc<FlatStore>) {
  let (cache, flat) = memory_cache();
  let inner = MarvelClient::with_transport(
    transport.clone(),
    "https://gateway.marvel.com/v1/public",
    None,
  );
  (CachedMarvelClient::from_parts(inner, cache), flat)
}

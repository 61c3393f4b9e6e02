//! Cached Marvel client that wraps MarvelClient with transparent caching.

use color_eyre::Result;
use serde::de::DeserializeOwned;

use crate::cache::{CacheResult, ExpiringCache, QueryParams, RequestCache};
use crate::config::Config;
use crate::error::ApiError;

use super::api_types::{DataWrapper, ResourceReference};
use super::client::MarvelClient;
use super::entity::Entity;
use super::resolver::resolve_all;
use super::types::EntityKind;

/// Marvel client with transparent caching support.
///
/// Every call goes through the request cache first; only misses reach the
/// network, and only successful responses are cached.
#[derive(Clone)]
pub struct CachedMarvelClient {
  inner: MarvelClient,
  requests: RequestCache,
}

impl CachedMarvelClient {
  /// Create a new cached client from configuration.
  pub fn new(config: &Config) -> Result<Self> {
    let inner = MarvelClient::new(config)?;
    let cache = config.cache.build();

    Ok(Self::from_parts(inner, cache))
  }

  pub fn from_parts(inner: MarvelClient, cache: ExpiringCache) -> Self {
    Self {
      inner,
      requests: RequestCache::new(cache),
    }
  }

  pub fn cache(&self) -> &ExpiringCache {
    self.requests.cache()
  }

  /// GET `endpoint` through the cache and decode the response as `T`.
  pub async fn fetch<T: DeserializeOwned>(
    &self,
    endpoint: &str,
    params: &QueryParams,
  ) -> std::result::Result<CacheResult<T>, ApiError> {
    self
      .requests
      .fetch_with_cache(endpoint, params, || self.inner.get_json(endpoint, params))
      .await
  }

  /// Get a single entity by id.
  pub async fn get_by_id<T: Entity>(&self, id: u64) -> std::result::Result<DataWrapper<T>, ApiError> {
    let endpoint = format!("/{}/{}", T::KIND.path(), id);
    let result = self.fetch(&endpoint, &QueryParams::new()).await?;
    Ok(result.data)
  }

  /// List a whole collection, filtered and paged by `params`.
  pub async fn list<T: Entity>(&self, params: &QueryParams) -> std::result::Result<DataWrapper<T>, ApiError> {
    let endpoint = format!("/{}", T::KIND.path());
    let result = self.fetch(&endpoint, params).await?;
    Ok(result.data)
  }

  /// List entities whose name or title starts with `prefix`.
  pub async fn search<T: Entity>(
    &self,
    prefix: &str,
    params: &QueryParams,
  ) -> std::result::Result<DataWrapper<T>, ApiError> {
    let field = T::KIND.search_param().ok_or_else(|| {
      ApiError::Unsupported(format!("{} cannot be searched by name", T::KIND.path()))
    })?;

    self.list(&params.clone().set(field, prefix)).await
  }

  /// List the `T`s attached to another entity, e.g. a character's comics.
  pub async fn list_related<T: Entity>(
    &self,
    parent: EntityKind,
    parent_id: u64,
    params: &QueryParams,
  ) -> std::result::Result<DataWrapper<T>, ApiError> {
    if parent == T::KIND {
      return Err(ApiError::Unsupported(format!(
        "{} are not related to other {}",
        parent.path(),
        T::KIND.path()
      )));
    }

    let endpoint = format!("/{}/{}/{}", parent.path(), parent_id, T::KIND.path());
    let result = self.fetch(&endpoint, params).await?;
    Ok(result.data)
  }

  /// Fetch the full entity behind each reference, dropping any that fail.
  pub async fn resolve<T: Entity>(&self, references: &[ResourceReference]) -> Vec<T> {
    resolve_all(references, |id| self.get_by_id::<T>(id)).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::StoreBackend;
  use crate::marvel::{Character, Comic, Story};
  use crate::test_support::{mock_client, reference, wrapper, MockTransport};
  use serde_json::json;
  use std::sync::Arc;

  #[tokio::test]
  async fn test_get_by_id_caches_response() {
    let transport = Arc::new(MockTransport::new());
    transport.respond(
      "/characters/1009610",
      200,
      wrapper(vec![json!({ "id": 1009610, "name": "Spider-Man" })]),
    );
    let (client, flat) = mock_client(&transport);

    for _ in 0..3 {
      let character = client
        .get_by_id::<Character>(1009610)
        .await
        .unwrap()
        .into_first()
        .unwrap();
      assert_eq!(character.name, "Spider-Man");
    }

    assert_eq!(transport.calls(), 1);
    assert!(flat
      .get("marvel__characters_1009610")
      .await
      .unwrap()
      .is_some());
  }

  #[tokio::test]
  async fn test_search_uses_kind_specific_parameter() {
    let transport = Arc::new(MockTransport::new());
    transport.respond("/comics", 200, wrapper(vec![json!({ "id": 1, "title": "Amazing" })]));
    let (client, flat) = mock_client(&transport);

    let comics = client
      .search::<Comic>("Amaz", &QueryParams::new().limit(5))
      .await
      .unwrap();

    assert_eq!(comics.data.results[0].title, "Amazing");
    assert!(flat
      .get("marvel__comics_limit=5&titleStartsWith=Amaz")
      .await
      .unwrap()
      .is_some());
  }

  #[tokio::test]
  async fn test_stories_are_not_searchable() {
    let transport = Arc::new(MockTransport::new());
    let (client, _) = mock_client(&transport);

    let err = client
      .search::<Story>("Cover", &QueryParams::new())
      .await
      .unwrap_err();

    assert!(matches!(err, ApiError::Unsupported(_)));
    assert_eq!(transport.calls(), 0);
  }

  #[tokio::test]
  async fn test_list_related_builds_nested_endpoint() {
    let transport = Arc::new(MockTransport::new());
    transport.respond(
      "/characters/7/comics",
      200,
      wrapper(vec![json!({ "id": 1 }), json!({ "id": 2 })]),
    );
    let (client, _) = mock_client(&transport);

    let comics = client
      .list_related::<Comic>(EntityKind::Character, 7, &QueryParams::new())
      .await
      .unwrap();

    assert_eq!(comics.data.count, 2);
    assert_eq!(transport.calls_to("/characters/7/comics"), 1);
  }

  #[tokio::test]
  async fn test_resolve_skips_failures() {
    let transport = Arc::new(MockTransport::new());
    transport.respond("/comics/1", 200, wrapper(vec![json!({ "id": 1, "title": "One" })]));
    transport.respond("/comics/2", 500, json!({ "code": 500, "status": "boom" }));
    transport.respond("/comics/3", 200, wrapper(vec![json!({ "id": 3, "title": "Three" })]));
    let (client, _) = mock_client(&transport);

    let refs: Vec<ResourceReference> = (1..=3)
      .map(|id| serde_json::from_value(reference("comics", id, "")).unwrap())
      .collect();
    let comics: Vec<Comic> = client.resolve(&refs).await;

    let titles: Vec<&str> = comics.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["One", "Three"]);
  }
}

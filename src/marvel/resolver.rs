//! Resolving resource references into full entities.

use futures::future::join_all;
use std::future::Future;
use tracing::debug;

use super::api_types::{DataWrapper, ResourceReference};
use crate::error::ApiError;

/// The collection and numeric id a resource URI points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
  pub resource_type: String,
  pub id: u64,
}

/// Split a resource URI into its last two path segments.
///
/// The final segment must be all digits and the one before it a word
/// (`[A-Za-z0-9_]+`); anything else, including a trailing slash, is rejected.
pub fn parse_resource_uri(uri: &str) -> Option<ResourceId> {
  let (head, id) = uri.rsplit_once('/')?;
  if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }

  let (_, resource_type) = head.rsplit_once('/')?;
  if resource_type.is_empty()
    || !resource_type
      .bytes()
      .all(|b| b.is_ascii_alphanumeric() || b == b'_')
  {
    return None;
  }

  Some(ResourceId {
    resource_type: resource_type.to_string(),
    id: id.parse().ok()?,
  })
}

pub fn id_from_uri(uri: &str) -> Option<u64> {
  parse_resource_uri(uri).map(|r| r.id)
}

/// Fetch every referenced entity concurrently and keep the ones that loaded.
///
/// References with malformed URIs are skipped. A failed fetch, or one whose
/// result set is empty, is dropped without affecting the others. Results
/// keep the order of `references`.
pub async fn resolve_all<T, F, Fut>(references: &[ResourceReference], fetch_one: F) -> Vec<T>
where
  F: Fn(u64) -> Fut,
  Fut: Future<Output = Result<DataWrapper<T>, ApiError>>,
{
  let targets: Vec<(&str, u64)> = references
    .iter()
    .filter_map(|r| match id_from_uri(&r.resource_uri) {
      Some(id) => Some((r.resource_uri.as_str(), id)),
      None => {
        debug!(uri = %r.resource_uri, "skipping malformed resource URI");
        None
      }
    })
    .collect();

  let results = join_all(targets.iter().map(|(_, id)| fetch_one(*id))).await;

  targets
    .into_iter()
    .zip(results)
    .filter_map(|((uri, _), result)| match result {
      Ok(wrapper) => {
        let first = wrapper.into_first();
        if first.is_none() {
          debug!(uri, "resource resolved to an empty result set");
        }
        first
      }
      Err(e) => {
        debug!(uri, error = %e, "failed to resolve resource");
        None
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  fn reference(uri: &str) -> ResourceReference {
    ResourceReference {
      resource_uri: uri.to_string(),
      name: String::new(),
      role: None,
      kind: None,
    }
  }

  fn found(id: u64) -> DataWrapper<u64> {
    let mut wrapper = DataWrapper::default();
    wrapper.data.results = vec![id];
    wrapper
  }

  #[test]
  fn test_parse_resource_uri() {
    assert_eq!(
      parse_resource_uri("http://gateway.marvel.com/v1/public/comics/21366"),
      Some(ResourceId {
        resource_type: "comics".to_string(),
        id: 21366
      })
    );
    assert_eq!(id_from_uri("/characters/1009610"), Some(1009610));
  }

  #[test]
  fn test_parse_rejects_malformed_uris() {
    assert_eq!(parse_resource_uri(""), None);
    assert_eq!(parse_resource_uri("comics/12"), None);
    assert_eq!(parse_resource_uri("http://x/comics/12/"), None);
    assert_eq!(parse_resource_uri("http://x/comics/abc"), None);
    assert_eq!(parse_resource_uri("http://x/comic-books/12"), None);
    assert_eq!(parse_resource_uri("http://x/comics/99999999999999999999999"), None);
  }

  #[tokio::test]
  async fn test_one_failure_does_not_sink_the_rest() {
    let refs: Vec<ResourceReference> = (1..=4)
      .map(|id| reference(&format!("http://gateway.marvel.com/v1/public/comics/{}", id)))
      .collect();

    let resolved = resolve_all(&refs, |id| async move {
      if id == 3 {
        Err(ApiError::Status {
          endpoint: format!("/comics/{}", id),
          status: 500,
        })
      } else {
        Ok(found(id))
      }
    })
    .await;

    assert_eq!(resolved, vec![1, 2, 4]);
  }

  #[tokio::test]
  async fn test_malformed_and_empty_are_dropped() {
    let calls = AtomicUsize::new(0);
    let refs = vec![
      reference("http://gateway.marvel.com/v1/public/series/10"),
      reference("not a uri"),
      reference("http://gateway.marvel.com/v1/public/series/11"),
    ];

    let resolved = resolve_all(&refs, |id| {
      calls.fetch_add(1, Ordering::SeqCst);
      async move {
        if id == 10 {
          Ok(DataWrapper::default())
        } else {
          Ok(found(id))
        }
      }
    })
    .await;

    assert_eq!(resolved, vec![11]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_empty_reference_list() {
    let resolved: Vec<u64> = resolve_all(&[], |id| async move { Ok(found(id)) }).await;
    assert!(resolved.is_empty());
  }
}

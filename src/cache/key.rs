//! Query parameters and deterministic cache keys for API requests.

use std::collections::BTreeMap;
use std::fmt::Display;

/// Query parameters for one API call.
///
/// Parameters set to `None` are kept so callers can pass optional filters
/// straight through, but they never reach the URL or the cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
  params: BTreeMap<String, Option<String>>,
}

impl QueryParams {
  pub fn new() -> Self {
    Self::default()
  }

  /// Set a parameter.
  pub fn set(mut self, name: impl Into<String>, value: impl Display) -> Self {
    self.params.insert(name.into(), Some(value.to_string()));
    self
  }

  /// Set a parameter that may be absent.
  pub fn set_opt<V: Display>(mut self, name: impl Into<String>, value: Option<V>) -> Self {
    self
      .params
      .insert(name.into(), value.map(|v| v.to_string()));
    self
  }

  pub fn limit(self, limit: u32) -> Self {
    self.set("limit", limit)
  }

  pub fn offset(self, offset: u32) -> Self {
    self.set("offset", offset)
  }

  pub fn order_by(self, field: impl Display) -> Self {
    self.set("orderBy", field)
  }

  /// Parameters with a value, sorted by name.
  pub fn present(&self) -> impl Iterator<Item = (&str, &str)> {
    self
      .params
      .iter()
      .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
  }
}

/// Build the cache key for a request.
///
/// The endpoint's path separators become `_`; the present parameters follow
/// as sorted `name=value` pairs joined with `&`. Insertion order of the
/// parameters never matters.
pub fn cache_key(namespace: &str, endpoint: &str, params: &QueryParams) -> String {
  let query = params
    .present()
    .map(|(k, v)| format!("{}={}", k, v))
    .collect::<Vec<_>>()
    .join("&");

  let path = endpoint.replace('/', "_");
  if query.is_empty() {
    format!("{}{}", namespace, path)
  } else {
    format!("{}{}_{}", namespace, path, query)
  }
}

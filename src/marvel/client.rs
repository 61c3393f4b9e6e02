use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::cache::QueryParams;
use crate::config::Config;
use crate::error::ApiError;

/// A transport-level failure: no HTTP response was received.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
  fn from(e: reqwest::Error) -> Self {
    Self(e.to_string())
  }
}

/// Status and body of an HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
  pub status: u16,
  pub body: Vec<u8>,
}

impl HttpResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// Minimal HTTP GET capability the API client needs.
#[async_trait]
pub trait HttpTransport: Send + Sync {
  async fn get(&self, url: &Url) -> std::result::Result<HttpResponse, TransportError>;
}

/// HTTP transport backed by reqwest.
pub struct ReqwestTransport {
  client: reqwest::Client,
}

impl ReqwestTransport {
  pub fn new(timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .user_agent(concat!("comicdex/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client })
  }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
  async fn get(&self, url: &Url) -> std::result::Result<HttpResponse, TransportError> {
    let response = self.client.get(url.clone()).send().await?;
    let status = response.status().as_u16();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse { status, body })
  }
}

/// Marvel API client wrapper
#[derive(Clone)]
pub struct MarvelClient {
  http: Arc<dyn HttpTransport>,
  base_url: String,
  api_key: Option<String>,
}

impl MarvelClient {
  pub fn new(config: &Config) -> Result<Self> {
    let http = ReqwestTransport::new(Duration::from_secs(config.api.timeout_secs))?;

    Ok(Self::with_transport(
      Arc::new(http),
      config.api.base_url.clone(),
      Config::get_api_key(),
    ))
  }

  /// Create a client over an arbitrary transport.
  pub fn with_transport(
    http: Arc<dyn HttpTransport>,
    base_url: impl Into<String>,
    api_key: Option<String>,
  ) -> Self {
    Self {
      http,
      base_url: base_url.into(),
      api_key,
    }
  }

  /// Build the full request URL: base + endpoint, the API key, then every present parameter.
  pub fn build_url(&self, endpoint: &str, params: &QueryParams) -> std::result::Result<Url, ApiError> {
    let raw = format!("{}{}", self.base_url.trim_end_matches('/'), endpoint);
    let mut url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl {
      endpoint: endpoint.to_string(),
      message: e.to_string(),
    })?;

    {
      let mut query = url.query_pairs_mut();
      if let Some(key) = &self.api_key {
        query.append_pair("apikey", key);
      }
      for (name, value) in params.present() {
        query.append_pair(name, value);
      }
    }

    // Avoid a dangling '?' when there was nothing to add
    if url.query() == Some("") {
      url.set_query(None);
    }

    Ok(url)
  }

  /// GET `endpoint` and return the response body once it is known to be a success.
  ///
  /// Transport failures, non-2xx statuses, undecodable bodies and bodies
  /// carrying an error `code` are all errors.
  pub async fn get_json(&self, endpoint: &str, params: &QueryParams) -> std::result::Result<Value, ApiError> {
    let url = self.build_url(endpoint, params)?;

    let response = self.http.get(&url).await.map_err(|e| {
      warn!(endpoint, error = %e, "Marvel API request failed");
      ApiError::Transport {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
      }
    })?;

    if !response.is_success() {
      warn!(endpoint, status = response.status, "Marvel API error status");
      return Err(ApiError::Status {
        endpoint: endpoint.to_string(),
        status: response.status,
      });
    }

    let body: Value = serde_json::from_slice(&response.body).map_err(|e| {
      warn!(endpoint, error = %e, "Marvel API returned an unreadable body");
      ApiError::Decode {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
      }
    })?;

    check_api_code(endpoint, &body)?;

    Ok(body)
  }
}

/// Reject bodies whose embedded `code` reports an error.
///
/// A missing, zero or empty code is not an error; neither is 200.
fn check_api_code(endpoint: &str, body: &Value) -> std::result::Result<(), ApiError> {
  let code = match body.get("code") {
    Some(Value::Number(n)) if n.as_u64() != Some(0) && n.as_u64() != Some(200) => n.to_string(),
    Some(Value::String(s)) if !s.is_empty() => s.clone(),
    _ => return Ok(()),
  };

  let status = body
    .get("status")
    .or_else(|| body.get("message"))
    .and_then(Value::as_str)
    .unwrap_or("Unknown error")
    .to_string();

  warn!(endpoint, code = %code, status = %status, "Marvel API reported an error");
  Err(ApiError::Api {
    endpoint: endpoint.to_string(),
    code,
    status,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::MockTransport;
  use serde_json::json;

  fn client(transport: &Arc<MockTransport>, api_key: Option<&str>) -> MarvelClient {
    MarvelClient::with_transport(
      transport.clone(),
      "https://gateway.marvel.com/v1/public",
      api_key.map(String::from),
    )
  }

  #[test]
  fn test_build_url_appends_key_and_present_params() {
    let transport = Arc::new(MockTransport::new());
    let client = client(&transport, Some("pub-key"));
    let params = QueryParams::new()
      .set("titleStartsWith", "Spider Man")
      .set_opt("orderBy", None::<&str>)
      .limit(10);

    let url = client.build_url("/comics", &params).unwrap();

    assert_eq!(
      url.as_str(),
      "https://gateway.marvel.com/v1/public/comics?apikey=pub-key&limit=10&titleStartsWith=Spider+Man"
    );
  }

  #[test]
  fn test_build_url_without_key_or_params_has_no_query() {
    let transport = Arc::new(MockTransport::new());
    let client = client(&transport, None);

    let url = client.build_url("/characters/1009610", &QueryParams::new()).unwrap();

    assert_eq!(
      url.as_str(),
      "https://gateway.marvel.com/v1/public/characters/1009610"
    );
  }

  #[tokio::test]
  async fn test_success_returns_body() {
    let transport = Arc::new(MockTransport::new());
    transport.respond("/comics/1", 200, json!({ "code": 200, "data": { "results": [] } }));
    let client = client(&transport, None);

    let body = client.get_json("/comics/1", &QueryParams::new()).await.unwrap();

    assert_eq!(body["code"], json!(200));
  }

  #[tokio::test]
  async fn test_non_success_status_is_an_error() {
    let transport = Arc::new(MockTransport::new());
    transport.respond("/comics/1", 404, json!({ "code": 404, "status": "not found" }));
    let client = client(&transport, None);

    let err = client.get_json("/comics/1", &QueryParams::new()).await.unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 404, .. }));
    assert!(err.is_not_found());
  }

  #[tokio::test]
  async fn test_transport_failure_is_an_error() {
    let transport = Arc::new(MockTransport::new());
    let client = client(&transport, None);

    // Unregistered paths fail at the transport level
    let err = client.get_json("/comics/1", &QueryParams::new()).await.unwrap_err();

    assert!(matches!(err, ApiError::Transport { .. }));
  }

  #[tokio::test]
  async fn test_embedded_error_code_is_an_error() {
    let transport = Arc::new(MockTransport::new());
    transport.respond(
      "/characters",
      200,
      json!({ "code": "InvalidCredentials", "message": "The passed API key is invalid." }),
    );
    transport.respond("/events", 200, json!({ "code": 409, "status": "Limit greater than 100." }));
    let client = client(&transport, None);

    let credentials = client.get_json("/characters", &QueryParams::new()).await.unwrap_err();
    let limit = client.get_json("/events", &QueryParams::new()).await.unwrap_err();

    match credentials {
      ApiError::Api { code, status, .. } => {
        assert_eq!(code, "InvalidCredentials");
        assert_eq!(status, "The passed API key is invalid.");
      }
      other => panic!("unexpected error: {:?}", other),
    }
    assert!(matches!(limit, ApiError::Api { ref code, .. } if code == "409"));
  }

  #[tokio::test]
  async fn test_unparseable_body_is_an_error() {
    let transport = Arc::new(MockTransport::new());
    transport.respond_raw("/series/5", 200, b"<html>oops</html>".to_vec());
    let client = client(&transport, None);

    let err = client.get_json("/series/5", &QueryParams::new()).await.unwrap_err();

    assert!(matches!(err, ApiError::Decode { .. }));
  }
}

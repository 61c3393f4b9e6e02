use thiserror::Error;

use crate::marvel::EntityKind;

/// Failure of a single API request.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The request never produced a response.
  #[error("request to {endpoint} failed: {message}")]
  Transport { endpoint: String, message: String },

  /// The server answered with a non-success HTTP status.
  #[error("Marvel API error: {status} for {endpoint}")]
  Status { endpoint: String, status: u16 },

  /// The response parsed but carried an error code in its body.
  #[error("Marvel API error: {status} (code {code}) for {endpoint}")]
  Api {
    endpoint: String,
    code: String,
    status: String,
  },

  /// The response body could not be decoded.
  #[error("failed to decode response from {endpoint}: {message}")]
  Decode { endpoint: String, message: String },

  #[error("invalid request URL for {endpoint}: {message}")]
  InvalidUrl { endpoint: String, message: String },

  /// The endpoint does not support the requested operation.
  #[error("{0}")]
  Unsupported(String),
}

impl ApiError {
  /// Whether the server said the requested resource does not exist.
  pub fn is_not_found(&self) -> bool {
    match self {
      Self::Status { status, .. } => *status == 404,
      Self::Api { code, .. } => code == "404",
      _ => false,
    }
  }
}

/// Failure to load an entity graph.
#[derive(Debug, Error)]
pub enum GraphError {
  /// The id was not a non-negative integer.
  #[error("invalid id: {0}")]
  InvalidId(String),

  #[error("{kind} {id} not found")]
  NotFound { kind: EntityKind, id: u64 },

  #[error("failed to load {kind} {id}: {source}")]
  Server {
    kind: EntityKind,
    id: u64,
    #[source]
    source: ApiError,
  },
}

impl GraphError {
  /// HTTP-style status a caller should surface: 404 for bad or missing ids, 500 otherwise.
  pub fn status(&self) -> u16 {
    match self {
      Self::InvalidId(_) | Self::NotFound { .. } => 404,
      Self::Server { .. } => 500,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_not_found_detection() {
    let status = ApiError::Status {
      endpoint: "/comics/1".to_string(),
      status: 404,
    };
    assert!(status.is_not_found());

    let server = ApiError::Status {
      endpoint: "/comics/1".to_string(),
      status: 503,
    };
    assert!(!server.is_not_found());

    let api = ApiError::Api {
      endpoint: "/comics/1".to_string(),
      code: "404".to_string(),
      status: "We couldn't find that comic_issue".to_string(),
    };
    assert!(api.is_not_found());
  }

  #[test]
  fn test_graph_error_status() {
    assert_eq!(GraphError::InvalidId("-1".to_string()).status(), 404);
    assert_eq!(
      GraphError::NotFound {
        kind: EntityKind::Comic,
        id: 7
      }
      .status(),
      404
    );
    assert_eq!(
      GraphError::Server {
        kind: EntityKind::Comic,
        id: 7,
        source: ApiError::Unsupported("x".to_string()),
      }
      .status(),
      500
    );
  }
}

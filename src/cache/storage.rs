//! Structured (SQLite) storage backend.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::traits::{StoreBackend, StoreError, StoreResult};
use crate::db::Database;

const NAME: &str = "sqlite";

type SharedConnection = Arc<Mutex<Connection>>;

/// SQLite-based key/value store.
///
/// The connection is opened on first use and shared by every later call. A
/// failed open is remembered too, so the store then reports itself as
/// unavailable without retrying.
pub struct SqliteStore {
  path: PathBuf,
  conn: OnceCell<Option<SharedConnection>>,
}

impl SqliteStore {
  /// Create a store backed by the database file at `path`. Nothing is opened yet.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      conn: OnceCell::new(),
    }
  }

  /// Create a store at the default location, if one can be determined.
  pub fn at_default_path() -> Option<Self> {
    Database::default_path().map(Self::new)
  }

  /// Get the shared connection, opening it if this is the first access.
  ///
  /// Concurrent first callers all wait on the same initialization.
  async fn handle(&self) -> StoreResult<SharedConnection> {
    let handle = self
      .conn
      .get_or_init(|| async {
        let path = self.path.clone();
        match tokio::task::spawn_blocking(move || Database::open(&path)).await {
          Ok(Ok(conn)) => {
            debug!(path = %self.path.display(), "opened structured cache store");
            Some(Arc::new(Mutex::new(conn)))
          }
          Ok(Err(e)) => {
            warn!(error = %e, "structured cache store unavailable");
            None
          }
          Err(e) => {
            warn!(error = %e, "structured cache store initialization panicked");
            None
          }
        }
      })
      .await;

    handle
      .clone()
      .ok_or_else(|| StoreError::unavailable(NAME, "database could not be opened"))
  }

  /// Run a blocking operation against the connection.
  async fn with_conn<R, F>(&self, op: F) -> StoreResult<R>
  where
    R: Send + 'static,
    F: FnOnce(&Connection) -> rusqlite::Result<R> + Send + 'static,
  {
    let handle = self.handle().await?;

    tokio::task::spawn_blocking(move || {
      let conn = handle
        .lock()
        .map_err(|e| StoreError::backend(NAME, format!("lock poisoned: {}", e)))?;
      op(&conn).map_err(|e| StoreError::backend(NAME, e))
    })
    .await
    .map_err(|e| StoreError::backend(NAME, e))?
  }
}

#[async_trait]
impl StoreBackend for SqliteStore {
  fn name(&self) -> &'static str {
    NAME
  }

  async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
    let key = key.to_string();
    self
      .with_conn(move |conn| {
        conn
          .query_row(
            "SELECT value FROM kv_cache WHERE key = ?",
            params![key],
            |row| row.get(0),
          )
          .optional()
      })
      .await
  }

  async fn put(&self, key: &str, value: &[u8]) -> StoreResult<()> {
    let key = key.to_string();
    let value = value.to_vec();
    self
      .with_conn(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO kv_cache (key, value, stored_at)
           VALUES (?, ?, datetime('now'))",
          params![key, value],
        )?;
        Ok(())
      })
      .await
  }

  async fn delete(&self, key: &str) -> StoreResult<()> {
    let key = key.to_string();
    self
      .with_conn(move |conn| {
        conn.execute("DELETE FROM kv_cache WHERE key = ?", params![key])?;
        Ok(())
      })
      .await
  }

  async fn keys(&self, prefix: &str) -> StoreResult<Vec<String>> {
    let prefix = prefix.to_string();
    self
      .with_conn(move |conn| {
        // substr rather than LIKE: '_' in a prefix would act as a wildcard
        let mut stmt = conn.prepare(
          "SELECT key FROM kv_cache WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
        )?;
        let keys = stmt
          .query_map(params![prefix], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
      })
      .await
  }

  async fn clear(&self, prefix: &str) -> StoreResult<usize> {
    let prefix = prefix.to_string();
    self
      .with_conn(move |conn| {
        conn.execute(
          "DELETE FROM kv_cache WHERE substr(key, 1, length(?1)) = ?1",
          params![prefix],
        )
      })
      .await
  }
}

use rusqlite::Connection;
use std::path::{Path, PathBuf};

use crate::cache::{StoreError, StoreResult};

/// Schema for the structured cache store.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_cache (
    key TEXT PRIMARY KEY,
    value BLOB NOT NULL,
    stored_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Opens SQLite cache databases.
pub struct Database;

impl Database {
  /// Open or create the database at `path`, creating parent directories.
  pub fn open(path: &Path) -> StoreResult<Connection> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| {
        StoreError::unavailable(
          "sqlite",
          format!("failed to create database directory: {}", e),
        )
      })?;
    }

    let conn = Connection::open(path).map_err(|e| {
      StoreError::unavailable(
        "sqlite",
        format!("failed to open database at {}: {}", path.display(), e),
      )
    })?;

    Self::run_migrations(&conn)?;

    Ok(conn)
  }

  /// Get the default database path
  pub fn default_path() -> Option<PathBuf> {
    let data_dir = dirs::data_dir().or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))?;

    Some(data_dir.join("comicdex").join("cache.db"))
  }

  /// Run database migrations
  fn run_migrations(conn: &Connection) -> StoreResult<()> {
    conn
      .execute_batch(SCHEMA)
      .map_err(|e| StoreError::unavailable("sqlite", format!("failed to run migrations: {}", e)))
  }
}

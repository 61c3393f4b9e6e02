use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::{
  ExpiringCache, FlatStore, SqliteStore, StoreBackend, TieredStore, DEFAULT_FLAT_CAPACITY,
  DEFAULT_NAMESPACE,
};

pub const DEFAULT_BASE_URL: &str = "https://gateway.marvel.com/v1/public";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub base_url: String,
  /// Per-request timeout
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_string(),
      timeout_secs: 30,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Prefix for every cache key this client writes
  pub namespace: String,
  pub ttl_hours: u32,
  /// Use the SQLite store
  pub structured: bool,
  pub database_path: Option<PathBuf>,
  /// Use the flat JSON file store
  pub flat: bool,
  pub flat_path: Option<PathBuf>,
  pub flat_capacity_bytes: usize,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      namespace: DEFAULT_NAMESPACE.to_string(),
      ttl_hours: 24,
      structured: true,
      database_path: None,
      flat: true,
      flat_path: None,
      flat_capacity_bytes: DEFAULT_FLAT_CAPACITY,
    }
  }
}

impl CacheConfig {
  /// Storage backends in fallback order: SQLite first, then the flat file.
  pub fn backends(&self) -> Vec<Arc<dyn StoreBackend>> {
    let mut backends: Vec<Arc<dyn StoreBackend>> = Vec::new();

    if self.structured {
      match self.database_path.clone().or_else(crate::db::Database::default_path) {
        Some(path) => backends.push(Arc::new(SqliteStore::new(path))),
        None => warn!("no data directory found, structured cache store disabled"),
      }
    }

    if self.flat {
      let flat = match self.flat_path.clone().or_else(FlatStore::default_path) {
        Some(path) => FlatStore::open(path),
        None => FlatStore::in_memory(),
      };
      backends.push(Arc::new(flat.with_capacity(self.flat_capacity_bytes)));
    }

    backends
  }

  /// Build the expiring cache described by this configuration.
  pub fn build(&self) -> ExpiringCache {
    let store = TieredStore::new(self.backends());
    debug!(backends = ?store.backend_names(), "cache store configured");

    ExpiringCache::new(store)
      .with_ttl(chrono::Duration::hours(i64::from(self.ttl_hours)))
      .with_namespace(self.namespace.clone())
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./comicdex.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/comicdex/config.yaml
  ///
  /// Without any file the built-in defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => {
        debug!("no configuration file found, using defaults");
        Ok(Self::default())
      }
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("comicdex.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("comicdex").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the API key from environment variables.
  ///
  /// Checks COMICDEX_API_KEY first, then MARVEL_API_KEY as fallback.
  /// Requests are sent without a key when neither is set.
  pub fn get_api_key() -> Option<String> {
    std::env::var("COMICDEX_API_KEY")
      .or_else(|_| std::env::var("MARVEL_API_KEY"))
      .ok()
      .filter(|key| !key.is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_partial_file_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(
      &path,
      "cache:\n  ttl_hours: 1\n  structured: false\n",
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();

    assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.api.timeout_secs, 30);
    assert_eq!(config.cache.ttl_hours, 1);
    assert!(!config.cache.structured);
    assert!(config.cache.flat);
    assert_eq!(config.cache.namespace, "marvel_");
  }

  #[test]
  fn test_missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(Config::load(Some(&dir.path().join("nope.yaml"))).is_err());
  }

  #[test]
  fn test_malformed_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "cache: [not, a, map]\n").unwrap();

    assert!(Config::load(Some(&path)).is_err());
  }

  #[test]
  fn test_backends_follow_toggles() {
    let dir = TempDir::new().unwrap();
    let mut cache = CacheConfig {
      database_path: Some(dir.path().join("cache.db")),
      flat_path: Some(dir.path().join("flat.json")),
      ..CacheConfig::default()
    };

    let names: Vec<&str> = cache.backends().iter().map(|b| b.name()).collect();
    assert_eq!(names, vec!["sqlite", "flat"]);

    cache.structured = false;
    let names: Vec<&str> = cache.backends().iter().map(|b| b.name()).collect();
    assert_eq!(names, vec!["flat"]);

    cache.flat = false;
    assert!(cache.backends().is_empty());
  }

  #[tokio::test]
  async fn test_built_cache_uses_configured_namespace() {
    let dir = TempDir::new().unwrap();
    let cache = CacheConfig {
      namespace: "test_".to_string(),
      structured: false,
      flat_path: Some(dir.path().join("flat.json")),
      ..CacheConfig::default()
    }
    .build();

    cache.write("test_k", &42u32).await;

    assert_eq!(cache.namespace(), "test_");
    assert_eq!(cache.read::<u32>("test_k").await, Some(42));
    assert!(dir.path().join("flat.json").exists());
  }
}

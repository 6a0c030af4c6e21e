//! Configuration loader for the workflow catalog.
//!
//! Reads `config.toml` from the data directory (`~/.wfcatalog/` in production)
//! and deserializes it into [`CatalogConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use catalog_types::config::CatalogConfig;

use crate::sqlite::pool::database_url_in;

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "CATALOG_DATA_DIR";

/// Configuration together with the reason defaults were used, if any.
///
/// Loading happens before the tracing subscriber exists, so the caller logs
/// `fallback` once tracing is up.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: CatalogConfig,
    pub fallback: Option<String>,
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`CatalogConfig::default()`].
/// - If the file exists but fails to read or parse, returns the default and
///   describes the failure in [`LoadedConfig::fallback`].
pub async fn load_config(data_dir: &Path) -> LoadedConfig {
    let config_path = data_dir.join("config.toml");
    let defaults = |reason: String| LoadedConfig {
        config: CatalogConfig::default(),
        fallback: Some(reason),
    };

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return LoadedConfig {
                config: CatalogConfig::default(),
                fallback: None,
            };
        }
        Err(err) => {
            return defaults(format!(
                "failed to read {}: {err}, using defaults",
                config_path.display()
            ));
        }
    };

    match toml::from_str::<CatalogConfig>(&content) {
        Ok(config) => LoadedConfig {
            config,
            fallback: None,
        },
        Err(err) => defaults(format!(
            "failed to parse {}: {err}, using defaults",
            config_path.display()
        )),
    }
}

/// Resolve the data directory.
///
/// Priority:
/// 1. `CATALOG_DATA_DIR` environment variable
/// 2. `~/.wfcatalog`
/// 3. `.wfcatalog` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".wfcatalog");
    }

    PathBuf::from(".wfcatalog")
}

/// Database URL from config, or `catalog.db` inside the data directory.
pub fn resolve_database_url(config: &CatalogConfig, data_dir: &Path) -> String {
    config
        .database
        .url
        .clone()
        .unwrap_or_else(|| database_url_in(data_dir))
}

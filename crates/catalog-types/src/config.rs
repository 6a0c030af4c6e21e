//! Configuration types for the workflow catalog.
//!
//! `CatalogConfig` mirrors `config.toml` in the data directory. Every section
//! and field is optional in the file.

use serde::{Deserialize, Serialize};

/// Top-level catalog configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database location. When `url` is unset the catalog uses
/// `{data_dir}/catalog.db`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    #[serde(default = "default_page_limit")]
    pub default_limit: u64,
    #[serde(default = "default_max_page_limit")]
    pub max_limit: u64,
}

fn default_page_limit() -> u64 {
    20
}

fn default_max_page_limit() -> u64 {
    200
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: default_page_limit(),
            max_limit: default_max_page_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Largest accepted workflow document, in bytes.
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: usize,
}

fn default_max_document_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: default_max_document_bytes(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
    /// Export spans through OpenTelemetry (stdout exporter).
    #[serde(default)]
    pub otel: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_config_default_values() {
        let config = CatalogConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.pagination.default_limit, 20);
        assert_eq!(config.pagination.max_limit, 200);
        assert_eq!(config.limits.max_document_bytes, 10 * 1024 * 1024);
        assert!(config.database.url.is_none());
        assert!(!config.logging.otel);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: CatalogConfig = toml::from_str(
            r#"
[server]
port = 9000

[pagination]
max_limit = 50
"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.pagination.max_limit, 50);
        assert_eq!(config.pagination.default_limit, 20);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: CatalogConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(!config.logging.json);
    }
}

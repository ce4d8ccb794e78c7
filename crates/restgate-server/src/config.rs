//! Server configuration.

use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use restgate_core::GatewayConfig;

/// Server configuration.
///
/// Exactly one binding is required: the database connection string. Cache
/// planes are optional; with both disabled the gateway answers every
/// request straight from the database and still works end to end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// PostgreSQL connection URL. The one required binding.
    #[serde(default)]
    pub database_url: String,

    /// Server bind address.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Database connection pool maximum size.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: usize,

    /// Maximum entries held by the in-process data plane.
    #[serde(default = "default_data_cache_entries")]
    pub data_cache_entries: usize,

    /// Enable CORS.
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Enable request tracing.
    #[serde(default = "default_true")]
    pub tracing_enabled: bool,

    /// OpenAPI document endpoint path.
    #[serde(default = "default_openapi_path")]
    pub openapi_path: String,

    /// Swagger UI endpoint path.
    #[serde(default = "default_docs_path")]
    pub docs_path: String,

    /// Health check endpoint path.
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// Gateway engine configuration (conventions, cache behavior).
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            bind_addr: default_bind_addr(),
            pool_max_size: default_pool_max_size(),
            data_cache_entries: default_data_cache_entries(),
            cors_enabled: true,
            tracing_enabled: true,
            openapi_path: default_openapi_path(),
            docs_path: default_docs_path(),
            health_path: default_health_path(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a message when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        toml::from_str(&raw).map_err(|e| format!("Failed to parse {}: {e}", path.display()))
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns a message when the database URL is missing or the gateway
    /// section is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.database_url.is_empty() {
            return Err(
                "database_url is required. Set RESTGATE_DATABASE_URL or database_url in config."
                    .to_string(),
            );
        }
        if self.pool_max_size == 0 {
            return Err("pool_max_size must be positive".to_string());
        }
        self.gateway.validate()
    }
}

fn default_bind_addr() -> SocketAddr {
    "127.0.0.1:8000".parse().expect("static address parses")
}

fn default_pool_max_size() -> usize {
    10
}

fn default_data_cache_entries() -> usize {
    1024
}

fn default_true() -> bool {
    true
}

fn default_openapi_path() -> String {
    "/openapi.json".to_string()
}

fn default_docs_path() -> String {
    "/docs".to_string()
}

fn default_health_path() -> String {
    "/health".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8000");
        assert_eq!(config.openapi_path, "/openapi.json");
        assert_eq!(config.docs_path, "/docs");
        assert_eq!(config.health_path, "/health");
        assert!(config.cors_enabled);
    }

    #[test]
    fn test_validate_requires_database_url() {
        let config = ServerConfig::default();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("database_url"));
    }

    #[test]
    fn test_validate_ok_with_database_url() {
        let config = ServerConfig {
            database_url: "postgresql://localhost/app".to_string(),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip_with_gateway_section() {
        let config: ServerConfig = toml::from_str(
            r#"
            database_url = "postgresql://localhost/app"
            [gateway]
            primary_key = "pk"
            data_cache_ttl_secs = 30
            "#,
        )
        .expect("valid toml");
        assert_eq!(config.gateway.primary_key, "pk");
        assert_eq!(config.gateway.data_cache_ttl_secs, 30);
        assert!(config.validate().is_ok());
    }
}

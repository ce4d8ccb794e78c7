//! Gateway configuration: naming conventions and cache behavior.

use serde::{Deserialize, Serialize};

/// Gateway configuration.
///
/// Everything here has a working default; the only required binding of the
/// whole system is the database connection string, which lives in the
/// server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Column name treated as the primary key when present.
    #[serde(default = "default_primary_key")]
    pub primary_key: String,

    /// Column names that mark a table as soft-deletable. The first match
    /// in column order wins.
    #[serde(default = "default_soft_delete_columns")]
    pub soft_delete_columns: Vec<String>,

    /// Enable the control plane (version tokens + schema payloads).
    #[serde(default = "default_true")]
    pub control_plane_enabled: bool,

    /// Enable the data plane (edge-cached list responses).
    #[serde(default = "default_true")]
    pub data_plane_enabled: bool,

    /// TTL applied to data-plane entries, in seconds.
    #[serde(default = "default_data_cache_ttl")]
    pub data_cache_ttl_secs: u64,

    /// Internal host embedded in data-plane cache URLs. Never dialed; it
    /// only namespaces the keys.
    #[serde(default = "default_cache_host")]
    pub cache_host: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            primary_key: default_primary_key(),
            soft_delete_columns: default_soft_delete_columns(),
            control_plane_enabled: true,
            data_plane_enabled: true,
            data_cache_ttl_secs: default_data_cache_ttl(),
            cache_host: default_cache_host(),
        }
    }
}

impl GatewayConfig {
    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns a message when the primary key name is empty or the data
    /// cache TTL is zero while the data plane is enabled.
    pub fn validate(&self) -> Result<(), String> {
        if self.primary_key.is_empty() {
            return Err("primary_key must not be empty".to_string());
        }
        if self.data_plane_enabled && self.data_cache_ttl_secs == 0 {
            return Err("data_cache_ttl_secs must be positive when the data plane is enabled".to_string());
        }
        Ok(())
    }
}

fn default_primary_key() -> String {
    "id".to_string()
}

fn default_soft_delete_columns() -> Vec<String> {
    vec!["deleted_at".to_string(), "is_deleted".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_data_cache_ttl() -> u64 {
    60
}

fn default_cache_host() -> String {
    "restgate.internal".to_string()
}

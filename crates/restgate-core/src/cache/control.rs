//! Control-plane store: authoritative version tokens and schema payloads.
//!
//! The control plane is an external key-value store with three key
//! families:
//!
//! - `version:<table>`: opaque per-table version token, replaced on
//!   every successful mutation
//! - `schema:<table>`: JSON-serialized column metadata + the
//!   introspection token it was captured under
//! - `openapi`: the cached OpenAPI document + the global schema digest
//!
//! Callers treat every control-plane failure as a cache error: logged,
//! swallowed, and answered from the authoritative source instead.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GatewayError, Result};
use crate::schema::ColumnDescriptor;
use crate::version::VersionToken;

/// Key for the cached OpenAPI document.
pub const OPENAPI_KEY: &str = "openapi";

/// Key of a table's version token.
#[must_use]
pub fn version_key(table: &str) -> String {
    format!("version:{table}")
}

/// Key of a table's cached column metadata.
#[must_use]
pub fn schema_key(table: &str) -> String {
    format!("schema:{table}")
}

/// External key-value store interface.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Read a value. `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value.
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Cached column metadata, stored under `schema:<table>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaPayload {
    /// Introspection token the columns were captured under.
    pub version: String,
    /// Column descriptors in ordinal order.
    pub columns: Vec<ColumnDescriptor>,
}

/// Cached OpenAPI document, stored under `openapi`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiPayload {
    /// The assembled OpenAPI 3 document.
    pub spec:      Value,
    /// Global schema digest the document was generated under.
    pub version:   String,
    /// Millisecond timestamp of generation.
    #[serde(rename = "cachedAt")]
    pub cached_at: i64,
}

/// Load and deserialize a typed payload.
///
/// A payload that fails to deserialize is treated as absent; a stale
/// layout must never take a request down.
pub async fn load_json<T: serde::de::DeserializeOwned>(
    control: &dyn ControlPlane,
    key: &str,
) -> Result<Option<T>> {
    let Some(raw) = control.get(key).await? else {
        return Ok(None);
    };
    Ok(serde_json::from_str(&raw).ok())
}

/// Serialize and store a typed payload.
pub async fn store_json<T: Serialize>(
    control: &dyn ControlPlane,
    key: &str,
    payload: &T,
) -> Result<()> {
    let raw = serde_json::to_string(payload)
        .map_err(|e| GatewayError::cache(format!("Failed to serialize {key}: {e}")))?;
    control.put(key, &raw).await
}

/// Read a table's stored version token.
pub async fn load_version(
    control: &dyn ControlPlane,
    table: &str,
) -> Result<Option<VersionToken>> {
    Ok(control.get(&version_key(table)).await?.map(VersionToken::new))
}

/// Store a table's version token.
pub async fn store_version(
    control: &dyn ControlPlane,
    table: &str,
    token: &VersionToken,
) -> Result<()> {
    control.put(&version_key(table), token.as_str()).await
}

/// In-process control plane.
///
/// The default when no external store is bound; state lives for the
/// process only, which still gives single-instance deployments the full
/// caching behavior.
#[derive(Debug, Default)]
pub struct MemoryControlPlane {
    entries: DashMap<String, String>,
}

impl MemoryControlPlane {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ControlPlane for MemoryControlPlane {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SqlType;

    #[tokio::test]
    async fn test_memory_round_trip() {
        let store = MemoryControlPlane::new();
        store.put("version:users", "123").await.expect("put");
        assert_eq!(
            store.get("version:users").await.expect("get"),
            Some("123".to_string())
        );
        store.delete("version:users").await.expect("delete");
        assert_eq!(store.get("version:users").await.expect("get"), None);
    }

    #[tokio::test]
    async fn test_delete_absent_key_is_ok() {
        let store = MemoryControlPlane::new();
        store.delete("nope").await.expect("delete absent");
    }

    #[tokio::test]
    async fn test_schema_payload_round_trip() {
        let store = MemoryControlPlane::new();
        let payload = SchemaPayload {
            version: "777".to_string(),
            columns: vec![ColumnDescriptor::new("id", SqlType::Integer, false)],
        };
        store_json(&store, &schema_key("users"), &payload)
            .await
            .expect("store");
        let loaded: Option<SchemaPayload> = load_json(&store, &schema_key("users"))
            .await
            .expect("load");
        assert_eq!(loaded, Some(payload));
    }

    #[tokio::test]
    async fn test_corrupt_payload_treated_as_absent() {
        let store = MemoryControlPlane::new();
        store.put(OPENAPI_KEY, "{not json").await.expect("put");
        let loaded: Option<OpenApiPayload> = load_json(&store, OPENAPI_KEY).await.expect("load");
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_version_helpers() {
        let store = MemoryControlPlane::new();
        assert_eq!(load_version(&store, "users").await.expect("load"), None);
        let token = VersionToken::new("1700000000000");
        store_version(&store, "users", &token).await.expect("store");
        assert_eq!(load_version(&store, "users").await.expect("load"), Some(token));
    }

    #[test]
    fn test_key_shapes() {
        assert_eq!(version_key("users"), "version:users");
        assert_eq!(schema_key("users"), "schema:users");
    }

    #[test]
    fn test_openapi_payload_layout() {
        let payload = OpenApiPayload {
            spec:      serde_json::json!({"openapi": "3.0.3"}),
            version:   "digest".to_string(),
            cached_at: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&payload).expect("serializable");
        assert!(json.get("cachedAt").is_some());
        assert!(json.get("cached_at").is_none());
    }
}

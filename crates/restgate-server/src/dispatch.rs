//! Bundle resolution and drift detection.
//!
//! Resolution order: code-plane hot path, then control-plane schema
//! payload (when its stored version matches the live introspection
//! token), then full introspection. A hot-path hit also schedules a
//! detached drift probe; on a confirmed token mismatch the probe purges
//! the code-plane entry and the control-plane schema payload so the next
//! request rebuilds. The probed request itself is still served from the
//! cached bundle, which keeps p50 latency flat at the cost of one
//! possibly stale response.

use std::sync::Arc;

use axum::http::HeaderMap;
use tracing::{debug, warn};

use restgate_core::cache::control::{load_json, schema_key, store_json, SchemaPayload};
use restgate_core::db::SchemaIntrospector;
use restgate_core::schema::ColumnDescriptor;
use restgate_core::tasks::spawn_detached;
use restgate_core::{TableDescriptor, VersionToken};

use crate::bundle::TableBundle;
use crate::error::ApiError;
use crate::state::AppState;

/// Whether this request disables cache reads (`X-Cache-Control: no-cache`).
/// Writes still happen.
#[must_use]
pub fn cache_bypassed(headers: &HeaderMap) -> bool {
    headers
        .get("x-cache-control")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("no-cache"))
}

/// Resolve a table to its handler bundle.
///
/// # Errors
///
/// Returns [`ApiError::TableNotFound`] for unknown tables and database
/// errors from introspection.
pub async fn resolve_bundle(
    state: &AppState,
    table: &str,
    bypass_cache: bool,
) -> Result<Arc<TableBundle>, ApiError> {
    if !bypass_cache {
        if let Some(bundle) = state.code.get(table) {
            schedule_drift_check(state.clone(), table.to_string(), bundle.version.clone());
            return Ok(bundle);
        }
    }

    let token = state
        .db
        .table_version(table)
        .await
        .map_err(ApiError::from)?
        .ok_or(ApiError::TableNotFound)?;

    let mut columns = if bypass_cache {
        None
    } else {
        load_cached_columns(state, table, &token).await
    };

    let introspected = columns.is_none();
    if columns.is_none() {
        columns = state
            .db
            .table_columns(table)
            .await
            .map_err(ApiError::from)?;
    }
    let columns = columns.ok_or(ApiError::TableNotFound)?;

    if introspected {
        persist_columns(state, table, &token, &columns).await;
    }

    let descriptor = Arc::new(TableDescriptor::build(
        table,
        columns,
        &state.conventions,
    ));
    let bundle = Arc::new(TableBundle::build(descriptor, token));
    state.code.insert(table, Arc::clone(&bundle));
    debug!(table = %table, version = %bundle.version, "compiled handler bundle");
    Ok(bundle)
}

/// Load cached column metadata when its stored version matches the live
/// introspection token. Failures are logged and treated as a miss.
async fn load_cached_columns(
    state: &AppState,
    table: &str,
    token: &VersionToken,
) -> Option<Vec<ColumnDescriptor>> {
    let control = state.control.as_ref()?;
    match load_json::<SchemaPayload>(control.as_ref(), &schema_key(table)).await {
        Ok(Some(payload)) if payload.version == token.as_str() => Some(payload.columns),
        Ok(_) => None,
        Err(e) => {
            warn!(table = %table, error = %e, "control-plane schema read failed");
            None
        }
    }
}

/// Persist freshly introspected columns under the new token. Failures are
/// logged and swallowed.
async fn persist_columns(
    state: &AppState,
    table: &str,
    token: &VersionToken,
    columns: &[ColumnDescriptor],
) {
    let Some(control) = &state.control else {
        return;
    };
    let payload = SchemaPayload {
        version: token.as_str().to_string(),
        columns: columns.to_vec(),
    };
    if let Err(e) = store_json(control.as_ref(), &schema_key(table), &payload).await {
        warn!(table = %table, error = %e, "control-plane schema write failed");
    }
}

/// Schedule a detached drift probe for a table served from the code plane.
pub fn schedule_drift_check(state: AppState, table: String, cached_version: VersionToken) {
    spawn_detached("drift-check", run_drift_check(state, table, cached_version));
}

/// Compare the live introspection token against the cached bundle's.
///
/// A confirmed mismatch purges the code-plane entry and the control-plane
/// schema payload. Introspection failures (and a vanished table, which
/// the next request will 404 on anyway) leave the cached bundle in place:
/// a transient database hiccup must not purge working routers.
pub async fn run_drift_check(
    state: AppState,
    table: String,
    cached_version: VersionToken,
) -> restgate_core::Result<()> {
    match state.db.table_version(&table).await {
        Ok(Some(current)) if current != cached_version => {
            debug!(table = %table, cached = %cached_version, current = %current, "schema drift detected");
            state.code.remove(&table);
            if let Some(control) = &state.control {
                if let Err(e) = control.delete(&schema_key(&table)).await {
                    warn!(table = %table, error = %e, "control-plane schema purge failed");
                }
            }
        }
        Ok(_) => {}
        Err(e) => {
            debug!(table = %table, error = %e, "drift probe introspection failed, keeping bundle");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cache_bypassed_header() {
        let mut headers = HeaderMap::new();
        assert!(!cache_bypassed(&headers));

        headers.insert("x-cache-control", HeaderValue::from_static("no-cache"));
        assert!(cache_bypassed(&headers));

        headers.insert("x-cache-control", HeaderValue::from_static("No-Cache"));
        assert!(cache_bypassed(&headers));

        headers.insert("x-cache-control", HeaderValue::from_static("max-age=0"));
        assert!(!cache_bypassed(&headers));
    }
}

//! List endpoint with data-plane caching and stale-while-revalidate.

use axum::extract::{Path, RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::{debug, warn};

use restgate_core::cache::control::{load_version, store_version};
use restgate_core::cache::{cache_url, query_fingerprint, CachedResponse, DataPlane};
use restgate_core::db::QueryRunner;
use restgate_core::params::{parse_pairs, parse_query};
use restgate_core::sql::synthesize_select;
use restgate_core::tasks::spawn_detached;
use restgate_core::VersionToken;

use crate::bundle::TableBundle;
use crate::dispatch::{cache_bypassed, resolve_bundle};
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/{table}/`
///
/// On a data-plane hit the cached snapshot is returned as-is and a
/// detached revalidation re-runs the query and overwrites the entry. On a
/// miss the query runs inline and the result is written with the
/// configured TTL.
pub async fn list(
    State(state): State<AppState>,
    Path(table): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let bypass = cache_bypassed(&headers);
    let bundle = resolve_bundle(&state, &table, bypass).await?;

    let pairs = parse_pairs(query.as_deref().unwrap_or(""));
    let parsed = parse_query(&bundle.descriptor, &pairs);
    let sql = synthesize_select(&bundle.descriptor, &parsed);

    let data = match (&state.data, bypass) {
        (Some(data), false) => Arc::clone(data),
        _ => {
            let rows = state.db.query_json(&sql).await.map_err(ApiError::from)?;
            return Ok(json_array_response(&serde_json::Value::Array(rows).to_string()));
        }
    };

    let fingerprint = query_fingerprint(&parsed);
    let version = current_version(&state, &table, &bundle).await;
    let url = cache_url(&state.gateway.cache_host, &version, &table, &fingerprint);

    match data.match_url(&url).await {
        Ok(Some(hit)) => {
            debug!(table = %table, url = %url, "data-plane hit, scheduling revalidation");
            schedule_revalidation(&state, data, sql, url);
            return Ok(json_array_response(&hit.body));
        }
        Ok(None) => {}
        Err(e) => warn!(table = %table, error = %e, "data-plane read failed"),
    }

    let rows = state.db.query_json(&sql).await.map_err(ApiError::from)?;
    let body = serde_json::Value::Array(rows).to_string();
    let response = CachedResponse::new(body.clone(), state.gateway.data_cache_ttl_secs);
    if let Err(e) = data.put(&url, response).await {
        warn!(table = %table, error = %e, "data-plane write failed");
    }
    Ok(json_array_response(&body))
}

/// Current per-table version for cache addressing: the control-plane
/// token, initialized to the bundle's build-time token when absent.
async fn current_version(state: &AppState, table: &str, bundle: &TableBundle) -> VersionToken {
    let Some(control) = &state.control else {
        return bundle.version.clone();
    };
    match load_version(control.as_ref(), table).await {
        Ok(Some(token)) => token,
        Ok(None) => {
            if let Err(e) = store_version(control.as_ref(), table, &bundle.version).await {
                warn!(table = %table, error = %e, "version init failed");
            }
            bundle.version.clone()
        }
        Err(e) => {
            warn!(table = %table, error = %e, "version read failed, using bundle token");
            bundle.version.clone()
        }
    }
}

/// Re-run the query in the background and overwrite the cache entry.
fn schedule_revalidation(state: &AppState, data: Arc<dyn DataPlane>, sql: String, url: String) {
    let db = Arc::clone(&state.db);
    let ttl = state.gateway.data_cache_ttl_secs;
    spawn_detached("swr-revalidate", async move {
        let rows = db.query_json(&sql).await?;
        let body = serde_json::Value::Array(rows).to_string();
        data.put(&url, CachedResponse::new(body, ttl)).await
    });
}

fn json_array_response(body: &str) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response()
}

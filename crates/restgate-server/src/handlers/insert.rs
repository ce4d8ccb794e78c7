//! Insert endpoint with upsert support.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use tracing::debug;

use restgate_core::db::QueryRunner;
use restgate_core::params::{parse_insert_params, parse_pairs};
use restgate_core::sql::synthesize_insert;

use super::{bump_version, require_object};
use crate::dispatch::{cache_bypassed, resolve_bundle};
use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/{table}/`
///
/// 201 with the inserted (or conflict-updated) row; 204 when
/// `ON CONFLICT DO NOTHING` skipped it. A returned row is the only
/// evidence a mutation happened, so the version token bumps exactly when
/// the result is non-empty.
pub async fn insert(
    State(state): State<AppState>,
    Path(table): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let bypass = cache_bypassed(&headers);
    let bundle = resolve_bundle(&state, &table, bypass).await?;

    let pairs = parse_pairs(query.as_deref().unwrap_or(""));
    let params = parse_insert_params(&bundle.descriptor, &pairs);

    let object = require_object(body)?;
    bundle.schema.validate_types(&object).map_err(ApiError::from)?;

    let sql = synthesize_insert(&bundle.descriptor, &object, &params)
        .ok_or_else(|| ApiError::validation("Body carries no insertable columns"))?;

    let mut rows = state.db.query_json(&sql).await.map_err(ApiError::from)?;
    if rows.is_empty() {
        debug!(table = %table, "conflict target hit, row skipped");
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    bump_version(&state, &table).await;
    Ok((StatusCode::CREATED, Json(rows.remove(0))).into_response())
}

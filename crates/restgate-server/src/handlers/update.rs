//! Update endpoints: full replace (PUT) and partial update (PATCH), by
//! primary key and in bulk.
//!
//! A full replace requires every non-nullable, non-PK column; missing
//! fields are rejected with 400 before any SQL is issued. The set list
//! always excludes the primary key and unknown keys; when nothing remains
//! the handlers report an empty result without touching the database.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, RawQuery, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use serde_json::{Map, Value};

use restgate_core::db::QueryRunner;
use restgate_core::params::{parse_pairs, parse_update_params, Filter};
use restgate_core::sql::{pk_filter, synthesize_update};

use super::{bulk_response, bump_version, require_object, single_response};
use crate::bundle::TableBundle;
use crate::dispatch::{cache_bypassed, resolve_bundle};
use crate::error::ApiError;
use crate::state::AppState;

/// `PUT /api/{table}/{id}` - full replace of one row.
pub async fn replace_by_id(
    state: State<AppState>,
    Path((table, id)): Path<(String, String)>,
    query: RawQuery,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    update_by_id(state, table, id, query, headers, body, true).await
}

/// `PATCH /api/{table}/{id}` - partial update of one row.
pub async fn patch_by_id(
    state: State<AppState>,
    Path((table, id)): Path<(String, String)>,
    query: RawQuery,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    update_by_id(state, table, id, query, headers, body, false).await
}

/// `PUT /api/{table}/` - bulk replace of filtered rows.
pub async fn replace_bulk(
    state: State<AppState>,
    Path(table): Path<String>,
    query: RawQuery,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    update_bulk(state, table, query, headers, body, true).await
}

/// `PATCH /api/{table}/` - bulk partial update of filtered rows.
pub async fn patch_bulk(
    state: State<AppState>,
    Path(table): Path<String>,
    query: RawQuery,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    update_bulk(state, table, query, headers, body, false).await
}

async fn update_by_id(
    State(state): State<AppState>,
    table: String,
    id: String,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
    full_replace: bool,
) -> Result<Response, ApiError> {
    let bypass = cache_bypassed(&headers);
    let bundle = resolve_bundle(&state, &table, bypass).await?;

    let pairs = parse_pairs(query.as_deref().unwrap_or(""));
    let params = parse_update_params(&bundle.descriptor, &pairs);

    let object = validated_body(&bundle, body, full_replace)?;
    let filters = vec![pk_filter(&bundle.descriptor, &id)];

    let rows = run_update(&state, &bundle, &object, &filters, params.returning.as_deref()).await?;
    if rows.as_ref().is_some_and(|r| !r.is_empty()) {
        bump_version(&state, &table).await;
    }
    single_response(rows, params.returning.is_some())
}

async fn update_bulk(
    State(state): State<AppState>,
    table: String,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
    full_replace: bool,
) -> Result<Response, ApiError> {
    let bypass = cache_bypassed(&headers);
    let bundle = resolve_bundle(&state, &table, bypass).await?;

    let pairs = parse_pairs(query.as_deref().unwrap_or(""));
    let params = parse_update_params(&bundle.descriptor, &pairs);

    let object = validated_body(&bundle, body, full_replace)?;

    let rows = run_update(
        &state,
        &bundle,
        &object,
        &params.filters,
        params.returning.as_deref(),
    )
    .await?
    .unwrap_or_default();
    if !rows.is_empty() {
        bump_version(&state, &table).await;
    }
    Ok(bulk_response(rows, params.returning.is_some()))
}

/// Parse and validate the write body. Full replaces additionally require
/// every non-nullable, non-PK column.
fn validated_body(
    bundle: &TableBundle,
    body: Result<Json<Value>, JsonRejection>,
    full_replace: bool,
) -> Result<Map<String, Value>, ApiError> {
    let object = require_object(body)?;
    if full_replace {
        let missing = bundle.schema.missing_replace_fields(&object);
        if !missing.is_empty() {
            return Err(ApiError::missing_fields(missing));
        }
    }
    bundle.schema.validate_types(&object).map_err(ApiError::from)?;
    Ok(object)
}

/// Execute the synthesized update. `None` means the effective set list
/// was empty and no SQL was issued.
async fn run_update(
    state: &AppState,
    bundle: &TableBundle,
    object: &Map<String, Value>,
    filters: &[Filter],
    returning: Option<&[String]>,
) -> Result<Option<Vec<Value>>, ApiError> {
    let Some(sql) = synthesize_update(&bundle.descriptor, object, filters, returning) else {
        return Ok(None);
    };
    let rows = state.db.query_json(&sql).await.map_err(ApiError::from)?;
    Ok(Some(rows))
}

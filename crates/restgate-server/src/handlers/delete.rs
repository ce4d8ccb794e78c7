//! Delete endpoints: soft or hard, by primary key and in bulk.
//!
//! When the table carries a soft-delete column and `hard_delete` was not
//! requested, the delete stamps that column instead of removing rows.

use axum::extract::{Path, RawQuery, State};
use axum::http::HeaderMap;
use axum::response::Response;

use restgate_core::db::QueryRunner;
use restgate_core::params::{parse_delete_params, parse_pairs, ParsedDelete};
use restgate_core::sql::{pk_filter, synthesize_delete};

use super::{bulk_response, bump_version, single_response};
use crate::dispatch::{cache_bypassed, resolve_bundle};
use crate::error::ApiError;
use crate::state::AppState;

/// `DELETE /api/{table}/{id}`
pub async fn delete_by_id(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let bypass = cache_bypassed(&headers);
    let bundle = resolve_bundle(&state, &table, bypass).await?;

    let pairs = parse_pairs(query.as_deref().unwrap_or(""));
    let mut params = parse_delete_params(&bundle.descriptor, &pairs);
    params.filters = vec![pk_filter(&bundle.descriptor, &id)];

    let sql = synthesize_delete(&bundle.descriptor, &params);
    let rows = state.db.query_json(&sql).await.map_err(ApiError::from)?;
    if !rows.is_empty() {
        bump_version(&state, &table).await;
    }
    single_response(Some(rows), params.returning.is_some())
}

/// `DELETE /api/{table}/`
pub async fn delete_bulk(
    State(state): State<AppState>,
    Path(table): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let bypass = cache_bypassed(&headers);
    let bundle = resolve_bundle(&state, &table, bypass).await?;

    let pairs = parse_pairs(query.as_deref().unwrap_or(""));
    let params: ParsedDelete = parse_delete_params(&bundle.descriptor, &pairs);

    let sql = synthesize_delete(&bundle.descriptor, &params);
    let rows = state.db.query_json(&sql).await.map_err(ApiError::from)?;
    if !rows.is_empty() {
        bump_version(&state, &table).await;
    }
    Ok(bulk_response(rows, params.returning.is_some()))
}

//! Per-verb route handlers, the Router Factory's output.
//!
//! Response-code policy:
//!
//! - list: 200 with a JSON array (may be empty)
//! - insert: 201 with the inserted row; 204 when `ON CONFLICT DO NOTHING`
//!   skipped the row
//! - update/delete with `returning`: 200 and the row/array; without
//!   `returning` or with no matches: 204
//! - `/{id}` update/delete matching no row: 404
//!
//! Every successful mutation replaces the table's control-plane version
//! token before the response is produced, which makes all prior
//! data-plane URLs for the table unreachable.

mod delete;
mod insert;
mod list;
mod update;

pub use delete::{delete_bulk, delete_by_id};
pub use insert::insert;
pub use list::list;
pub use update::{patch_bulk, patch_by_id, replace_bulk, replace_by_id};

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{Map, Value};
use tracing::warn;

use restgate_core::cache::control::{load_version, store_version};
use restgate_core::version::mint_write_token;

use crate::error::ApiError;
use crate::state::AppState;

/// Unwrap a JSON body extraction, shaping rejections as 400s, and require
/// a JSON object.
pub(crate) fn require_object(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Map<String, Value>, ApiError> {
    let Json(value) = body.map_err(|e| ApiError::validation(format!("Invalid body: {e}")))?;
    value
        .as_object()
        .cloned()
        .ok_or_else(|| ApiError::validation("Body must be a JSON object"))
}

/// Replace the table's control-plane version token with a fresh monotonic
/// value. Control-plane failures are logged and swallowed; they never
/// fail the mutation that already committed.
pub(crate) async fn bump_version(state: &AppState, table: &str) {
    let Some(control) = &state.control else {
        return;
    };
    let previous = match load_version(control.as_ref(), table).await {
        Ok(token) => token,
        Err(e) => {
            warn!(table = %table, error = %e, "version read failed before bump");
            None
        }
    };
    let next = mint_write_token(previous.as_ref());
    if let Err(e) = store_version(control.as_ref(), table, &next).await {
        warn!(table = %table, error = %e, "version bump failed");
    }
}

/// Shape a mutation result for a bulk endpoint.
pub(crate) fn bulk_response(rows: Vec<Value>, returning: bool) -> Response {
    if returning && !rows.is_empty() {
        (StatusCode::OK, Json(Value::Array(rows))).into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

/// Shape a mutation result for a `/{id}` endpoint. `None` rows means the
/// statement was never issued (empty effective set list).
pub(crate) fn single_response(
    rows: Option<Vec<Value>>,
    returning: bool,
) -> Result<Response, ApiError> {
    let rows = rows.ok_or(ApiError::RecordNotFound)?;
    let Some(row) = rows.into_iter().next() else {
        return Err(ApiError::RecordNotFound);
    };
    if returning {
        Ok((StatusCode::OK, Json(row)).into_response())
    } else {
        Ok(StatusCode::NO_CONTENT.into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bulk_response_policy() {
        let rows = vec![json!({"id": 1})];
        assert_eq!(bulk_response(rows.clone(), true).status(), StatusCode::OK);
        assert_eq!(
            bulk_response(rows, false).status(),
            StatusCode::NO_CONTENT
        );
        assert_eq!(
            bulk_response(Vec::new(), true).status(),
            StatusCode::NO_CONTENT
        );
    }

    #[test]
    fn test_single_response_policy() {
        let rows = vec![json!({"id": 1})];
        assert_eq!(
            single_response(Some(rows.clone()), true).expect("row").status(),
            StatusCode::OK
        );
        assert_eq!(
            single_response(Some(rows), false).expect("row").status(),
            StatusCode::NO_CONTENT
        );
        assert!(matches!(
            single_response(Some(Vec::new()), true),
            Err(ApiError::RecordNotFound)
        ));
        assert!(matches!(
            single_response(None, false),
            Err(ApiError::RecordNotFound)
        ));
    }
}

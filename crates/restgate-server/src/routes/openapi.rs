//! The self-describing OpenAPI endpoint.
//!
//! The document is cached in the control plane under the global schema
//! digest (SHA-256 over every table's introspection token). A digest
//! match serves the cached document immediately and schedules background
//! regeneration; a mismatch regenerates inline from whole-schema
//! introspection and persists the result under the new digest.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::Value;
use tracing::{debug, warn};

use restgate_core::cache::control::{load_json, store_json, OpenApiPayload, OPENAPI_KEY};
use restgate_core::db::SchemaIntrospector;
use restgate_core::openapi::document;
use restgate_core::tasks::spawn_detached;
use restgate_core::version::schema_digest;
use restgate_core::TableDescriptor;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /openapi.json`
pub async fn openapi_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let origin = request_origin(&headers);

    let versions = state.db.schema_versions().await.map_err(ApiError::from)?;
    let digest = schema_digest(versions.iter().map(|(table, token)| (table.as_str(), token)));

    if let Some(control) = &state.control {
        match load_json::<OpenApiPayload>(control.as_ref(), OPENAPI_KEY).await {
            Ok(Some(payload)) if payload.version == digest => {
                debug!("openapi digest match, serving cached document");
                let background = state.clone();
                let background_origin = origin.clone();
                spawn_detached("openapi-regenerate", async move {
                    regenerate(&background, &digest, &background_origin)
                        .await
                        .map(|_| ())
                });
                return Ok(Json(payload.spec));
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "openapi cache read failed"),
        }
    }

    let spec = regenerate(&state, &digest, &origin)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(spec))
}

/// Introspect the whole schema, assemble the merged document, and persist
/// it under the digest.
async fn regenerate(
    state: &AppState,
    digest: &str,
    origin: &str,
) -> restgate_core::Result<Value> {
    let tables = state.db.schema_columns().await?;
    let descriptors: Vec<TableDescriptor> = tables
        .into_iter()
        .map(|(name, columns)| TableDescriptor::build(name, columns, &state.conventions))
        .collect();
    let spec = document(descriptors.iter(), origin);

    if let Some(control) = &state.control {
        let payload = OpenApiPayload {
            spec:      spec.clone(),
            version:   digest.to_string(),
            cached_at: chrono::Utc::now().timestamp_millis(),
        };
        if let Err(e) = store_json(control.as_ref(), OPENAPI_KEY, &payload).await {
            warn!(error = %e, "openapi cache write failed");
        }
    }

    Ok(spec)
}

/// Derive the request origin for the document's `servers` entry.
fn request_origin(headers: &HeaderMap) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{scheme}://{host}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_request_origin_defaults() {
        assert_eq!(request_origin(&HeaderMap::new()), "http://localhost");
    }

    #[test]
    fn test_request_origin_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::HOST,
            HeaderValue::from_static("api.example.com"),
        );
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert_eq!(request_origin(&headers), "https://api.example.com");
    }
}

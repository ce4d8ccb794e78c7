//! Health check endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tracing::{debug, error};

use restgate_core::cache::DataPlaneMetrics;
use restgate_core::db::QueryRunner;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Server status.
    pub status: String,

    /// Database status.
    pub database: DatabaseStatus,

    /// Data-plane counters, when a data plane is bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<DataPlaneMetrics>,

    /// Server version.
    pub version: String,
}

/// Database status.
#[derive(Debug, Serialize)]
pub struct DatabaseStatus {
    /// Connection status.
    pub connected: bool,

    /// Active connections.
    pub active_connections: u32,

    /// Idle connections.
    pub idle_connections: u32,
}

/// Health check handler.
///
/// # Response Codes
///
/// - 200: Everything healthy
/// - 503: Database connection failed
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");

    let health_result = state.db.health_check().await;
    let db_healthy = health_result.is_ok();
    if let Err(e) = &health_result {
        error!(error = %e, "Database health check failed");
    }

    let metrics = state.db.pool_metrics();
    let response = HealthResponse {
        status: if db_healthy { "healthy" } else { "unhealthy" }.to_string(),
        database: DatabaseStatus {
            connected:          db_healthy,
            active_connections: metrics.active_connections,
            idle_connections:   metrics.idle_connections,
        },
        cache: state.data.as_ref().map(|data| data.metrics()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}

//! HTTP server assembly.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use restgate_core::cache::{ControlPlane, DataPlane, MemoryControlPlane, MemoryDataPlane};
use restgate_core::db::Database;
use restgate_core::GatewayError;

use crate::config::ServerConfig;
use crate::handlers::{
    delete_bulk, delete_by_id, insert, list, patch_bulk, patch_by_id, replace_bulk, replace_by_id,
};
use crate::middleware::{cors_layer, trace_layer};
use crate::routes::{docs_handler, health_handler, openapi_handler};
use crate::state::AppState;

/// Build the application router over a prepared state.
///
/// Exposed separately from [`Server`] so tests can drive the router with
/// mock databases and in-memory planes.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/{table}/",
            get(list)
                .post(insert)
                .put(replace_bulk)
                .patch(patch_bulk)
                .delete(delete_bulk),
        )
        .route(
            "/api/{table}/{id}",
            axum::routing::put(replace_by_id)
                .patch(patch_by_id)
                .delete(delete_by_id),
        )
        .route("/openapi.json", get(openapi_handler))
        .route("/docs", get(docs_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// restgate HTTP server.
pub struct Server {
    config: ServerConfig,
    state:  AppState,
}

impl Server {
    /// Create a server, wiring the cache planes the configuration enables.
    #[must_use]
    pub fn new(config: ServerConfig, db: Arc<dyn Database>) -> Self {
        let control: Option<Arc<dyn ControlPlane>> = config
            .gateway
            .control_plane_enabled
            .then(|| Arc::new(MemoryControlPlane::new()) as Arc<dyn ControlPlane>);
        let data: Option<Arc<dyn DataPlane>> = config
            .gateway
            .data_plane_enabled
            .then(|| Arc::new(MemoryDataPlane::new(config.data_cache_entries)) as Arc<dyn DataPlane>);

        let state = AppState::new(db, control, data, config.gateway.clone());
        Self { config, state }
    }

    /// The shared state, for embedding or inspection.
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    fn build_router(&self) -> Router {
        let mut app = router(self.state.clone());
        if self.config.tracing_enabled {
            app = app.layer(trace_layer());
        }
        if self.config.cors_enabled {
            app = app.layer(cors_layer());
        }
        app
    }

    /// Start the server and listen for requests.
    ///
    /// # Errors
    ///
    /// Returns an error when the listener cannot bind or the server loop
    /// fails.
    pub async fn serve(self) -> restgate_core::Result<()> {
        let app = self.build_router();

        info!(
            bind_addr = %self.config.bind_addr,
            "Starting restgate server"
        );

        let listener = TcpListener::bind(self.config.bind_addr)
            .await
            .map_err(|e| GatewayError::config(format!("Failed to bind: {e}")))?;

        info!("Server listening on http://{}", self.config.bind_addr);

        axum::serve(listener, app)
            .await
            .map_err(|e| GatewayError::internal(format!("Server error: {e}")))?;

        Ok(())
    }
}

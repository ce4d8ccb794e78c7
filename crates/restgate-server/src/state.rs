//! Shared application state.

use std::sync::Arc;

use restgate_core::cache::{CodePlane, ControlPlane, DataPlane};
use restgate_core::db::Database;
use restgate_core::schema::SchemaConventions;
use restgate_core::GatewayConfig;

use crate::bundle::TableBundle;

/// State shared by every handler.
///
/// Cache planes are optional bindings: with `control` and `data` both
/// absent, every request is answered straight from the database and only
/// the performance posture changes.
#[derive(Clone)]
pub struct AppState {
    /// Pooled database surface (execution + introspection).
    pub db: Arc<dyn Database>,

    /// Control plane, when bound.
    pub control: Option<Arc<dyn ControlPlane>>,

    /// Data plane, when bound.
    pub data: Option<Arc<dyn DataPlane>>,

    /// Process-local bundle cache.
    pub code: Arc<CodePlane<TableBundle>>,

    /// Descriptor naming conventions.
    pub conventions: Arc<SchemaConventions>,

    /// Gateway engine configuration.
    pub gateway: Arc<GatewayConfig>,
}

impl AppState {
    /// Assemble state from its parts.
    #[must_use]
    pub fn new(
        db: Arc<dyn Database>,
        control: Option<Arc<dyn ControlPlane>>,
        data: Option<Arc<dyn DataPlane>>,
        gateway: GatewayConfig,
    ) -> Self {
        let conventions = Arc::new(SchemaConventions::from(&gateway));
        Self {
            db,
            control,
            data,
            code: Arc::new(CodePlane::new()),
            conventions,
            gateway: Arc::new(gateway),
        }
    }
}

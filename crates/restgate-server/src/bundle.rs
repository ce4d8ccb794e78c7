//! Compiled per-table handler bundles.

use std::sync::Arc;

use restgate_core::openapi::{route_descriptions, RouteDescription};
use restgate_core::schema::RowSchema;
use restgate_core::{TableDescriptor, VersionToken};

/// Everything the verb handlers need for one table, compiled once per
/// introspection and cached in the code plane.
///
/// Bundles are immutable; drift replaces the whole `Arc` in the code
/// plane, so in-flight requests keep a consistent snapshot.
#[derive(Debug)]
pub struct TableBundle {
    /// The table this bundle serves.
    pub descriptor: Arc<TableDescriptor>,

    /// Write-payload validator derived from the descriptor.
    pub schema: RowSchema,

    /// Introspection token the bundle was built under. Drift probes
    /// compare the catalog against this.
    pub version: VersionToken,

    /// Route definitions feeding the OpenAPI document.
    pub routes: Vec<RouteDescription>,
}

impl TableBundle {
    /// Compile a bundle from a descriptor and its introspection token.
    #[must_use]
    pub fn build(descriptor: Arc<TableDescriptor>, version: VersionToken) -> Self {
        let schema = RowSchema::for_table(&descriptor);
        let routes = route_descriptions(&descriptor);
        Self {
            descriptor,
            schema,
            version,
            routes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restgate_core::schema::{ColumnDescriptor, SchemaConventions, SqlType};

    #[test]
    fn test_build_compiles_routes_and_schema() {
        let descriptor = Arc::new(TableDescriptor::build(
            "users",
            vec![
                ColumnDescriptor::new("id", SqlType::Integer, false),
                ColumnDescriptor::new("name", SqlType::Text, false),
            ],
            &SchemaConventions::default(),
        ));
        let bundle = TableBundle::build(descriptor, VersionToken::new("7"));
        assert_eq!(bundle.routes.len(), 8);
        assert_eq!(bundle.schema.primary_key(), "id");
        assert_eq!(bundle.version, VersionToken::new("7"));
    }
}

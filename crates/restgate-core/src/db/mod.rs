//! Database access: pooled execution and catalog introspection.
//!
//! The gateway never owns connections; it draws them per query from an
//! injected `deadpool-postgres` pool. Two traits split the surface:
//! [`QueryRunner`] executes synthesized statements, [`SchemaIntrospector`]
//! reads catalog metadata. [`PgRunner`] implements both against
//! PostgreSQL; tests substitute mocks.

pub mod introspect;
mod pool;

pub use pool::PgRunner;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::schema::ColumnDescriptor;
use crate::version::VersionToken;

/// Executes synthesized SQL and returns one JSON document per row.
///
/// Every statement the synthesizer produces selects a single
/// `row_to_json(...)` column, so the runner's contract is simply a list
/// of JSON values.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    /// Execute a statement and collect the JSON rows.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Database` on query failure and
    /// `GatewayError::ConnectionPool` when no connection is available.
    async fn query_json(&self, sql: &str) -> Result<Vec<Value>>;

    /// Verify database connectivity with a trivial query.
    async fn health_check(&self) -> Result<()>;

    /// Current connection pool statistics.
    fn pool_metrics(&self) -> PoolMetrics;
}

/// Read-only catalog introspection.
///
/// The introspector reports failures to its caller and never retries;
/// drift probes treat any error as "unknown" and keep their cached state.
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    /// Version token of a table's catalog row. `None` when the table does
    /// not exist in the public schema.
    async fn table_version(&self, table: &str) -> Result<Option<VersionToken>>;

    /// Column descriptors in ordinal order. `None` when the table has no
    /// columns (i.e. does not exist).
    async fn table_columns(&self, table: &str) -> Result<Option<Vec<ColumnDescriptor>>>;

    /// Columns of every table in the public schema, keyed by table name.
    async fn schema_columns(&self) -> Result<BTreeMap<String, Vec<ColumnDescriptor>>>;

    /// Version tokens of every table in the public schema.
    async fn schema_versions(&self) -> Result<BTreeMap<String, VersionToken>>;
}

/// Combined database surface the dispatcher works against.
pub trait Database: QueryRunner + SchemaIntrospector {}

impl<T: QueryRunner + SchemaIntrospector> Database for T {}

/// Connection pool statistics, surfaced by the health endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolMetrics {
    pub total_connections:  u32,
    pub idle_connections:   u32,
    pub active_connections: u32,
    pub waiting_requests:   u32,
}

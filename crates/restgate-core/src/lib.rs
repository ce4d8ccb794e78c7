//! # restgate core
//!
//! Core engine for restgate, an auto-generated REST gateway in front of
//! PostgreSQL. For every table in the configured schema the gateway
//! synthesizes a full CRUD surface at runtime from catalog introspection,
//! plus a self-describing OpenAPI 3 document. No schema files, code
//! generation, or restart is needed when the database changes.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────┐
//!  /api/<table>/  │  Dispatcher  │   (restgate-server)
//!                 └──────┬───────┘
//!                        │ resolve
//!          ┌─────────────┼──────────────────┐
//!          ↓             ↓                  ↓
//!    Code plane    Control plane       Introspector
//!   (handler map)  (versions, KV)    (information_schema)
//!          │             │                  │
//!          └──────┬──────┴────────┬─────────┘
//!                 ↓               ↓
//!          Parameter parser → SQL synthesizer → PostgreSQL
//!                 │
//!                 ↓
//!            Data plane (response snapshots, SWR)
//! ```
//!
//! ### Key modules
//!
//! - **schema**: immutable table descriptors built from introspected columns
//! - **params**: query-string grammar (filters, sort, paging, projection,
//!   upsert and soft-delete parameters)
//! - **sql**: deterministic translation from parsed parameters to SQL
//! - **db**: pooled PostgreSQL execution and catalog introspection
//! - **cache**: the three planes (code, control, data) and the query
//!   fingerprint that keys the data plane
//! - **openapi**: runtime OpenAPI 3 document assembly
//! - **version**: version tokens, write-token minting, schema digests

#![forbid(unsafe_code)]
// Missing docs allowed for internal items - public API is fully documented
#![allow(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::cast_precision_loss)] // Intentional u64 -> f64 for hit rates

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod openapi;
pub mod params;
pub mod schema;
pub mod sql;
pub mod tasks;
pub mod version;

// Re-exports for convenience
pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use schema::{ColumnDescriptor, SqlType, TableDescriptor};
pub use version::VersionToken;

/// Version of the restgate core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! The three cache planes.
//!
//! - **Code plane** ([`code`]): process-local map of compiled per-table
//!   handler bundles, invalidated by drift detection.
//! - **Control plane** ([`control`]): external KV holding authoritative
//!   per-table version tokens, cached column metadata, and the cached
//!   OpenAPI document.
//! - **Data plane** ([`data`]): external response cache keyed by a URL
//!   that embeds table name, version token, and query fingerprint
//!   ([`fingerprint`]), with stale-while-revalidate semantics.
//!
//! Because every data-plane URL embeds the version token current at write
//! time, bumping the token on a mutation makes all prior entries for the
//! table unreachable; they then expire under their TTL.

pub mod code;
pub mod control;
pub mod data;
pub mod fingerprint;

pub use code::CodePlane;
pub use control::{ControlPlane, MemoryControlPlane, OpenApiPayload, SchemaPayload};
pub use data::{CachedResponse, DataPlane, DataPlaneMetrics, MemoryDataPlane};
pub use fingerprint::{cache_url, query_fingerprint};

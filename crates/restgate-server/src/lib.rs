//! # restgate server
//!
//! Axum HTTP surface of the restgate gateway. The dispatcher resolves
//! `/api/{table}/...` requests to a compiled handler bundle (code plane
//! hot path, control plane + introspection on miss), the per-verb
//! handlers synthesize and execute SQL, and the documentation endpoints
//! serve a self-describing OpenAPI document with stale-while-revalidate
//! caching.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::uninlined_format_args)]

pub mod bundle;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use bundle::TableBundle;
pub use config::ServerConfig;
pub use error::ApiError;
pub use server::{router, Server};
pub use state::AppState;

//! Documentation and operational endpoints.

pub mod docs;
pub mod health;
pub mod openapi;

pub use docs::docs_handler;
pub use health::health_handler;
pub use openapi::openapi_handler;

//! CORS middleware.

use tower_http::cors::{Any, CorsLayer};

/// Create CORS layer.
///
/// Allows all origins, methods, and headers; the gateway carries no
/// credentials of its own. Front a restrictive proxy when the deployment
/// needs tighter origins.
#[must_use]
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any)
}

//! API Module
//!
//! HTTP handlers, extractors, authentication middleware and route wiring.

pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;

// Re-export commonly used types
pub use extract::{ValidatedJson, ValidatedQuery};
pub use handlers::AppState;
pub use middleware::{auth_middleware, AuthUser};
pub use routes::{build_app, create_cors_layer, create_routes, RouterBuilder};

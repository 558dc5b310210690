//! API Route Definitions
//!
//! This module defines all HTTP routes and their corresponding handlers using a
//! builder. Route groups can be switched on and off independently, so a
//! deployment can expose only the endpoints it needs.

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use super::{handlers::*, middleware::auth_middleware};
use crate::{
    config::ServerConfig,
    service::JwtService,
    utils::error::{AppError, ErrorResponse},
};

/// Builder for creating API routes with configurable endpoint groups
///
/// Protected groups (profile, heart rate, logout) are wrapped in the
/// bearer token middleware when built.
#[derive(Default, Debug, Clone, Copy)]
pub struct RouterBuilder {
    /// GET /health
    health_check: bool,
    /// POST /register, POST /login, POST /logout
    auth: bool,
    /// GET /me, PUT /me
    profile: bool,
    /// /heart-rate endpoints
    heart_rate: bool,
}

impl RouterBuilder {
    /// Creates a new router builder with all routes disabled by default
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a router builder with all routes enabled
    pub fn with_all_routes() -> Self {
        Self {
            health_check: true,
            auth: true,
            profile: true,
            heart_rate: true,
        }
    }

    /// Creates a router builder with only the health check enabled
    ///
    /// Useful for monitoring-only deployments.
    pub fn with_minimal_routes() -> Self {
        Self {
            health_check: true,
            ..Self::default()
        }
    }

    /// Enables or disables the health check endpoint (GET /health)
    pub fn health_check(mut self, enabled: bool) -> Self {
        self.health_check = enabled;
        self
    }

    /// Enables or disables registration, login and logout
    pub fn auth(mut self, enabled: bool) -> Self {
        self.auth = enabled;
        self
    }

    /// Enables or disables the profile endpoints (GET/PUT /me)
    pub fn profile(mut self, enabled: bool) -> Self {
        self.profile = enabled;
        self
    }

    /// Enables or disables the heart rate endpoints
    pub fn heart_rate(mut self, enabled: bool) -> Self {
        self.heart_rate = enabled;
        self
    }

    /// Paths served by the enabled groups, for startup logging
    pub fn route_table(&self) -> Vec<&'static str> {
        let mut routes = Vec::new();
        if self.health_check {
            routes.push("GET /health");
        }
        if self.auth {
            routes.extend(["POST /register", "POST /login", "POST /logout"]);
        }
        if self.profile {
            routes.extend(["GET /me", "PUT /me"]);
        }
        if self.heart_rate {
            routes.extend([
                "POST /heart-rate",
                "GET /heart-rate",
                "DELETE /heart-rate/{entry_id}",
                "POST /heart-rate/batch-delete",
            ]);
        }
        routes
    }

    /// Builds the router with the enabled groups
    pub fn build(self, jwt_service: Arc<JwtService>) -> Router<AppState> {
        let mut public = Router::new();
        if self.health_check {
            public = public.route("/health", get(health_check));
        }
        if self.auth {
            public = public
                .route("/register", post(register))
                .route("/login", post(login));
        }

        let mut protected = Router::new();
        if self.auth {
            protected = protected.route("/logout", post(logout));
        }
        if self.profile {
            protected = protected.route("/me", get(get_profile).put(update_profile));
        }
        if self.heart_rate {
            protected = protected
                .route(
                    "/heart-rate",
                    post(create_heart_rate).get(list_heart_rates),
                )
                .route("/heart-rate/batch-delete", post(batch_delete_heart_rates))
                .route("/heart-rate/{entry_id}", delete(delete_heart_rate));
        }

        // route_layer panics on a router without routes
        if self.auth || self.profile || self.heart_rate {
            protected = protected.route_layer(from_fn_with_state(jwt_service, auth_middleware));
        }

        public.merge(protected).fallback(not_found)
    }
}

/// Creates all API routes
pub fn create_routes(jwt_service: Arc<JwtService>) -> Router<AppState> {
    RouterBuilder::with_all_routes().build(jwt_service)
}

/// Assemble the complete service: routes, state and cross-cutting layers
pub fn build_app(state: AppState, config: &ServerConfig) -> Router {
    create_routes(state.jwt_service.clone())
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_request_size))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(create_cors_layer(&config.cors_origins))
                .into_inner(),
        )
}

/// CORS for the configured origins
///
/// `*` mirrors the caller's origin so that credentials remain allowed. Any
/// method and header a preflight asks for is allowed the same way.
pub fn create_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(
            allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not Found")))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let reason = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    AppError::Internal(format!("handler panicked: {}", reason)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{self, header, Method},
    };
    use tower::ServiceExt;

    #[test]
    fn test_router_builder_new() {
        let builder = RouterBuilder::new();

        assert!(!builder.health_check);
        assert!(!builder.auth);
        assert!(!builder.profile);
        assert!(!builder.heart_rate);
        assert!(builder.route_table().is_empty());
    }

    #[test]
    fn test_router_builder_with_all_routes() {
        let builder = RouterBuilder::with_all_routes();

        assert!(builder.health_check);
        assert!(builder.auth);
        assert!(builder.profile);
        assert!(builder.heart_rate);
        assert_eq!(builder.route_table().len(), 10);
    }

    #[test]
    fn test_router_builder_individual_methods() {
        let builder = RouterBuilder::with_minimal_routes()
            .heart_rate(true)
            .health_check(false);

        assert_eq!(
            builder.route_table(),
            vec![
                "POST /heart-rate",
                "GET /heart-rate",
                "DELETE /heart-rate/{entry_id}",
                "POST /heart-rate/batch-delete",
            ]
        );
    }

    async fn preflight(origins: &[&str], origin: &str) -> Response {
        let origins: Vec<String> = origins.iter().map(|o| o.to_string()).collect();
        let app = Router::new()
            .route("/heart-rate", get(|| async { "ok" }))
            .layer(create_cors_layer(&origins));

        let request = http::Request::builder()
            .method(Method::OPTIONS)
            .uri("/heart-rate")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-request-id,authorization")
            .body(Body::empty())
            .unwrap();

        app.oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_cors_preflight_mirrors_request() {
        let response = preflight(&["*"], "https://app.example.com").await;
        let headers = response.headers();

        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://app.example.com");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "DELETE");
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "x-request-id,authorization"
        );
    }

    #[tokio::test]
    async fn test_cors_listed_origins() {
        let allowed = ["http://localhost:3000", "https://app.example.com"];

        let response = preflight(&allowed, "http://localhost:3000").await;
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );

        let response = preflight(&allowed, "https://evil.example").await;
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[test]
    fn test_panic_response_is_generic_500() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

//! Authentication Middleware
//!
//! Bearer token authentication for the protected routes.

use crate::models::UserContext;
use crate::service::JwtService;
use crate::utils::error::AppError;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Message for requests without usable credentials
pub const NOT_AUTHENTICATED: &str = "Not authenticated";

/// Extension type for storing authenticated user context in request extensions
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserContext);

/// Authentication middleware that validates JWT tokens and extracts user context
///
/// A missing header or a scheme other than Bearer is rejected with
/// "Not authenticated"; a bad, expired or revoked token with
/// "Invalid or expired token". Both are 401 responses.
pub async fn auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| AppError::Authentication(NOT_AUTHENTICATED.into()))?;

    let user_context = jwt_service.validate_access_token(token).await?;

    request.extensions_mut().insert(AuthUser(user_context));

    Ok(next.run(request).await)
}

/// Pull the credentials out of `Authorization: Bearer <token>`
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MemoryStore, Store};
    use axum::{
        body::{to_bytes, Body},
        http::{self, header::WWW_AUTHENTICATE, HeaderValue, Method, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Extension, Router,
    };
    use chrono::Duration;
    use jsonwebtoken::Algorithm;
    use tower::util::ServiceExt;

    fn create_test_jwt_service() -> Arc<JwtService> {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        Arc::new(JwtService::new(
            store,
            "test_secret".to_string(),
            Algorithm::HS256,
            Duration::minutes(30),
        ))
    }

    async fn whoami(Extension(AuthUser(context)): Extension<AuthUser>) -> String {
        context.user_id.to_string()
    }

    fn app(jwt_service: Arc<JwtService>) -> Router {
        Router::new()
            .route("/test", get(whoami))
            .layer(from_fn_with_state(jwt_service, auth_middleware))
    }

    fn request(authorization: Option<&str>) -> Request {
        let mut builder = http::Request::builder().method(Method::GET).uri("/test");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn detail(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        json["detail"].as_str().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn test_missing_header() {
        let response = app(create_test_jwt_service())
            .oneshot(request(None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");
        assert_eq!(detail(response).await, NOT_AUTHENTICATED);
    }

    #[tokio::test]
    async fn test_wrong_scheme() {
        let response = app(create_test_jwt_service())
            .oneshot(request(Some("Basic dXNlcjpwYXNz")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(detail(response).await, NOT_AUTHENTICATED);
    }

    #[tokio::test]
    async fn test_invalid_token() {
        let response = app(create_test_jwt_service())
            .oneshot(request(Some("Bearer not.a.token")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(detail(response).await, "Invalid or expired token");
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let jwt_service = create_test_jwt_service();
        let token = jwt_service.issue_access_token(17).unwrap().token;

        let response = app(jwt_service)
            .oneshot(request(Some(&format!("bearer {}", token))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"17");
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("BEARER abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_eq!(bearer_token(&headers), None);
    }
}

//! Error Handling Utilities
//!
//! The application-wide error type and its mapping onto HTTP responses.
//! Every error body carries a `detail` string; validation failures also list
//! the offending fields.

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::database::StoreError;

/// Message returned whenever the database cannot be reached
pub const DATABASE_UNAVAILABLE: &str = "Database is currently unavailable. Please try again later.";

/// Message returned for every unexpected server-side failure
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred. Please try again later.";

/// Main application error type that can represent errors from any feature
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Request payload or query failed validation
    #[error("Validation error: {} invalid field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// Semantically invalid request that passed validation
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Authentication and authorization errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Resource not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Conflict errors (e.g., duplicate resources)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Request body exceeded the configured limit
    #[error("Payload too large")]
    PayloadTooLarge,

    /// The backing store could not be reached
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Generic internal server errors
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Password hashing errors
    #[error("Password hashing error: {0}")]
    HashingError(#[from] bcrypt::BcryptError),

    /// Token encoding errors
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// A single field-level validation failure
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Standard error response structure for API endpoints
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl ErrorResponse {
    pub fn new(detail: &str) -> Self {
        Self {
            detail: detail.to_string(),
            errors: None,
        }
    }

    pub fn with_errors(detail: &str, errors: Vec<FieldError>) -> Self {
        Self {
            detail: detail.to_string(),
            errors: Some(errors),
        }
    }
}

impl AppError {
    /// Build a validation error from `validator` output.
    ///
    /// `location` prefixes every field path (`body`, `query`), so a bad
    /// password is reported as `body -> password`.
    pub fn from_validation(errors: &ValidationErrors, location: &str) -> Self {
        let mut fields = Vec::new();
        collect_field_errors(errors, location, &mut fields);
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::Validation(fields)
    }

    /// Build a validation error for a payload that could not be decoded at all
    pub fn malformed(location: &str, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError::new(location, message)])
    }

    /// HTTP status code this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(e) if is_connection_failure(e) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_)
            | AppError::Internal(_)
            | AppError::HashingError(_)
            | AppError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn collect_field_errors(errors: &ValidationErrors, prefix: &str, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let path = format!("{} -> {}", prefix, field);
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", error.code));
                    out.push(FieldError::new(path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_field_errors(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_field_errors(nested, &format!("{} -> {}", path, index), out);
                }
            }
        }
    }
}

/// Whether a sqlx error means the database itself is unreachable
pub fn is_connection_failure(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_)
    )
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(constraint) => {
                AppError::Conflict(format!("Duplicate value violates {}", constraint))
            }
            StoreError::Unavailable(reason) => AppError::ServiceUnavailable(reason),
            StoreError::Database(e) => AppError::Database(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            AppError::Validation(errors) => ErrorResponse::with_errors("Validation error", errors),
            AppError::BadRequest(msg)
            | AppError::Authentication(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => ErrorResponse::new(&msg),
            AppError::PayloadTooLarge => ErrorResponse::new("Request body too large"),
            ref unavailable if status == StatusCode::SERVICE_UNAVAILABLE => {
                log::error!("Database error: {}", unavailable);
                ErrorResponse::new(DATABASE_UNAVAILABLE)
            }
            other => {
                log::error!("Unhandled error: {}", other);
                ErrorResponse::new(UNEXPECTED_ERROR)
            }
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Result type alias for operations that can return AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 3, message = "too short"))]
        name: String,
        #[validate(range(min = 1, max = 10))]
        count: i32,
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_response_creation() {
        let error = ErrorResponse::new("Record not found");
        assert_eq!(error.detail, "Record not found");
        assert!(error.errors.is_none());
    }

    #[test]
    fn test_app_error_display() {
        let error = AppError::NotFound("User not found".to_string());
        assert_eq!(error.to_string(), "Resource not found: User not found");
    }

    #[test]
    fn test_from_validation_prefixes_and_sorts_fields() {
        let sample = Sample {
            name: "ab".to_string(),
            count: 0,
        };
        let errors = sample.validate().unwrap_err();

        match AppError::from_validation(&errors, "body") {
            AppError::Validation(fields) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].field, "body -> count");
                assert_eq!(fields[0].message, "Invalid value (range)");
                assert_eq!(fields[1], FieldError::new("body -> name", "too short"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Validation(vec![]).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Database(sqlx::Error::PoolTimedOut).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(StoreError::Conflict("users_email_key".into())).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn test_validation_response_body() {
        let response = AppError::malformed("body", "expected value").into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let json = body_json(response).await;
        assert_eq!(json["detail"], "Validation error");
        assert_eq!(json["errors"][0]["field"], "body");
        assert_eq!(json["errors"][0]["message"], "expected value");
    }

    #[tokio::test]
    async fn test_authentication_response_sets_challenge_header() {
        let response = AppError::Authentication("Not authenticated".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");

        let json = body_json(response).await;
        assert_eq!(json["detail"], "Not authenticated");
    }

    #[tokio::test]
    async fn test_internal_details_are_not_leaked() {
        let response = AppError::Internal("secret stack trace".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["detail"], UNEXPECTED_ERROR);

        let response = AppError::ServiceUnavailable("connection refused".into()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["detail"], DATABASE_UNAVAILABLE);
    }
}

//! Request and Response Models
//!
//! Data structures for API request and response payloads with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::models::heart_rate::deserialize_timestamp;
use crate::models::user::ProfileChanges;
use crate::utils::validation::{email_validator, password_strength_validator, username_validator};

/// Default page size for heart rate listings
pub const DEFAULT_PAGE_LIMIT: i64 = 500;

/// Largest page size a client may request
pub const MAX_PAGE_LIMIT: i64 = 5000;

/// Largest number of ids accepted by a single batch delete
pub const MAX_BATCH_DELETE: usize = 500;

/// Request payload for creating a new account
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address (must be unique and valid format)
    #[validate(custom(function = "email_validator"))]
    pub email: String,

    /// Password (8-72 characters with upper, lower and digit)
    #[validate(custom(function = "password_strength_validator"))]
    pub password: String,

    /// Optional username; derived from the email when omitted
    #[validate(custom(function = "username_validator"))]
    pub username: Option<String>,
}

/// Request payload for password login
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = "email_validator"))]
    pub email: String,

    #[validate(length(
        min = 1,
        max = 72,
        message = "Password must be between 1 and 72 characters"
    ))]
    pub password: String,
}

/// Request payload for updating profile information
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(custom(function = "username_validator"))]
    pub username: Option<String>,

    #[validate(custom(function = "email_validator"))]
    pub email: Option<String>,

    #[validate(range(min = 1, max = 150, message = "Age must be between 1 and 150"))]
    pub age: Option<i32>,

    #[validate(length(max = 500, message = "Health issues must be at most 500 characters"))]
    pub health_issues: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileChanges {
    fn from(request: UpdateProfileRequest) -> Self {
        ProfileChanges {
            username: request.username,
            email: request.email,
            age: request.age,
            health_issues: request.health_issues,
        }
    }
}

/// Request payload for recording a heart rate sample
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateHeartRateRequest {
    /// Client-generated identifier, used to make retries idempotent.
    /// An empty string counts as absent.
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(min = 1, max = 64, message = "Id must be between 1 and 64 characters"))]
    pub id: Option<String>,

    #[validate(range(min = 30, max = 250, message = "Heart rate must be between 30 and 250 bpm"))]
    pub bpm: i32,

    #[serde(deserialize_with = "deserialize_timestamp")]
    pub recorded_at: DateTime<Utc>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|id| !id.is_empty()))
}

/// Query parameters for listing heart rate samples
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ListHeartRateQuery {
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 5000, message = "Limit must be between 1 and 5000"))]
    pub limit: i64,

    #[serde(default)]
    #[validate(range(min = 0, message = "Offset must not be negative"))]
    pub offset: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

impl Default for ListHeartRateQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

/// Request payload for deleting several samples at once
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BatchDeleteRequest {
    #[validate(length(min = 1, max = 500, message = "Between 1 and 500 ids are required"))]
    pub ids: Vec<String>,
}

/// Response for account creation
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub username: String,
    pub access_token: String,
    pub token_type: String,
}

/// Response for a successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub username: String,
    pub email: String,
    pub age: Option<i32>,
    pub health_issues: Option<String>,
}

/// Plain acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Response for batch deletion
#[derive(Debug, Serialize)]
pub struct BatchDeleteResponse {
    pub deleted: u64,
}

/// Response for health check
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

//! Authentication Models
//!
//! Data structures for bearer-token authentication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token type reported to clients alongside every access token
pub const TOKEN_TYPE: &str = "bearer";

/// JWT claims structure for access tokens
///
/// Contains standard JWT claims; `sub` carries the user id as a decimal string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject - user ID
    pub sub: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// JWT ID - unique token identifier, used for revocation
    pub jti: String,
}

impl AccessTokenClaims {
    /// Create new access token claims
    pub fn new(user_id: i64, expires_at: DateTime<Utc>, issued_at: DateTime<Utc>) -> Self {
        Self {
            sub: user_id.to_string(),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }
}

/// Freshly signed access token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// User context extracted from JWT tokens
///
/// This structure contains user information extracted from validated JWT tokens
/// and is used throughout the application for authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    /// User ID extracted from token subject
    pub user_id: i64,

    /// Token ID for tracking and revocation
    pub token_id: String,

    /// Token expiration time
    pub expires_at: DateTime<Utc>,
}

impl UserContext {
    /// Create user context from access token claims
    pub fn from_access_claims(claims: &AccessTokenClaims) -> Result<Self, std::num::ParseIntError> {
        Ok(Self {
            user_id: claims.sub.parse()?,
            token_id: claims.jti.clone(),
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now),
        })
    }
}

/// Revoked token entry (`revoked_tokens` table)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RevokedToken {
    pub jti: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

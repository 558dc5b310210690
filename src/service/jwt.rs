//! JWT Authentication Service
//!
//! Issues and validates HMAC-signed access tokens and tracks revoked token
//! ids so that logout takes effect before a token expires.

use crate::config::JwtConfig;
use crate::database::{Store, StoreError};
use crate::models::{AccessTokenClaims, IssuedToken, UserContext};
use crate::utils::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use thiserror::Error;

/// Message for every rejected bearer token
pub const INVALID_TOKEN: &str = "Invalid or expired token";

/// Errors raised by the JWT service
#[derive(Error, Debug)]
pub enum JwtError {
    /// Bad signature, wrong algorithm, expired, malformed or revoked
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Signing failed
    #[error("Token generation failed: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),

    /// Expiry would fall outside the representable time range
    #[error("Token lifetime overflows the clock")]
    LifetimeOverflow,

    /// Revocation list could not be read or written
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::InvalidToken(reason) => {
                log::debug!("Rejected bearer token: {}", reason);
                AppError::Authentication(INVALID_TOKEN.to_string())
            }
            JwtError::Encoding(e) => AppError::Token(e),
            overflow @ JwtError::LifetimeOverflow => AppError::Internal(overflow.to_string()),
            JwtError::Store(e) => AppError::from(e),
        }
    }
}

/// Result type for JWT operations
pub type JwtResult<T> = Result<T, JwtError>;

/// JWT authentication service for token management and validation
#[derive(Clone)]
pub struct JwtService {
    /// Revocation list backend
    store: Arc<dyn Store>,
    /// HMAC signing secret
    secret: String,
    /// HMAC variant used to sign and required when validating
    algorithm: Algorithm,
    /// Access token lifetime
    access_token_expires_in: Duration,
}

impl JwtService {
    /// Create a new JWT service instance
    pub fn new(
        store: Arc<dyn Store>,
        secret: String,
        algorithm: Algorithm,
        access_token_expires_in: Duration,
    ) -> Self {
        Self {
            store,
            secret,
            algorithm,
            access_token_expires_in,
        }
    }

    /// Create a JWT service from loaded configuration
    pub fn from_config(store: Arc<dyn Store>, config: &JwtConfig) -> Self {
        Self::new(
            store,
            config.secret.clone(),
            config.algorithm,
            Duration::try_minutes(config.access_token_expire_minutes).unwrap_or(Duration::MAX),
        )
    }

    /// Sign a new access token for a user
    pub fn issue_access_token(&self, user_id: i64) -> JwtResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.access_token_expires_in)
            .ok_or(JwtError::LifetimeOverflow)?;

        let claims = AccessTokenClaims::new(user_id, expires_at, now);
        let token = self.encode_access_token(&claims)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Validate an access token and extract user context
    pub async fn validate_access_token(&self, token: &str) -> JwtResult<UserContext> {
        let claims = self.decode_access_token(token)?;
        let context = UserContext::from_access_claims(&claims)
            .map_err(|_| JwtError::InvalidToken("Invalid user ID in token".into()))?;

        if self.store.is_token_revoked(&context.token_id).await? {
            return Err(JwtError::InvalidToken("Token has been revoked".into()));
        }

        Ok(context)
    }

    /// Reject the token described by `context` from now until it expires
    pub async fn revoke(&self, context: &UserContext) -> JwtResult<()> {
        self.store
            .revoke_token(&context.token_id, context.user_id, context.expires_at)
            .await?;

        log::info!("Revoked token {} for user {}", context.token_id, context.user_id);
        Ok(())
    }

    /// Clean up revocations whose tokens have expired on their own
    pub async fn purge_expired_revocations(&self) -> JwtResult<u64> {
        Ok(self.store.purge_expired_revocations().await?)
    }

    /// Encode an access token with the given claims
    fn encode_access_token(&self, claims: &AccessTokenClaims) -> JwtResult<String> {
        let header = Header::new(self.algorithm);
        let encoding_key = EncodingKey::from_secret(self.secret.as_ref());

        Ok(encode(&header, claims, &encoding_key)?)
    }

    /// Decode and validate an access token
    fn decode_access_token(&self, token: &str) -> JwtResult<AccessTokenClaims> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.leeway = 0;

        let decoding_key = DecodingKey::from_secret(self.secret.as_ref());

        decode::<AccessTokenClaims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    fn create_test_service() -> (JwtService, MemoryStore) {
        let store = MemoryStore::new();
        let service = JwtService::new(
            Arc::new(store.clone()),
            "test_secret_key".to_string(),
            Algorithm::HS256,
            Duration::minutes(30),
        );
        (service, store)
    }

    #[tokio::test]
    async fn test_issue_and_validate() {
        let (service, _) = create_test_service();

        let issued = service.issue_access_token(42).unwrap();
        let context = service.validate_access_token(&issued.token).await.unwrap();

        assert_eq!(context.user_id, 42);
        assert_eq!(context.expires_at.timestamp(), issued.expires_at.timestamp());
    }

    #[tokio::test]
    async fn test_each_token_gets_a_fresh_id() {
        let (service, _) = create_test_service();

        let first = service.issue_access_token(1).unwrap();
        let second = service.issue_access_token(1).unwrap();
        let first = service.validate_access_token(&first.token).await.unwrap();
        let second = service.validate_access_token(&second.token).await.unwrap();

        assert_ne!(first.token_id, second.token_id);
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let (service, store) = create_test_service();
        let expired = JwtService::new(
            Arc::new(store),
            "test_secret_key".to_string(),
            Algorithm::HS256,
            Duration::minutes(-5),
        );

        let issued = expired.issue_access_token(1).unwrap();
        let result = service.validate_access_token(&issued.token).await;
        assert!(matches!(result, Err(JwtError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_wrong_secret_or_algorithm_rejected() {
        let (service, store) = create_test_service();

        let other_secret = JwtService::new(
            Arc::new(store.clone()),
            "another_secret".to_string(),
            Algorithm::HS256,
            Duration::minutes(30),
        );
        let token = other_secret.issue_access_token(1).unwrap().token;
        assert!(service.validate_access_token(&token).await.is_err());

        let other_algorithm = JwtService::new(
            Arc::new(store),
            "test_secret_key".to_string(),
            Algorithm::HS512,
            Duration::minutes(30),
        );
        let token = other_algorithm.issue_access_token(1).unwrap().token;
        assert!(service.validate_access_token(&token).await.is_err());

        assert!(service.validate_access_token("garbage").await.is_err());
    }

    #[tokio::test]
    async fn test_revoked_token_rejected() {
        let (service, store) = create_test_service();

        let issued = service.issue_access_token(7).unwrap();
        let context = service.validate_access_token(&issued.token).await.unwrap();
        service.revoke(&context).await.unwrap();

        let result = service.validate_access_token(&issued.token).await;
        assert!(matches!(result, Err(JwtError::InvalidToken(_))));
        assert!(store.is_token_revoked(&context.token_id).await.unwrap());

        // Still live, so nothing to purge
        assert_eq!(service.purge_expired_revocations().await.unwrap(), 0);
    }

    #[test]
    fn test_oversized_lifetime_is_an_error() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let config = JwtConfig {
            secret: "test_secret_key".to_string(),
            algorithm: Algorithm::HS256,
            access_token_expire_minutes: i64::MAX,
        };
        let service = JwtService::from_config(store.clone(), &config);
        assert!(matches!(
            service.issue_access_token(1),
            Err(JwtError::LifetimeOverflow)
        ));

        let far = JwtService::new(
            store,
            "test_secret_key".to_string(),
            Algorithm::HS256,
            Duration::minutes(1_000_000_000_000),
        );
        let err: AppError = far.issue_access_token(1).unwrap_err().into();
        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_invalid_token_maps_to_401() {
        let err: AppError = JwtError::InvalidToken("bad signature".into()).into();
        match err {
            AppError::Authentication(msg) => assert_eq!(msg, INVALID_TOKEN),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}

//! Storage Port
//!
//! The persistence interface the services depend on. `PgStore` backs it
//! with PostgreSQL in production; `MemoryStore` keeps everything in process
//! for tests and local experiments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{HeartRateRecord, NewHeartRate, NewUser, ProfileChanges, User};

/// Unique constraint on `users.email`
pub const USERS_EMAIL_KEY: &str = "users_email_key";

/// Unique constraint on `users.username`
pub const USERS_USERNAME_KEY: &str = "users_username_key";

/// Primary key of `heart_rate_records`
pub const HEART_RATE_RECORDS_PKEY: &str = "heart_rate_records_pkey";

/// Storage-level errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique constraint rejected the write; carries the constraint name
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    /// The backend could not be reached
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Any other database failure
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Conflict(db_err.constraint().unwrap_or("unique").to_string());
            }
        }

        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => StoreError::Unavailable(err.to_string()),
            other => StoreError::Database(other),
        }
    }
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence port for accounts, heart rate samples and revoked tokens
#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap round trip used by health checks
    async fn ping(&self) -> StoreResult<()>;

    // Accounts

    /// Insert a new account; `Conflict` when the email or username is taken
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    /// Exact match on the normalized email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Apply a partial update; `None` when the account does not exist
    async fn update_user(&self, id: i64, changes: &ProfileChanges) -> StoreResult<Option<User>>;

    // Heart rate samples

    /// Insert a sample; `Conflict` when the id already exists for any user
    async fn insert_heart_rate(&self, record: NewHeartRate) -> StoreResult<HeartRateRecord>;

    /// Fetch one sample, scoped to its owner
    async fn find_heart_rate(&self, user_id: i64, id: &str) -> StoreResult<Option<HeartRateRecord>>;

    /// Page through a user's samples, newest `recorded_at` first
    async fn list_heart_rates(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<HeartRateRecord>>;

    /// Delete one sample owned by the user; true when a row was removed
    async fn delete_heart_rate(&self, user_id: i64, id: &str) -> StoreResult<bool>;

    /// Delete every listed sample owned by the user; returns the count removed
    async fn delete_heart_rates(&self, user_id: i64, ids: &[String]) -> StoreResult<u64>;

    // Token revocation

    /// Record a revoked token until it would have expired anyway (idempotent)
    async fn revoke_token(
        &self,
        jti: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    async fn is_token_revoked(&self, jti: &str) -> StoreResult<bool>;

    /// Drop revocations whose tokens have expired
    async fn purge_expired_revocations(&self) -> StoreResult<u64>;
}

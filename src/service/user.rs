//! User Service Implementation
//!
//! Account registration, password login, profile management and logout.

use std::sync::Arc;
use thiserror::Error;

use crate::database::{Store, StoreError};
use crate::models::{
    requests::*,
    user::{NewUser, ProfileChanges, User, UserProfile},
    UserContext, TOKEN_TYPE,
};
use crate::service::jwt::{JwtError, JwtService};
use crate::utils::{
    error::AppError,
    security::{hash_password_with_cost, verify_password, DEFAULT_BCRYPT_COST},
    validation::{normalize_email, username_from_email},
};

/// Custom error types for the user service
#[derive(Error, Debug)]
pub enum UserServiceError {
    /// User with the specified identifier was not found
    #[error("User not found")]
    UserNotFound,

    /// Registration collided with an existing email or username
    #[error("Email or username already registered")]
    AlreadyRegistered,

    /// Profile update collided with another account's email or username
    #[error("Email or username already taken")]
    AlreadyTaken,

    /// Unknown email or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Storage operation failed
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Password hashing operation failed
    #[error("Password hashing error: {0}")]
    HashingError(#[from] bcrypt::BcryptError),

    /// Token issuing or revocation failed
    #[error("Token error: {0}")]
    Token(#[from] JwtError),

    /// Unexpected internal server error
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl From<UserServiceError> for AppError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::UserNotFound => AppError::NotFound("User not found".to_string()),
            UserServiceError::AlreadyRegistered => {
                AppError::Conflict("Email or username already registered".to_string())
            }
            UserServiceError::AlreadyTaken => {
                AppError::BadRequest("Email or username already taken".to_string())
            }
            UserServiceError::InvalidCredentials => {
                AppError::Authentication("Invalid email or password".to_string())
            }
            UserServiceError::Store(e) => AppError::from(e),
            UserServiceError::HashingError(e) => AppError::HashingError(e),
            UserServiceError::Token(e) => AppError::from(e),
            UserServiceError::InternalError(msg) => AppError::Internal(msg),
        }
    }
}

/// Result type for user service operations
pub type UserServiceResult<T> = Result<T, UserServiceError>;

/// Core user service providing account operations and business logic
#[derive(Clone)]
pub struct UserService {
    /// Persistence backend
    store: Arc<dyn Store>,

    /// Token issuing and revocation
    jwt_service: Arc<JwtService>,

    /// bcrypt cost factor for password hashing (higher = more secure but slower)
    bcrypt_cost: u32,
}

impl UserService {
    /// Creates a new UserService with the default bcrypt cost
    pub fn new(store: Arc<dyn Store>, jwt_service: Arc<JwtService>) -> Self {
        Self {
            store,
            jwt_service,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    /// Creates a new UserService with custom bcrypt cost (useful for testing)
    pub fn with_bcrypt_cost(
        store: Arc<dyn Store>,
        jwt_service: Arc<JwtService>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            store,
            jwt_service,
            bcrypt_cost,
        }
    }

    /// Create an account and sign the caller in
    pub async fn register(&self, request: RegisterRequest) -> UserServiceResult<RegisterResponse> {
        let email = normalize_email(&request.email);
        let username = request
            .username
            .unwrap_or_else(|| username_from_email(&email));

        let hashed_password = self.hash_password(request.password).await?;

        let new_user = NewUser {
            username,
            email,
            hashed_password,
        };

        let user = match self.store.insert_user(new_user).await {
            Ok(user) => user,
            Err(StoreError::Conflict(constraint)) => {
                log::info!("Registration rejected by {}", constraint);
                return Err(UserServiceError::AlreadyRegistered);
            }
            Err(e) => return Err(e.into()),
        };

        let issued = self.jwt_service.issue_access_token(user.id)?;
        log::info!("Registered user {} ({})", user.id, user.username);

        Ok(RegisterResponse {
            message: "User registered".to_string(),
            username: user.username,
            access_token: issued.token,
            token_type: TOKEN_TYPE.to_string(),
        })
    }

    /// Verify credentials and issue a fresh access token
    pub async fn login(&self, request: LoginRequest) -> UserServiceResult<LoginResponse> {
        let email = normalize_email(&request.email);

        let Some(user) = self.store.find_user_by_email(&email).await? else {
            log::warn!("Login failed: unknown email");
            return Err(UserServiceError::InvalidCredentials);
        };

        if !self
            .check_password(request.password, user.hashed_password.clone())
            .await?
        {
            log::warn!("Login failed: wrong password for user {}", user.id);
            return Err(UserServiceError::InvalidCredentials);
        }

        let issued = self.jwt_service.issue_access_token(user.id)?;
        log::info!("User {} logged in", user.id);

        Ok(LoginResponse {
            access_token: issued.token,
            token_type: TOKEN_TYPE.to_string(),
            username: user.username,
            email: user.email,
            age: user.age,
            health_issues: user.health_issues,
        })
    }

    /// Retrieves the profile of an account
    pub async fn get_profile(&self, user_id: i64) -> UserServiceResult<UserProfile> {
        self.get_user(user_id).await.map(UserProfile::from)
    }

    /// Apply a partial profile update; absent fields keep their values
    pub async fn update_profile(
        &self,
        user_id: i64,
        request: UpdateProfileRequest,
    ) -> UserServiceResult<UserProfile> {
        let mut changes = ProfileChanges::from(request);
        changes.email = changes.email.as_deref().map(normalize_email);

        if changes.is_empty() {
            return self.get_profile(user_id).await;
        }

        match self.store.update_user(user_id, &changes).await {
            Ok(Some(user)) => {
                log::info!("Updated profile of user {}", user_id);
                Ok(user.into())
            }
            Ok(None) => Err(UserServiceError::UserNotFound),
            Err(StoreError::Conflict(constraint)) => {
                log::info!("Profile update of user {} rejected by {}", user_id, constraint);
                Err(UserServiceError::AlreadyTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Revoke the token the caller authenticated with
    pub async fn logout(&self, context: &UserContext) -> UserServiceResult<MessageResponse> {
        self.jwt_service.revoke(context).await?;
        Ok(MessageResponse::new("Logged out successfully"))
    }

    /// Health check - verifies the backing store is reachable
    pub async fn health_check(&self) -> UserServiceResult<()> {
        self.store.ping().await?;
        Ok(())
    }

    async fn get_user(&self, user_id: i64) -> UserServiceResult<User> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or(UserServiceError::UserNotFound)
    }

    /// bcrypt is CPU bound; keep it off the async workers
    async fn hash_password(&self, password: String) -> UserServiceResult<String> {
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || hash_password_with_cost(&password, cost))
            .await
            .map_err(|e| UserServiceError::InternalError(format!("hashing task failed: {}", e)))?
            .map_err(UserServiceError::from)
    }

    async fn check_password(&self, password: String, hash: String) -> UserServiceResult<bool> {
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| UserServiceError::InternalError(format!("verify task failed: {}", e)))?
            .map_err(UserServiceError::from)
    }
}

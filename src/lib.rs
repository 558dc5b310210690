//! Heart Rate Service Library
//!
//! An HTTP API for recording heart rate measurements. Users register with an
//! email and password, authenticate with bearer tokens, keep a small health
//! profile, and store, page through and delete their own samples.
//!
//! # Features
//!
//! - **Accounts**: registration, password login, profile read and update
//! - **Tokens**: HMAC-signed JWT access tokens with server-side revocation on logout
//! - **Heart rate samples**: idempotent creation with client ids, paged listing,
//!   single and batch deletion, all scoped to the owner
//! - **Storage**: PostgreSQL through SQLx, behind a `Store` port with an
//!   in-memory adapter for tests
//! - **Flexible Router**: route groups enabled via `RouterBuilder`
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use heart_rate_service::{
//!     api::{build_app, AppState},
//!     config::AppConfig,
//!     database::{PgStore, Store},
//!     service::{HeartRateService, JwtService, UserService},
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     let pool = config.database.create_pool().await?;
//!     let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
//!
//!     let jwt_service = Arc::new(JwtService::from_config(store.clone(), &config.jwt));
//!     let state = AppState {
//!         user_service: Arc::new(UserService::new(store.clone(), jwt_service.clone())),
//!         heart_rate_service: Arc::new(HeartRateService::new(store)),
//!         jwt_service,
//!     };
//!
//!     let listener = tokio::net::TcpListener::bind(config.server.bind_address()).await?;
//!     axum::serve(listener, build_app(state, &config.server)).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **API Layer**: handlers, validating extractors, auth middleware, routing
//! - **Service Layer**: account, token and heart rate business logic
//! - **Models**: data structures and request/response types
//! - **Database**: pool setup, migrations and the storage adapters
//! - **Utils**: error mapping, password hashing and input validation

/// HTTP API layer with handlers and configurable routing
pub mod api;

/// Configuration loaded from the environment
pub mod config;

/// Database connection management and storage adapters
pub mod database;

/// Data models and request/response structures
pub mod models;

/// Business logic for accounts, tokens and heart rate samples
pub mod service;

/// Shared utilities for security, validation, and error handling
pub mod utils;

// Re-export commonly used types for convenient access
pub use api::{build_app, create_routes, AppState, RouterBuilder};
pub use config::{AppConfig, ConfigError, JwtConfig, SecurityConfig, ServerConfig};
pub use database::{DatabaseConfig, MemoryStore, PgStore, Store, StoreError};
pub use models::{HeartRateRecord, HeartRateResponse, User, UserContext, UserProfile};
pub use service::{HeartRateService, JwtService, UserService};
pub use utils::error::{AppError, AppResult, ErrorResponse};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

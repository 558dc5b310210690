//! Configuration Module
//!
//! Centralized, environment-driven configuration for the server, database,
//! token signing and password hashing.

use jsonwebtoken::Algorithm;
use thiserror::Error;

pub use crate::database::DatabaseConfig;
use crate::utils::security::{DEFAULT_BCRYPT_COST, MAX_BCRYPT_COST, MIN_BCRYPT_COST};

/// Configuration loading and validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set in the environment or .env")]
    Missing(String),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigError {
    pub fn invalid(key: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Environment variable helpers
pub mod env {
    use super::ConfigError;
    use std::env;
    use std::str::FromStr;

    /// Get environment variable as string with default
    pub fn get_string(key: &str, default: &str) -> String {
        env::var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get environment variable parsed as `T`, falling back to a default when unset.
    ///
    /// A value that is set but does not parse is an error rather than silently
    /// replaced by the default.
    pub fn get_parsed<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
        match env::var(key) {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid(key, format!("cannot parse {:?}", raw))),
            Err(_) => Ok(default),
        }
    }

    /// Check if environment variable is set
    pub fn is_set(key: &str) -> bool {
        env::var(key).is_ok()
    }

    /// Get required, non-empty environment variable
    pub fn get_required(key: &str) -> Result<String, ConfigError> {
        match env::var(key) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::Missing(key.to_string())),
        }
    }

    /// Get required environment variable parsed as `T`
    pub fn get_required_parsed<T: FromStr>(key: &str) -> Result<T, ConfigError> {
        let raw = get_required(key)?;
        raw.trim()
            .parse()
            .map_err(|_| ConfigError::invalid(key, format!("cannot parse {:?}", raw)))
    }
}

/// Application configuration combining all service configurations
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Password hashing and token housekeeping
    pub security: SecurityConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub cors_origins: Vec<String>,
    pub max_request_size: usize,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub access_token_expire_minutes: i64,
}

/// Password hashing and revocation cleanup settings
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub bcrypt_cost: u32,
    pub revocation_cleanup_minutes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            log_level: "info".to_string(),
            cors_origins: vec!["*".to_string()],
            max_request_size: 1024 * 1024, // 1MB
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            revocation_cleanup_minutes: 60,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            host: env::get_string("SERVER_HOST", &defaults.host),
            port: env::get_parsed("SERVER_PORT", defaults.port)?,
            log_level: env::get_string("LOG_LEVEL", &defaults.log_level),
            cors_origins: parse_origins(&env::get_string("CORS_ORIGINS", "*")),
            max_request_size: env::get_parsed("MAX_REQUEST_SIZE", defaults.max_request_size)?,
        })
    }

    /// Address the listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Longest accepted access token lifetime (one year)
pub const MAX_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 365 * 24 * 60;

impl JwtConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = env::get_required("SECRET_KEY")?;
        let algorithm = parse_algorithm(&env::get_required("ALGORITHM")?)?;
        let access_token_expire_minutes: i64 =
            env::get_required_parsed("ACCESS_TOKEN_EXPIRE_MINUTES")?;

        let config = Self {
            secret,
            algorithm,
            access_token_expire_minutes,
        };
        config.validate()?;
        Ok(config)
    }

    /// Token lifetime must be positive and no longer than a year
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_ACCESS_TOKEN_EXPIRE_MINUTES).contains(&self.access_token_expire_minutes) {
            return Err(ConfigError::invalid(
                "ACCESS_TOKEN_EXPIRE_MINUTES",
                format!(
                    "must be a positive integer no greater than {}",
                    MAX_ACCESS_TOKEN_EXPIRE_MINUTES
                ),
            ));
        }
        Ok(())
    }
}

impl SecurityConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            bcrypt_cost: env::get_parsed("BCRYPT_COST", defaults.bcrypt_cost)?,
            revocation_cleanup_minutes: env::get_parsed(
                "REVOCATION_CLEANUP_MINUTES",
                defaults.revocation_cleanup_minutes,
            )?,
        })
    }
}

/// Parse a signing algorithm name. Only HMAC algorithms work with a shared secret.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    match name.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(ConfigError::invalid(
            "ALGORITHM",
            format!("unsupported algorithm {:?}; expected HS256, HS384 or HS512", other),
        )),
    }
}

/// Split a comma separated origin list, dropping blanks
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl AppConfig {
    /// Load complete application configuration from environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            security: SecurityConfig::from_env()?,
        })
    }

    /// Validate the complete configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::invalid("SERVER_PORT", "must be greater than 0"));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::invalid(
                "DB_MAX_CONNECTIONS",
                "must be greater than 0",
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::invalid(
                "DB_MIN_CONNECTIONS",
                "cannot be greater than DB_MAX_CONNECTIONS",
            ));
        }

        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::invalid(
                "BCRYPT_COST",
                format!("must be between {} and {}", MIN_BCRYPT_COST, MAX_BCRYPT_COST),
            ));
        }

        self.jwt.validate()?;

        if self.security.revocation_cleanup_minutes == 0 {
            return Err(ConfigError::invalid(
                "REVOCATION_CLEANUP_MINUTES",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

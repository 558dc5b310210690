//! Service Layer
//!
//! Business logic for accounts, tokens and heart rate samples.

pub mod heart_rate;
pub mod jwt;
pub mod user;

// Re-export services
pub use heart_rate::HeartRateService;
pub use jwt::JwtService;
pub use user::UserService;

//! Data Models Module
//!
//! This module contains all data structures used throughout the heart rate
//! service: accounts, heart rate samples, token claims, and request/response
//! types with their validation rules.

pub mod auth;
pub mod heart_rate;
pub mod requests;
pub mod user;

// Re-export commonly used types
pub use auth::*;
pub use heart_rate::{HeartRateRecord, HeartRateResponse, NewHeartRate};
pub use requests::*;
pub use user::*;

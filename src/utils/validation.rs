//! Validation Utilities
//!
//! Input validation functions for account data and API requests.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;
use validator::ValidationError;

/// Minimum accepted password length, in characters
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Maximum accepted password length, in characters (bcrypt input limit)
pub const PASSWORD_MAX_LENGTH: usize = 72;

/// Validates email address format using a comprehensive regex pattern
pub fn validate_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    regex.is_match(email.trim())
}

/// Normalizes email address to lowercase and removes whitespace
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates a username: 3-30 letters, digits, hyphens or underscores
pub fn validate_username(username: &str) -> bool {
    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9_-]{3,30}$").expect("Failed to compile username regex")
    });

    regex.is_match(username)
}

/// Checks password strength, returning the first rule the password breaks
pub fn check_password_strength(password: &str) -> Result<(), &'static str> {
    let length = password.chars().count();

    if length < PASSWORD_MIN_LENGTH {
        return Err(messages::PASSWORD_TOO_SHORT);
    }
    if length > PASSWORD_MAX_LENGTH {
        return Err(messages::PASSWORD_TOO_LONG);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(messages::PASSWORD_NO_UPPERCASE);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(messages::PASSWORD_NO_LOWERCASE);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(messages::PASSWORD_NO_DIGIT);
    }

    Ok(())
}

/// Derives a username from the local part of an email address
pub fn username_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or_default().to_string()
}

fn validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Custom validator for email fields using the validator crate
pub fn email_validator(email: &str) -> Result<(), ValidationError> {
    if validate_email(email) {
        Ok(())
    } else {
        Err(validation_error("invalid_email", messages::INVALID_EMAIL))
    }
}

/// Custom validator for username fields using the validator crate
pub fn username_validator(username: &str) -> Result<(), ValidationError> {
    if validate_username(username) {
        Ok(())
    } else {
        Err(validation_error("invalid_username", messages::INVALID_USERNAME))
    }
}

/// Custom validator for new passwords using the validator crate
pub fn password_strength_validator(password: &str) -> Result<(), ValidationError> {
    check_password_strength(password).map_err(|message| validation_error("weak_password", message))
}

/// Validation error messages for user-friendly responses
pub mod messages {
    pub const INVALID_EMAIL: &str = "value is not a valid email address";
    pub const INVALID_USERNAME: &str =
        "Username must be 3-30 characters and contain only letters, digits, hyphens, or underscores";
    pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters";
    pub const PASSWORD_TOO_LONG: &str = "Password must be at most 72 characters";
    pub const PASSWORD_NO_UPPERCASE: &str = "Password must contain at least one uppercase letter";
    pub const PASSWORD_NO_LOWERCASE: &str = "Password must contain at least one lowercase letter";
    pub const PASSWORD_NO_DIGIT: &str = "Password must contain at least one digit";
}

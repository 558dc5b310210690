//! User Model
//!
//! Core account data structures and type definitions.

use serde::{Deserialize, Serialize};

/// Stored account, including the password hash
///
/// Never serialized into API responses; handlers convert to [`UserProfile`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique identifier for the user
    pub id: i64,

    /// Public handle (unique)
    pub username: String,

    /// Email address (unique, normalized)
    pub email: String,

    /// bcrypt hashed password
    pub hashed_password: String,

    /// Optional age in years
    pub age: Option<i32>,

    /// Free-text description of known health issues
    pub health_issues: Option<String>,
}

/// Profile as exposed by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    pub age: Option<i32>,
    pub health_issues: Option<String>,
}

impl From<User> for UserProfile {
    /// Strips the id and password hash so neither leaves the service
    fn from(user: User) -> Self {
        UserProfile {
            username: user.username,
            email: user.email,
            age: user.age,
            health_issues: user.health_issues,
        }
    }
}

/// Account about to be inserted
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub hashed_password: String,
}

/// Partial profile update; `None` fields keep their stored value
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub age: Option<i32>,
    pub health_issues: Option<String>,
}

impl ProfileChanges {
    /// True when the update would not touch any column
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.age.is_none()
            && self.health_issues.is_none()
    }

    /// Apply the present fields to an in-memory user
    pub fn apply_to(&self, user: &mut User) {
        if let Some(username) = &self.username {
            user.username = username.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(age) = self.age {
            user.age = Some(age);
        }
        if let Some(health_issues) = &self.health_issues {
            user.health_issues = Some(health_issues.clone());
        }
    }
}

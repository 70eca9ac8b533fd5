//! Domain service for authentication.
//!
//! Handles registration, login, bearer-token resolution, password changes
//! and logout.

use serde::Serialize;
use thiserror::Error;

use crate::db::User;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password. The two are never distinguished.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authorization token required")]
    MissingToken,

    /// Token never issued, replaced by a newer login, or logged out.
    #[error("Invalid token")]
    InvalidToken,

    #[error("Session expired")]
    SessionExpired,

    #[error("Invalid old password")]
    IncorrectPassword,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Public projection of a user. Never carries the password hash or token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    pub id: i32,
    pub username: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    #[serde(rename = "needsPasswordReset")]
    pub needs_password_reset: bool,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            is_admin: user.is_admin,
            needs_password_reset: user.needs_password_reset,
        }
    }
}

/// Login result containing the new session token and the user projection.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub user: UserInfo,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a regular (non-admin) account. Does not log the user in.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UsernameTaken`] if the username exists.
    async fn register(&self, username: &str, password: &str) -> Result<UserInfo, AuthError>;

    /// Verifies credentials and rotates the user's session token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown user or a
    /// wrong password alike.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Resolves a presented bearer token to the user holding it.
    async fn authenticate(&self, token: &str) -> Result<UserInfo, AuthError>;

    /// Changes a user's password after checking the old one.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::IncorrectPassword`] if `old_password` does not match,
    /// leaving the stored hash untouched.
    async fn change_password(
        &self,
        user_id: i32,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    /// Drops the user's live session token.
    async fn logout(&self, user_id: i32) -> Result<(), AuthError>;
}

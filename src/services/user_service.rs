//! Domain service for administrator-only user management.

use thiserror::Error;

use crate::services::auth_service::UserInfo;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User {0} not found")]
    NotFound(i32),

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Administrators cannot delete their own account")]
    CannotDeleteSelf,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Operations reachable only through the administrator gate. None of them
/// re-check the caller's privileges.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn list_users(&self) -> Result<Vec<UserInfo>, UserError>;

    async fn create_user(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<UserInfo, UserError>;

    /// Deletes `target_id` together with its tokens and addresses.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::CannotDeleteSelf`] when `actor_id == target_id`.
    async fn delete_user(&self, actor_id: i32, target_id: i32) -> Result<(), UserError>;

    /// Sets a new password without the old one, flags the account for a
    /// forced reset and ends its live session.
    async fn reset_password(&self, target_id: i32, new_password: &str) -> Result<(), UserError>;
}

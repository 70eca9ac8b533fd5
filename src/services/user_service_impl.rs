//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::Store;
use crate::security::PasswordHasher;
use crate::services::auth_service::UserInfo;
use crate::services::user_service::{UserError, UserService};
use crate::services::validation::{require_non_empty, validate_new_password, validate_username};

pub struct SeaOrmUserService {
    store: Store,
    hasher: PasswordHasher,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn list_users(&self) -> Result<Vec<UserInfo>, UserError> {
        let users = self.store.list_users().await?;
        Ok(users.into_iter().map(UserInfo::from).collect())
    }

    async fn create_user(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<UserInfo, UserError> {
        validate_username(username).map_err(UserError::Validation)?;
        require_non_empty("Password", password).map_err(UserError::Validation)?;

        let password_hash = self.hasher.hash(password).await?;

        let user = self
            .store
            .create_user(username, &password_hash, is_admin)
            .await?
            .ok_or(UserError::UsernameTaken)?;

        info!(
            user_id = user.id,
            is_admin, "User created by administrator: {}", user.username
        );
        Ok(UserInfo::from(user))
    }

    async fn delete_user(&self, actor_id: i32, target_id: i32) -> Result<(), UserError> {
        if actor_id == target_id {
            return Err(UserError::CannotDeleteSelf);
        }

        if !self.store.delete_user(target_id).await? {
            return Err(UserError::NotFound(target_id));
        }

        info!(actor_id, target_id, "User deleted");
        Ok(())
    }

    async fn reset_password(&self, target_id: i32, new_password: &str) -> Result<(), UserError> {
        validate_new_password(new_password).map_err(UserError::Validation)?;

        if self.store.get_user(target_id).await?.is_none() {
            return Err(UserError::NotFound(target_id));
        }

        let new_hash = self.hasher.hash(new_password).await?;
        if !self
            .store
            .update_user_password(target_id, &new_hash, true, true)
            .await?
        {
            return Err(UserError::NotFound(target_id));
        }

        info!(target_id, "Password reset by administrator");
        Ok(())
    }
}

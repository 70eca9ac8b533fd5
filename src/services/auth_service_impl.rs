//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::db::Store;
use crate::security::{PasswordHasher, SessionIssuer, session};
use crate::services::auth_service::{AuthError, AuthService, LoginResult, UserInfo};
use crate::services::validation::{require_non_empty, validate_new_password, validate_username};

pub struct SeaOrmAuthService {
    store: Store,
    hasher: PasswordHasher,
    sessions: SessionIssuer,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, hasher: PasswordHasher, sessions: SessionIssuer) -> Self {
        Self {
            store,
            hasher,
            sessions,
        }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, username: &str, password: &str) -> Result<UserInfo, AuthError> {
        validate_username(username).map_err(AuthError::Validation)?;
        require_non_empty("Password", password).map_err(AuthError::Validation)?;

        let password_hash = self.hasher.hash(password).await?;

        let user = self
            .store
            .create_user(username, &password_hash, false)
            .await?
            .ok_or(AuthError::UsernameTaken)?;

        info!(user_id = user.id, "User registered: {}", user.username);
        Ok(UserInfo::from(user))
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let Some((user, password_hash)) = self.store.get_user_with_password(username).await?
        else {
            // Same cost as a real verification so response time does not
            // reveal whether the username exists.
            self.hasher.verify_dummy(password).await?;
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(&password_hash, password).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.sessions.issue()?;
        self.store
            .set_user_session(user.id, &issued.token, issued.expires_at)
            .await?;

        info!(user_id = user.id, "User logged in: {}", user.username);

        Ok(LoginResult {
            token: issued.token,
            user: UserInfo::from(user),
        })
    }

    async fn authenticate(&self, token: &str) -> Result<UserInfo, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let user = self
            .store
            .get_user_by_session_token(token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if session::is_expired(user.session_expires_at.as_deref(), chrono::Utc::now()) {
            debug!(user_id = user.id, "Session expired, clearing token");
            // A concurrent login may already have replaced this token.
            self.store.clear_user_session_if(user.id, token).await?;
            return Err(AuthError::SessionExpired);
        }

        Ok(UserInfo::from(user))
    }

    async fn change_password(
        &self,
        user_id: i32,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_new_password(new_password).map_err(AuthError::Validation)?;

        // The account may have been deleted since the token was resolved.
        let current_hash = self
            .store
            .get_user_password_hash(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !self.hasher.verify(&current_hash, old_password).await? {
            warn!(user_id, "Password change rejected: old password mismatch");
            return Err(AuthError::IncorrectPassword);
        }

        if old_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let new_hash = self.hasher.hash(new_password).await?;
        self.store
            .update_user_password(user_id, &new_hash, false, false)
            .await?;

        info!(user_id, "Password changed");
        Ok(())
    }

    async fn logout(&self, user_id: i32) -> Result<(), AuthError> {
        self.store.clear_user_session(user_id).await?;
        info!(user_id, "User logged out");
        Ok(())
    }
}

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, sea_query::Expr,
};

use crate::entities::{addresses, prelude::*, tokens, users};

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub is_admin: bool,
    pub needs_password_reset: bool,
    pub session_expires_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            is_admin: model.is_admin,
            needs_password_reset: model.needs_password_reset,
            session_expires_at: model.session_expires_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn count(&self) -> Result<u64> {
        Users::find()
            .count(&self.conn)
            .await
            .context("Failed to count users")
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    /// Get user by username together with the stored password hash
    pub async fn get_by_username_with_password(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            (User::from(u), password_hash)
        }))
    }

    pub async fn get_password_hash(&self, id: i32) -> Result<Option<String>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        Ok(user.map(|u| u.password_hash))
    }

    /// Looks up the user whose live session token equals `token`.
    /// Expiry is left to the caller.
    pub async fn get_by_session_token(&self, token: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::SessionToken.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query user by session token")?;

        Ok(user.map(User::from))
    }

    pub async fn list_all(&self) -> Result<Vec<User>> {
        let rows = Users::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Inserts a new user. Returns `None` when the username is already taken.
    pub async fn create(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<Option<User>> {
        if self.get_by_username(username).await?.is_some() {
            return Ok(None);
        }

        let now = Utc::now().to_rfc3339();
        let active = users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash.to_string()),
            session_token: Set(None),
            session_expires_at: Set(None),
            is_admin: Set(is_admin),
            needs_password_reset: Set(false),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Some(User::from(model))),
            // Lost a race with a concurrent insert of the same name.
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(e).context("Failed to insert user"),
        }
    }

    /// Seeds an administrator only if the table is still empty, checking and
    /// inserting inside one transaction. Returns whether a row was written.
    pub async fn create_admin_if_empty(&self, username: &str, password_hash: &str) -> Result<bool> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to begin bootstrap transaction")?;

        let existing = Users::find()
            .count(&txn)
            .await
            .context("Failed to count users")?;
        if existing > 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        let now = Utc::now().to_rfc3339();
        users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash.to_string()),
            session_token: Set(None),
            session_expires_at: Set(None),
            is_admin: Set(true),
            needs_password_reset: Set(false),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to create admin user")?;

        txn.commit()
            .await
            .context("Failed to commit bootstrap transaction")?;

        Ok(true)
    }

    /// Overwrites the user's session, invalidating any previous token.
    pub async fn set_session(
        &self,
        id: i32,
        token: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let result = Users::update_many()
            .col_expr(users::Column::SessionToken, Expr::value(token))
            .col_expr(
                users::Column::SessionExpiresAt,
                Expr::value(expires_at.map(|at| at.to_rfc3339())),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now().to_rfc3339()))
            .filter(users::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to store session token")?;

        if result.rows_affected == 0 {
            anyhow::bail!("User not found: {id}");
        }
        Ok(())
    }

    pub async fn clear_session(&self, id: i32) -> Result<()> {
        Users::update_many()
            .col_expr(users::Column::SessionToken, Expr::value(Option::<String>::None))
            .col_expr(
                users::Column::SessionExpiresAt,
                Expr::value(Option::<String>::None),
            )
            .filter(users::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to clear session token")?;

        Ok(())
    }

    /// Clears the session only while `token` is still the live one.
    /// Returns `false` when the token was already replaced or cleared.
    pub async fn clear_session_if(&self, id: i32, token: &str) -> Result<bool> {
        let result = Users::update_many()
            .col_expr(users::Column::SessionToken, Expr::value(Option::<String>::None))
            .col_expr(
                users::Column::SessionExpiresAt,
                Expr::value(Option::<String>::None),
            )
            .filter(users::Column::Id.eq(id))
            .filter(users::Column::SessionToken.eq(token))
            .exec(&self.conn)
            .await
            .context("Failed to clear session token")?;

        Ok(result.rows_affected > 0)
    }

    /// Replaces the password hash. `needs_reset` is stored as given; when
    /// `revoke_session` is set the live session is dropped as well.
    /// Returns `false` if no such user exists.
    pub async fn update_password(
        &self,
        id: i32,
        password_hash: &str,
        needs_reset: bool,
        revoke_session: bool,
    ) -> Result<bool> {
        let mut update = Users::update_many()
            .col_expr(users::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(users::Column::NeedsPasswordReset, Expr::value(needs_reset))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now().to_rfc3339()))
            .filter(users::Column::Id.eq(id));

        if revoke_session {
            update = update
                .col_expr(users::Column::SessionToken, Expr::value(Option::<String>::None))
                .col_expr(
                    users::Column::SessionExpiresAt,
                    Expr::value(Option::<String>::None),
                );
        }

        let result = update
            .exec(&self.conn)
            .await
            .context("Failed to update password")?;

        Ok(result.rows_affected > 0)
    }

    /// Deletes the user and everything it owns in one transaction.
    pub async fn delete_with_owned(&self, id: i32) -> Result<bool> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to begin delete transaction")?;

        let addresses_removed = Addresses::delete_many()
            .filter(addresses::Column::UserId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to delete user addresses")?
            .rows_affected;

        let tokens_removed = Tokens::delete_many()
            .filter(tokens::Column::UserId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to delete user tokens")?
            .rows_affected;

        let users_removed = Users::delete_by_id(id)
            .exec(&txn)
            .await
            .context("Failed to delete user")?
            .rows_affected;

        if users_removed == 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        txn.commit()
            .await
            .context("Failed to commit delete transaction")?;

        tracing::debug!(
            user_id = id,
            tokens_removed,
            addresses_removed,
            "Deleted user with owned rows"
        );
        Ok(true)
    }
}

fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}

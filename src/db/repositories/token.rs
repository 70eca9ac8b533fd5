use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::info;

use crate::entities::{prelude::*, tokens};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub id: i32,
    pub user_id: i32,
    pub value: String,
    pub description: String,
    pub is_default: bool,
    pub created_at: String,
}

impl From<tokens::Model> for Token {
    fn from(model: tokens::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            value: model.value,
            description: model.description,
            is_default: model.is_default,
            created_at: model.created_at,
        }
    }
}

/// Repository for upstream provider tokens. Every lookup is scoped to the
/// owning user.
pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<Token>> {
        let rows = Tokens::find()
            .filter(tokens::Column::UserId.eq(user_id))
            .order_by_asc(tokens::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list tokens")?;

        Ok(rows.into_iter().map(Token::from).collect())
    }

    /// Adds a token. The first token a user stores becomes their default.
    pub async fn add(&self, user_id: i32, value: &str, description: &str) -> Result<Token> {
        let existing = Tokens::find()
            .filter(tokens::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await
            .context("Failed to count tokens")?;

        let model = tokens::ActiveModel {
            user_id: Set(user_id),
            value: Set(value.to_string()),
            description: Set(description.to_string()),
            is_default: Set(existing == 0),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert token")?;

        info!("Added token {} for user {}", model.id, user_id);
        Ok(Token::from(model))
    }

    pub async fn get_owned(&self, id: i32, user_id: i32) -> Result<Option<Token>> {
        let row = Tokens::find_by_id(id)
            .filter(tokens::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query token")?;

        Ok(row.map(Token::from))
    }

    pub async fn delete_owned(&self, id: i32, user_id: i32) -> Result<bool> {
        let result = Tokens::delete_many()
            .filter(tokens::Column::Id.eq(id))
            .filter(tokens::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete token")?;

        Ok(result.rows_affected > 0)
    }
}

use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::{addresses, prelude::*};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub id: i32,
    pub user_id: i32,
    pub generated_address: String,
    pub real_address: String,
    pub converted_address: String,
    pub token_value: String,
    pub token_description: String,
    pub created_at: String,
}

impl From<addresses::Model> for Address {
    fn from(model: addresses::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            generated_address: model.generated_address,
            real_address: model.real_address,
            converted_address: model.converted_address,
            token_value: model.token_value,
            token_description: model.token_description,
            created_at: model.created_at,
        }
    }
}

/// Fields of one alias-generation transaction, ready to persist.
#[derive(Debug, Clone)]
pub struct NewAddress<'a> {
    pub user_id: i32,
    pub generated_address: &'a str,
    pub real_address: &'a str,
    pub converted_address: &'a str,
    pub token_value: &'a str,
    pub token_description: &'a str,
}

pub struct AddressRepository {
    conn: DatabaseConnection,
}

impl AddressRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<Address>> {
        let rows = Addresses::find()
            .filter(addresses::Column::UserId.eq(user_id))
            .order_by_desc(addresses::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list addresses")?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    pub async fn add(&self, address: NewAddress<'_>) -> Result<Address> {
        let model = addresses::ActiveModel {
            user_id: Set(address.user_id),
            generated_address: Set(address.generated_address.to_string()),
            real_address: Set(address.real_address.to_string()),
            converted_address: Set(address.converted_address.to_string()),
            token_value: Set(address.token_value.to_string()),
            token_description: Set(address.token_description.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert address")?;

        Ok(Address::from(model))
    }

    pub async fn delete_owned(&self, id: i32, user_id: i32) -> Result<bool> {
        let result = Addresses::delete_many()
            .filter(addresses::Column::Id.eq(id))
            .filter(addresses::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete address")?;

        Ok(result.rows_affected > 0)
    }
}

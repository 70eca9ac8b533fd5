//! `SeaORM` implementation of the `AliasService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::clients::{AliasProvider, ProviderError};
use crate::db::{Address, NewAddress, Store, Token};
use crate::services::alias_service::{AliasError, AliasService, convert_real_address};
use crate::services::validation::require_non_empty;

pub struct SeaOrmAliasService {
    store: Store,
    provider: Arc<dyn AliasProvider>,
}

impl SeaOrmAliasService {
    #[must_use]
    pub fn new(store: Store, provider: Arc<dyn AliasProvider>) -> Self {
        Self { store, provider }
    }
}

#[async_trait]
impl AliasService for SeaOrmAliasService {
    async fn list_tokens(&self, user_id: i32) -> Result<Vec<Token>, AliasError> {
        Ok(self.store.list_tokens(user_id).await?)
    }

    async fn add_token(
        &self,
        user_id: i32,
        value: &str,
        description: &str,
    ) -> Result<Token, AliasError> {
        require_non_empty("Token value", value).map_err(AliasError::Validation)?;

        Ok(self
            .store
            .add_token(user_id, value.trim(), description.trim())
            .await?)
    }

    async fn delete_token(&self, user_id: i32, token_id: i32) -> Result<(), AliasError> {
        if !self.store.delete_token(token_id, user_id).await? {
            return Err(AliasError::TokenNotFound(token_id));
        }
        info!(user_id, token_id, "Token deleted");
        Ok(())
    }

    async fn generate_address(
        &self,
        user_id: i32,
        token_id: i32,
        real_address: &str,
    ) -> Result<Address, AliasError> {
        let token = self
            .store
            .get_owned_token(token_id, user_id)
            .await?
            .ok_or(AliasError::TokenNotFound(token_id))?;

        let generated = match self.provider.generate_alias(&token.value).await {
            Ok(alias) => alias,
            Err(e) => {
                match &e {
                    ProviderError::NoAddress { status, body } => error!(
                        user_id,
                        token_id,
                        status,
                        body = %body,
                        "Alias provider returned no address"
                    ),
                    ProviderError::Transport(err) => error!(
                        user_id,
                        token_id,
                        "Alias provider request failed: {err}"
                    ),
                }
                return Err(e.into());
            }
        };

        let real_address = real_address.trim();
        let converted = convert_real_address(real_address, &generated);

        let address = self
            .store
            .add_address(NewAddress {
                user_id,
                generated_address: &generated,
                real_address,
                converted_address: &converted,
                token_value: &token.value,
                token_description: &token.description,
            })
            .await?;

        metrics::counter!("aliases_generated_total").increment(1);
        info!(user_id, address_id = address.id, "Generated email address");
        Ok(address)
    }

    async fn list_addresses(&self, user_id: i32) -> Result<Vec<Address>, AliasError> {
        Ok(self.store.list_addresses(user_id).await?)
    }

    async fn delete_address(&self, user_id: i32, address_id: i32) -> Result<(), AliasError> {
        if !self.store.delete_address(address_id, user_id).await? {
            return Err(AliasError::AddressNotFound(address_id));
        }
        info!(user_id, address_id, "Address deleted");
        Ok(())
    }
}

//! Domain service for upstream provider tokens and generated aliases.

use thiserror::Error;

use crate::clients::ProviderError;
use crate::constants::ALIAS_DOMAIN;
use crate::db::{Address, Token};

#[derive(Debug, Error)]
pub enum AliasError {
    #[error("Token {0} not found")]
    TokenNotFound(i32),

    #[error("Address {0} not found")]
    AddressNotFound(i32),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Upstream(#[from] ProviderError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AliasError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AliasError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Everything here is scoped to `user_id`; rows owned by someone else are
/// reported as not found.
#[async_trait::async_trait]
pub trait AliasService: Send + Sync {
    async fn list_tokens(&self, user_id: i32) -> Result<Vec<Token>, AliasError>;

    async fn add_token(
        &self,
        user_id: i32,
        value: &str,
        description: &str,
    ) -> Result<Token, AliasError>;

    async fn delete_token(&self, user_id: i32, token_id: i32) -> Result<(), AliasError>;

    /// Asks the provider for a new alias using one of the caller's tokens
    /// and records the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AliasError::Upstream`] when the provider is unreachable or
    /// answers without an address. Nothing is persisted in that case.
    async fn generate_address(
        &self,
        user_id: i32,
        token_id: i32,
        real_address: &str,
    ) -> Result<Address, AliasError>;

    async fn list_addresses(&self, user_id: i32) -> Result<Vec<Address>, AliasError>;

    async fn delete_address(&self, user_id: i32, address_id: i32) -> Result<(), AliasError>;
}

/// Combines a real address with a provider alias so that mail sent to the
/// result reaches `real_address` through the alias.
///
/// An empty real address yields the bare alias on the provider domain.
#[must_use]
pub fn convert_real_address(real_address: &str, generated_address: &str) -> String {
    let alias = generated_address
        .strip_suffix(ALIAS_DOMAIN)
        .unwrap_or(generated_address);

    if real_address.is_empty() {
        return format!("{alias}{ALIAS_DOMAIN}");
    }

    let converted = real_address.replace('@', "_at_");
    format!("{converted}_{alias}{ALIAS_DOMAIN}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_real_address_gives_plain_alias() {
        assert_eq!(convert_real_address("", "quiet-fox-42"), "quiet-fox-42@duck.com");
    }

    #[test]
    fn real_address_is_folded_into_alias() {
        assert_eq!(
            convert_real_address("bob@example.org", "quiet-fox-42"),
            "bob_at_example.org_quiet-fox-42@duck.com"
        );
    }

    #[test]
    fn provider_domain_is_not_doubled() {
        assert_eq!(
            convert_real_address("bob@example.org", "quiet-fox-42@duck.com"),
            "bob_at_example.org_quiet-fox-42@duck.com"
        );
        assert_eq!(
            convert_real_address("", "quiet-fox-42@duck.com"),
            "quiet-fox-42@duck.com"
        );
    }

    #[test]
    fn every_at_sign_is_replaced() {
        assert_eq!(
            convert_real_address("a@b@c", "x"),
            "a_at_b_at_c_x@duck.com"
        );
    }
}

pub mod duckduckgo;

pub use duckduckgo::DuckClient;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to alias provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered but gave no usable address. Carries the raw
    /// response body for server-side diagnosis only.
    #[error("alias provider returned no address (status {status}): {body}")]
    NoAddress { status: u16, body: String },
}

/// Upstream service that mints a new alias for the holder of `token`.
#[async_trait::async_trait]
pub trait AliasProvider: Send + Sync {
    /// Returns the alias local part as given by the provider.
    async fn generate_alias(&self, token: &str) -> Result<String, ProviderError>;
}

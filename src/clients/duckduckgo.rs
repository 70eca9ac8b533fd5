use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{AliasProvider, ProviderError};
use crate::config::UpstreamConfig;
use crate::constants::upstream::GENERATE_PATH;

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    address: Option<String>,
}

/// Client for the DuckDuckGo email protection API.
#[derive(Clone)]
pub struct DuckClient {
    client: Client,
    base_url: String,
}

impl DuckClient {
    pub fn new(config: &UpstreamConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("Anonymail/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self::with_shared_client(client, &config.base_url))
    }

    #[must_use]
    pub fn with_shared_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl AliasProvider for DuckClient {
    async fn generate_alias(&self, token: &str) -> Result<String, ProviderError> {
        let url = format!("{}{}", self.base_url, GENERATE_PATH);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body("{}")
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, "Alias provider responded");

        let parsed: GenerateResponse = serde_json::from_str(&body).unwrap_or_default();

        match parsed.address {
            Some(address) if !address.trim().is_empty() => Ok(address.trim().to_string()),
            _ => Err(ProviderError::NoAddress { status, body }),
        }
    }
}

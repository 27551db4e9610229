//! REST request client for the exchange surfaces
//!
//! Split into focused modules:
//! - `products`: Market data queries
//! - `accounts`: Account queries across surfaces
//! - `orders`: Order placement and cancellation
//! - `surface`: Routing table for the three upstream APIs

mod accounts;
mod helpers;
mod orders;
mod products;
mod surface;

pub use surface::Surface;

use crate::config::RestConfig;
use crate::signing::{self, SignError, SigningContext};
use helpers::with_headers;
use keyvault::{KeyVault, SelectedKey, VaultError};
use reqwest::{Client, Method};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum RestError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upstream returned {status}: {body}")]
    UpstreamHttp { status: u16, body: String },

    #[error("No credential available for owner {0}")]
    NoCredentialAvailable(String),

    #[error("Signing failed: {0}")]
    Signing(#[from] SignError),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Credential store error: {0}")]
    Store(#[from] VaultError),
}

pub type Result<T> = std::result::Result<T, RestError>;

/// REST client routing requests across the upstream surfaces
///
/// Authenticated calls draw a credential from the vault per request and
/// report the HTTP outcome back, so rotation tracks upstream health.
pub struct RestClient {
    pub(crate) client: Client,
    vault: Arc<KeyVault>,
    owner: String,
    advanced_url: String,
    exchange_url: String,
    oauth_url: String,
}

impl RestClient {
    pub fn new(config: &RestConfig, vault: Arc<KeyVault>, owner: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            vault,
            owner: owner.into(),
            advanced_url: config.advanced_url.clone(),
            exchange_url: config.exchange_url.clone(),
            oauth_url: config.oauth_url.clone(),
        }
    }

    fn base_url(&self, surface: Surface) -> &str {
        match surface {
            Surface::Public | Surface::Advanced => &self.advanced_url,
            Surface::Exchange => &self.exchange_url,
            Surface::OAuth => &self.oauth_url,
        }
    }

    /// Issue one request against a surface and return the response JSON
    ///
    /// Credential outcomes are reported exactly once per dispatched request:
    /// a response or transport failure counts against the key, while errors
    /// raised before anything leaves the process do not.
    pub(crate) async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        surface: Surface,
    ) -> Result<Value> {
        let body_text = match &body {
            Some(value) => value.to_string(),
            None => String::new(),
        };

        let timestamp = signing::current_timestamp();
        let ctx = SigningContext::new(
            method.as_str(),
            path,
            surface.path_prefix(),
            &body_text,
            timestamp,
        );
        let url = format!("{}{}", self.base_url(surface), ctx.request_path());

        let mut headers: HashMap<String, String> = HashMap::new();
        let mut selected: Option<SelectedKey> = None;
        if surface.requires_auth() {
            let key = self
                .vault
                .next_key(&self.owner)
                .await?
                .ok_or_else(|| RestError::NoCredentialAvailable(self.owner.clone()))?;

            match surface.signing_mode() {
                Some(mode) => {
                    headers = signing::auth_headers(&ctx, &key.api_key, &key.secret, mode)?;
                }
                None => {
                    headers.insert(
                        "Authorization".to_string(),
                        format!("Bearer {}", key.api_key),
                    );
                }
            }
            selected = Some(key);
        }

        debug!("{} {}", method, url);

        let mut req = self.client.request(method, &url);
        req = with_headers(req, headers);
        if body.is_some() {
            // The signed bytes and the sent bytes must match
            req = req
                .header("Content-Type", "application/json")
                .body(body_text);
        }

        let response = match req.send().await {
            Ok(response) => response,
            Err(e) => {
                self.report_outcome(&selected, false).await;
                return Err(RestError::Transport(e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            self.report_outcome(&selected, false).await;
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RestError::UpstreamHttp {
                status: status.as_u16(),
                body: text,
            });
        }

        self.report_outcome(&selected, true).await;

        response
            .json()
            .await
            .map_err(|e| RestError::MalformedResponse(e.to_string()))
    }

    /// Feed the request outcome back into rotation
    ///
    /// Bookkeeping failures are logged and swallowed so they never mask the
    /// HTTP result the caller is waiting on.
    async fn report_outcome(&self, selected: &Option<SelectedKey>, success: bool) {
        if let Some(key) = selected {
            if let Err(e) = self.vault.update_key_status(&key.key_id, success).await {
                warn!(
                    "Failed to record credential outcome for {}: {}",
                    key.key_id, e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyvault::MemoryCredentialStore;

    #[test]
    fn test_client_creation() {
        let config = RestConfig::default();
        let vault = Arc::new(KeyVault::new(Arc::new(MemoryCredentialStore::new())));
        let client = RestClient::new(&config, vault, "primary");

        assert_eq!(client.advanced_url, "https://api.coinbase.com");
        assert_eq!(client.exchange_url, "https://api.exchange.coinbase.com");
        assert_eq!(client.base_url(Surface::OAuth), "https://api.coinbase.com");
    }
}

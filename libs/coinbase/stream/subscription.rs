//! Subscription intents and outbound frame construction

use super::{FeedError, Result};
use crate::signing;
use keyvault::KeyVault;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Credential source for authenticated channels
#[derive(Clone)]
pub struct FeedAuth {
    pub vault: Arc<KeyVault>,
    pub owner: String,
}

/// One queued subscription request
#[derive(Debug, Clone)]
pub struct SubscribeIntent {
    pub channels: Vec<String>,
    pub product_ids: Vec<String>,
    pub authenticated: bool,
}

impl SubscribeIntent {
    pub fn new(channels: Vec<String>, product_ids: Vec<String>) -> Self {
        Self {
            channels,
            product_ids,
            authenticated: false,
        }
    }

    /// Mark the intent as needing a signed subscribe frame
    pub fn authenticated(mut self) -> Self {
        self.authenticated = true;
        self
    }
}

/// Outbound subscribe frame
///
/// A single channel goes out under the singular `channel` key, multiple
/// channels under `channels`. Auth fields appear only on signed frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeFrame {
    #[serde(rename = "type")]
    pub message_type: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub product_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// Build the wire frame for one intent, signing it when required
pub(crate) async fn build_subscribe_frame(
    intent: &SubscribeIntent,
    auth: Option<&FeedAuth>,
) -> Result<SubscribeFrame> {
    let (channel, channels) = if intent.channels.len() == 1 {
        (Some(intent.channels[0].clone()), None)
    } else {
        (None, Some(intent.channels.clone()))
    };

    let mut frame = SubscribeFrame {
        message_type: "subscribe".to_string(),
        product_ids: intent.product_ids.clone(),
        channel,
        channels,
        api_key: None,
        timestamp: None,
        signature: None,
    };

    if intent.authenticated {
        let auth = auth.ok_or_else(|| {
            FeedError::MissingCredential("feed has no credential source".to_string())
        })?;
        let key = auth
            .vault
            .next_key(&auth.owner)
            .await?
            .ok_or_else(|| {
                FeedError::MissingCredential(format!("owner {} has no active keys", auth.owner))
            })?;

        let timestamp = signing::current_timestamp();
        let signature = signing::sign_subscribe(
            &intent.channels,
            &intent.product_ids,
            &key.secret,
            timestamp,
        )?;

        frame.api_key = Some(key.api_key);
        frame.timestamp = Some(timestamp.to_string());
        frame.signature = Some(signature);
    }

    Ok(frame)
}

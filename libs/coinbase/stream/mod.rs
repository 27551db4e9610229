//! Streaming gateway
//!
//! One persistent websocket connection per client:
//! - Paced FIFO subscribe dispatch, so bursts never hit the upstream
//! - Fixed-delay reconnection (other strategies are opt-in)
//! - Ordered handler fan-out that survives reconnects
//! - Keep-alive pings and lock-free state/metrics

pub mod client;
pub mod connection_state;
pub mod handler;
pub mod reconnect;
pub mod subscription;

pub use client::{FeedClient, FeedConfig, FeedEvent};
pub use connection_state::{ConnectionState, Metrics};
pub use handler::{FrameHandler, HandlerId};
pub use reconnect::{ExponentialBackoff, FixedDelay, NeverReconnect, ReconnectionStrategy};
pub use subscription::{FeedAuth, SubscribeFrame, SubscribeIntent};

use crate::signing::SignError;
use keyvault::VaultError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    #[error("No credential available: {0}")]
    MissingCredential(String),

    #[error("Channel send failed: {0}")]
    ChannelSend(String),

    #[error("Signing failed: {0}")]
    Signing(#[from] SignError),

    #[error("Credential store error: {0}")]
    Store(#[from] VaultError),
}

pub type Result<T> = std::result::Result<T, FeedError>;

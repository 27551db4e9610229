//! # Coinbase Gateway
//!
//! Client-side gateway to Coinbase's REST API surfaces and real-time feed.
//!
//! ## Features
//!
//! - **Credential rotation**: every authenticated call checks a key out of
//!   the vault and reports the outcome back, so unhealthy keys rotate out
//! - **Surface-aware signing**: HMAC-SHA256 request signatures with the
//!   path/query canonicalization rules each API surface expects
//! - **Normalized models**: heterogeneous upstream payloads map into one
//!   canonical shape with explicit defaults, never coerced silently
//! - **Supervised streaming**: one feed connection with paced subscription
//!   dispatch, fixed-delay reconnection, and ordered handler fan-out

pub mod config;
pub mod logging;
pub mod models;
pub mod rest;
pub mod signing;
pub mod stream;

// Re-export the public client surface
pub use config::{GatewayConfig, RestConfig, StreamConfig};
pub use models::{Account, Candle, Order, OrderAck, Product, Trade};
pub use rest::{RestClient, RestError, Surface};
pub use signing::{SignError, SigningContext, SigningMode};
pub use stream::{
    ConnectionState, FeedAuth, FeedClient, FeedConfig, FeedEvent, FrameHandler, HandlerId,
    Metrics, SubscribeIntent,
};

// Re-export the vault types callers wire in
pub use keyvault::{CredentialRecord, CredentialStore, KeyVault, MemoryCredentialStore, SelectedKey};

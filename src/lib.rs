//! Coinbase Gateway - Main Library
//!
//! This crate ties the workspace libraries together behind a single
//! dependency for the binaries in `src/bin/`.
//!
//! ## Architecture
//!
//! - **keyvault**: Credential storage and rotation (re-exported from workspace)
//! - **coinbase**: REST client, request signing, and streaming gateway
//!   (re-exported from workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust
//! use coinbase_gateway::coinbase::config::GatewayConfig;
//! use coinbase_gateway::keyvault::KeyVault;
//! ```

// Re-export workspace libraries for convenience
pub use coinbase;
pub use keyvault;

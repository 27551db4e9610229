//! # KeyVault
//!
//! Credential rotation over a pluggable store.
//!
//! The vault selects the next usable API credential for an owner, skipping
//! recently failed and already-used keys until the rotation cycle exhausts,
//! and feeds success/failure outcomes back to the store so selection order
//! reflects real credential health.
//!
//! ## Example
//!
//! ```rust,ignore
//! use keyvault::{KeyVault, MemoryCredentialStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryCredentialStore::new());
//! let vault = KeyVault::new(store);
//!
//! if let Some(selected) = vault.next_key("owner-1").await? {
//!     // use selected.api_key / selected.secret
//!     vault.update_key_status(&selected.key_id, true).await?;
//! }
//! ```

pub mod error;
pub mod record;
pub mod store;
pub mod vault;

pub use error::VaultError;
pub use record::CredentialRecord;
pub use store::{CredentialStore, MemoryCredentialStore};
pub use vault::{KeyVault, SelectedKey};

/// Type alias for Result with VaultError
pub type Result<T> = std::result::Result<T, VaultError>;

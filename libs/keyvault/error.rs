use thiserror::Error;

/// Main error type for keyvault
#[derive(Error, Debug)]
pub enum VaultError {
    /// Underlying credential store failed
    #[error("Store error: {0}")]
    Store(String),

    /// Referenced credential does not exist
    #[error("Unknown credential id: {0}")]
    UnknownCredential(String),

    /// Record rejected by the store
    #[error("Invalid credential record: {0}")]
    InvalidRecord(String),
}

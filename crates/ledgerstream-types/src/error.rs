//! Shared error type for the persistence substrate.
//!
//! One enum spans every fallible boundary in the runtime (transcoding,
//! ciphering, recording, configuration) so that callers composing the
//! pipeline only ever need to match on a single `Result` type.

use thiserror::Error;

/// Errors produced anywhere in the ledgerstream persistence pipeline.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// A recorder rejected an insert because a version or tracking id
    /// was already taken. Recoverable: reload state and retry.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// Encoding or decoding a value failed because no transcoding is
    /// registered for the type or tag name involved.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Ciphertext was the wrong shape or failed authentication.
    #[error("cipher data error: {0}")]
    CipherData(String),

    /// The infrastructure factory could not build a component from the
    /// supplied configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Any other failure surfaced unchanged from a storage back-end.
    #[error("backend error: {0}")]
    Backend(#[from] std::io::Error),
}

impl PersistenceError {
    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    pub fn cipher_data(msg: impl Into<String>) -> Self {
        Self::CipherData(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// True if the caller can recover by retrying with fresh state.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Integrity(_))
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

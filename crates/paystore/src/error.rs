//! Error types for Paystore operations.

use paystore_core::{ChannelId, ContractError, InvariantViolation, Token};
use paystore_store::StoreError;
use thiserror::Error;

/// The entity a lookup failed to find.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFound {
    #[error("channel {0}")]
    Channel(ChannelId),

    #[error("payments for channel {0}")]
    Payments(ChannelId),

    #[error("token {0}")]
    Token(Token),
}

/// Errors that can occur during Paystore operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested entity does not exist. An expected outcome, not a fault.
    #[error("not found: {0}")]
    NotFound(#[from] NotFound),

    /// Storage failure (disk, transaction abort, corrupt document).
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The write would break a channel invariant and was rejected.
    #[error("invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),

    /// The channel contract could not report the channel's state.
    #[error("channel contract error: {0}")]
    Contract(#[from] ContractError),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::Invariant(_))
    }
}

/// Result type for Paystore operations.
pub type Result<T> = std::result::Result<T, StorageError>;

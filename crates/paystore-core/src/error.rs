//! Error types for Paystore core.

use thiserror::Error;

use crate::types::{Amount, ChannelId};

/// A caller tried to store a state the channel invariants forbid.
///
/// These are rejected before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("channel {channel_id}: spent {spent} exceeds deposit {value}")]
    SpendExceedsDeposit {
        channel_id: ChannelId,
        spent: Amount,
        value: Amount,
    },

    #[error("channel {channel_id}: spent may not decrease from {current} to {attempted}")]
    SpendDecrease {
        channel_id: ChannelId,
        current: Amount,
        attempted: Amount,
    },

    #[error("payment for channel {payment} recorded under channel {expected}")]
    ChannelMismatch {
        expected: ChannelId,
        payment: ChannelId,
    },
}

/// Errors reported by the authoritative channel contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// The contract could not be reached or answered with garbage.
    #[error("channel contract unavailable: {0}")]
    Unavailable(String),

    /// The contract has no record of the channel.
    #[error("channel contract has no channel {0}")]
    UnknownChannel(ChannelId),
}

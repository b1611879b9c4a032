//! # Paystore Core
//!
//! Core primitives for Paystore: the value types every other crate in the
//! workspace passes around, plus the pure spend invariants.
//!
//! ## Key Types
//!
//! - [`Channel`] - locally stored view of a payment channel
//! - [`Payment`] - a signed cumulative claim against a channel
//! - [`Token`] - an authorization token issued for a payment
//! - [`Namespace`] / [`RecordKind`] - document kind qualification
//! - [`ChannelContract`] - the authoritative ledger interface
//!
//! ## Invariants
//!
//! - `0 <= spent <= value` for every stored channel
//! - stored spend never decreases ([`plan_save`], [`plan_spend`])
//! - the current claim on a channel is the payment with maximum value

pub mod channel;
pub mod contract;
pub mod error;
pub mod namespace;
pub mod payment;
pub mod token;
pub mod types;

pub use channel::{plan_save, plan_spend, Channel, ChannelState, LiveChannel, SpendTransition};
pub use contract::ChannelContract;
pub use error::{ContractError, InvariantViolation};
pub use namespace::{Namespace, RecordKind};
pub use payment::{max_by_value, Payment};
pub use token::Token;
pub use types::{Address, Amount, ChannelId};

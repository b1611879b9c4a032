//! # Paystore
//!
//! Persistence and state integrity for unidirectional micropayment
//! channels: which channels exist, how much of each has been spent, which
//! signed payments were made against them and which tokens were issued for
//! those payments.
//!
//! ## Overview
//!
//! - [`ChannelLedger`] - stored channels; upsert-by-spend `save`, lookups
//!   enriched with live contract state
//! - [`PaymentJournal`] - append-only payments; `max_payment` is the
//!   current claim
//! - [`TokenAuthority`] - atomic token + payment issuance, validity checks
//! - [`Storage`] - all three bound to one store and namespace
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use paystore::{Storage, StorageConfig};
//! use paystore::core::{Address, Channel, ChannelContract, ChannelId, Payment, Token};
//!
//! async fn example(contract: Arc<dyn ChannelContract>) -> paystore::Result<()> {
//!     let config = StorageConfig::at("channels.db").with_namespace("hub");
//!     let storage = Storage::open(&config, contract)?;
//!
//!     // First sight of the channel materializes it.
//!     let channel = Channel::new(
//!         ChannelId::new("0xc1"),
//!         Address::new("0xA"),
//!         Address::new("0xB"),
//!         100u64,
//!         0u64,
//!     );
//!     storage.channels().save(&channel).await?;
//!
//!     // A verified payment arrives: record it and hand out a token.
//!     let payment = Payment::new(ChannelId::new("0xc1"), 30u64, 27, "0xr", "0xs");
//!     let token = Token::derive(&payment);
//!     storage.tokens().issue(&token, &payment).await?;
//!
//!     // Ratchet the channel's spend to the largest claim.
//!     storage.channels().sync_spend(&channel.channel_id).await?;
//!
//!     assert!(storage.tokens().is_valid(&token).await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `paystore::core` - domain types and invariants
//! - `paystore::store` - record store traits and backends

pub mod authority;
pub mod config;
pub mod error;
pub mod journal;
pub mod ledger;
mod records;
pub mod storage;

// Re-export component crates
pub use paystore_core as core;
pub use paystore_store as store;

// Re-export main types for convenience
pub use authority::TokenAuthority;
pub use config::{StorageConfig, StoreLocation};
pub use error::{NotFound, Result, StorageError};
pub use journal::PaymentJournal;
pub use ledger::ChannelLedger;
pub use storage::Storage;

//! # Paystore Testkit
//!
//! Testing utilities for Paystore.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: channels, payments and tokens with sensible defaults
//! - **Generators**: Proptest strategies for property-based testing
//! - **Doubles**: [`StaticContract`] for the channel contract and
//!   [`FaultyStore`] for injecting storage failures
//!
//! ## Test Fixtures
//!
//! ```rust
//! use paystore_testkit::fixtures::ChannelFixture;
//!
//! let mut fixture = ChannelFixture::new(100);
//! let (payment, token) = fixture.pay_with_token(30);
//! assert_eq!(payment.value.get(), 30);
//! assert_eq!(token.as_str().len(), 64);
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use paystore_testkit::generators::payment_values;
//!
//! proptest! {
//!     #[test]
//!     fn max_payment_is_max(values in payment_values(1_000, 20)) {
//!         // append every value, then compare max_payment with values.iter().max()
//!     }
//! }
//! ```

pub mod contract;
pub mod faulty;
pub mod fixtures;
pub mod generators;

pub use contract::StaticContract;
pub use faulty::FaultyStore;
pub use fixtures::ChannelFixture;

//! # Paystore Store
//!
//! Storage abstraction for Paystore. Provides a trait-based interface for
//! namespaced document persistence with SQLite and in-memory
//! implementations.
//!
//! ## Overview
//!
//! Documents are flat JSON objects tagged with a kind (`"channel"`,
//! `"ns:payment"`, ...). Every query matches the kind exactly plus a set of
//! equality clauses on top-level fields. The primary implementation is
//! [`SqliteStore`], with [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`RecordStore`] - The async trait for all storage operations
//! - [`Transaction`] - Synchronous handle used inside a transaction
//! - [`Document`], [`Filter`], [`Mutation`] - what gets stored and how it is matched
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use paystore_store::{Document, Filter, RecordStore, SqliteStore};
//!
//! async fn example() {
//!     let store = SqliteStore::open("paystore.db").unwrap();
//!
//!     let fields = serde_json::json!({"token": "t1", "channelId": "c1"});
//!     let doc = Document::new("token", fields.as_object().cloned().unwrap());
//!     store.insert(&doc).await.unwrap();
//!
//!     let found = store
//!         .find_one("token", &Filter::new().eq("token", "t1"))
//!         .await
//!         .unwrap();
//!     assert!(found.is_some());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Insertion order**: `find` is ordered by insertion; `find_one` returns
//!   the earliest match
//! - **Partial updates**: `update` replaces only the fields it names
//! - **Transactions**: all-or-nothing, serialized against each other

pub mod document;
pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use document::{validate_field, Document, FieldValue, Fields, Filter, Mutation};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{RecordStore, Transaction};

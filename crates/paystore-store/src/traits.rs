//! Store traits: the abstract interface for document persistence.
//!
//! Higher layers only see [`RecordStore`] and [`Transaction`], so the same
//! channel/payment/token logic runs on SQLite and in memory.

use async_trait::async_trait;

use crate::document::{Document, Filter, Mutation};
use crate::error::{Result, StoreError};

/// Synchronous access to the store inside a transaction.
///
/// Reads observe the transaction's own earlier writes.
pub trait Transaction {
    /// All documents of `kind` matching `filter`, in insertion order.
    fn find(&mut self, kind: &str, filter: &Filter) -> Result<Vec<Document>>;

    /// The first matching document in insertion order.
    fn find_one(&mut self, kind: &str, filter: &Filter) -> Result<Option<Document>> {
        Ok(self.find(kind, filter)?.into_iter().next())
    }

    /// Append a new document.
    fn insert(&mut self, document: &Document) -> Result<()>;

    /// Apply `mutation` to every matching document.
    ///
    /// Returns the number of documents matched.
    fn update(&mut self, kind: &str, filter: &Filter, mutation: &Mutation) -> Result<usize>;
}

/// The RecordStore trait: async interface for document persistence.
///
/// # Design Notes
///
/// - **Ordering**: `find` returns documents in insertion order and
///   `find_one` returns the earliest match. Backends must not leak their
///   own iteration order.
/// - **Atomicity**: everything done inside [`RecordStore::transaction`]
///   commits together or not at all. Transactions are serialized.
/// - **No retries**: failures are reported once; retry policy belongs to
///   the caller.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find(&self, kind: &str, filter: &Filter) -> Result<Vec<Document>>;

    async fn find_one(&self, kind: &str, filter: &Filter) -> Result<Option<Document>>;

    async fn insert(&self, document: &Document) -> Result<()>;

    async fn update(&self, kind: &str, filter: &Filter, mutation: &Mutation) -> Result<usize>;

    /// Run `f` inside a transaction.
    ///
    /// Commits if `f` returns `Ok`, rolls back otherwise. Storage failures
    /// while opening or committing are converted into `E`.
    async fn transaction<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut dyn Transaction) -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static;
}

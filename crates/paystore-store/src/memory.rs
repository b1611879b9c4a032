//! In-memory implementation of the RecordStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::document::{Document, Fields, Filter, Mutation};
use crate::error::{Result, StoreError};
use crate::traits::{RecordStore, Transaction};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock;
/// transactions hold the write lock for their whole duration and stage
/// their writes on a full copy of the records, so each transaction costs
/// O(stored documents). Fine for tests, not for large data sets.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Clone, Default)]
struct MemoryStoreInner {
    /// Documents in insertion order.
    records: Vec<StoredRecord>,
}

#[derive(Clone)]
struct StoredRecord {
    kind: String,
    fields: Fields,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    /// Number of stored documents across all kinds.
    ///
    /// Counts what is stored even if a writer panicked and poisoned the
    /// lock; queries on a poisoned store still fail.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStoreInner {
    fn matching<'a>(
        &'a self,
        kind: &'a str,
        filter: &'a Filter,
    ) -> impl Iterator<Item = &'a StoredRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| r.kind == kind && filter.matches(&r.fields))
    }
}

impl Transaction for MemoryStoreInner {
    fn find(&mut self, kind: &str, filter: &Filter) -> Result<Vec<Document>> {
        filter.validate()?;
        Ok(self
            .matching(kind, filter)
            .map(|r| Document::new(r.kind.clone(), r.fields.clone()))
            .collect())
    }

    fn find_one(&mut self, kind: &str, filter: &Filter) -> Result<Option<Document>> {
        filter.validate()?;
        let found = self
            .matching(kind, filter)
            .next()
            .map(|r| Document::new(r.kind.clone(), r.fields.clone()));
        Ok(found)
    }

    fn insert(&mut self, document: &Document) -> Result<()> {
        self.records.push(StoredRecord {
            kind: document.kind.clone(),
            fields: document.fields.clone(),
        });
        Ok(())
    }

    fn update(&mut self, kind: &str, filter: &Filter, mutation: &Mutation) -> Result<usize> {
        filter.validate()?;
        mutation.validate()?;

        let mut matched = 0;
        for record in self
            .records
            .iter_mut()
            .filter(|r| r.kind == kind && filter.matches(&r.fields))
        {
            mutation.apply_to(&mut record.fields);
            matched += 1;
        }
        Ok(matched)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find(&self, kind: &str, filter: &Filter) -> Result<Vec<Document>> {
        filter.validate()?;
        let inner = self.read()?;
        let found: Vec<Document> = inner
            .matching(kind, filter)
            .map(|r| Document::new(r.kind.clone(), r.fields.clone()))
            .collect();
        Ok(found)
    }

    async fn find_one(&self, kind: &str, filter: &Filter) -> Result<Option<Document>> {
        filter.validate()?;
        let inner = self.read()?;
        let found = inner
            .matching(kind, filter)
            .next()
            .map(|r| Document::new(r.kind.clone(), r.fields.clone()));
        Ok(found)
    }

    async fn insert(&self, document: &Document) -> Result<()> {
        self.write()?.insert(document)
    }

    async fn update(&self, kind: &str, filter: &Filter, mutation: &Mutation) -> Result<usize> {
        self.write()?.update(kind, filter, mutation)
    }

    async fn transaction<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut dyn Transaction) -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        let mut inner = self.write()?;

        // Stage writes on a copy; publish only on success.
        let mut staged = inner.clone();
        let out = f(&mut staged)?;
        *inner = staged;

        Ok(out)
    }
}

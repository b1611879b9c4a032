//! A RecordStore wrapper that injects write failures.
//!
//! Used to check that multi-document writes leave nothing behind when the
//! second write fails.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use paystore_core::RecordKind;
use paystore_store::{Document, Filter, Mutation, RecordStore, StoreError, Transaction};

/// Wraps a store and fails inserts of one record kind, in any namespace.
pub struct FaultyStore<S> {
    inner: S,
    failing: Arc<Mutex<Option<RecordKind>>>,
}

impl<S: RecordStore> FaultyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failing: Arc::new(Mutex::new(None)),
        }
    }

    /// Make every subsequent insert of `kind` fail with an I/O error.
    pub fn fail_inserts(&self, kind: RecordKind) {
        *self.failing.lock().unwrap() = Some(kind);
    }

    pub fn clear_faults(&self) {
        *self.failing.lock().unwrap() = None;
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn check(&self, document: &Document) -> Result<(), StoreError> {
        check_insert(*self.failing.lock().unwrap(), document)
    }
}

fn check_insert(failing: Option<RecordKind>, document: &Document) -> Result<(), StoreError> {
    match failing {
        Some(kind) if is_kind(&document.kind, kind) => Err(StoreError::Io(std::io::Error::other(
            format!("injected failure writing {}", document.kind),
        ))),
        _ => Ok(()),
    }
}

/// Whether a qualified kind tag (`kind` or `ns:kind`) names `kind`.
fn is_kind(tag: &str, kind: RecordKind) -> bool {
    let base = tag.rsplit(':').next().unwrap_or(tag);
    base == kind.as_str()
}

struct FaultyTransaction<'a, 'b> {
    inner: &'a mut (dyn Transaction + 'b),
    failing: Option<RecordKind>,
}

impl Transaction for FaultyTransaction<'_, '_> {
    fn find(&mut self, kind: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        self.inner.find(kind, filter)
    }

    fn find_one(&mut self, kind: &str, filter: &Filter) -> Result<Option<Document>, StoreError> {
        self.inner.find_one(kind, filter)
    }

    fn insert(&mut self, document: &Document) -> Result<(), StoreError> {
        check_insert(self.failing, document)?;
        self.inner.insert(document)
    }

    fn update(
        &mut self,
        kind: &str,
        filter: &Filter,
        mutation: &Mutation,
    ) -> Result<usize, StoreError> {
        self.inner.update(kind, filter, mutation)
    }
}

#[async_trait]
impl<S: RecordStore> RecordStore for FaultyStore<S> {
    async fn find(&self, kind: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        self.inner.find(kind, filter).await
    }

    async fn find_one(&self, kind: &str, filter: &Filter) -> Result<Option<Document>, StoreError> {
        self.inner.find_one(kind, filter).await
    }

    async fn insert(&self, document: &Document) -> Result<(), StoreError> {
        self.check(document)?;
        self.inner.insert(document).await
    }

    async fn update(
        &self,
        kind: &str,
        filter: &Filter,
        mutation: &Mutation,
    ) -> Result<usize, StoreError> {
        self.inner.update(kind, filter, mutation).await
    }

    async fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        let failing = *self.failing.lock().unwrap();
        self.inner
            .transaction(move |tx| {
                let mut faulty = FaultyTransaction { inner: tx, failing };
                f(&mut faulty)
            })
            .await
    }
}

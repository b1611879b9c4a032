//! Storage: the three components over one shared store and namespace.

use std::sync::Arc;

use paystore_core::{ChannelContract, Namespace};
use paystore_store::{RecordStore, SqliteStore};

use crate::authority::TokenAuthority;
use crate::config::{StorageConfig, StoreLocation};
use crate::error::Result;
use crate::journal::PaymentJournal;
use crate::ledger::ChannelLedger;

/// Channel ledger, payment journal and token authority bound to one
/// namespace of one physical store.
///
/// Cheap to clone; clones share the store.
pub struct Storage<S> {
    namespace: Namespace,
    channels: ChannelLedger<S>,
    payments: PaymentJournal<S>,
    tokens: TokenAuthority<S>,
}

impl<S> Clone for Storage<S> {
    fn clone(&self) -> Self {
        Self {
            namespace: self.namespace.clone(),
            channels: self.channels.clone(),
            payments: self.payments.clone(),
            tokens: self.tokens.clone(),
        }
    }
}

impl Storage<SqliteStore> {
    /// Open the SQLite store described by `config`.
    pub fn open(config: &StorageConfig, contract: Arc<dyn ChannelContract>) -> Result<Self> {
        let store = match &config.location {
            StoreLocation::Memory => SqliteStore::open_memory()?,
            StoreLocation::Path(path) => SqliteStore::open(path)?,
        };
        Ok(Self::new(store, config.namespace(), contract))
    }
}

impl<S: RecordStore> Storage<S> {
    pub fn new(store: S, namespace: Namespace, contract: Arc<dyn ChannelContract>) -> Self {
        Self::with_shared(Arc::new(store), namespace, contract)
    }

    /// Build on a store that other namespaces may share.
    pub fn with_shared(
        store: Arc<S>,
        namespace: Namespace,
        contract: Arc<dyn ChannelContract>,
    ) -> Self {
        tracing::debug!(namespace = ?namespace.prefix(), "binding storage namespace");
        Self {
            channels: ChannelLedger::new(store.clone(), namespace.clone(), contract),
            payments: PaymentJournal::new(store.clone(), namespace.clone()),
            tokens: TokenAuthority::new(store, namespace.clone()),
            namespace,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn channels(&self) -> &ChannelLedger<S> {
        &self.channels
    }

    pub fn payments(&self) -> &PaymentJournal<S> {
        &self.payments
    }

    pub fn tokens(&self) -> &TokenAuthority<S> {
        &self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paystore_core::{Amount, ChannelId, Token};
    use paystore_store::MemoryStore;
    use paystore_testkit::{fixtures, StaticContract};

    #[tokio::test]
    async fn test_open_sqlite_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::at(dir.path().join("channels.db")).with_namespace("hub");

        let storage = Storage::open(&config, Arc::new(StaticContract::all_open())).unwrap();
        assert_eq!(storage.namespace().prefix(), Some("hub"));

        storage.channels().save(&fixtures::channel("c1", 100)).await.unwrap();
        drop(storage);

        let reopened = Storage::open(&config, Arc::new(StaticContract::all_open())).unwrap();
        let live = reopened
            .channels()
            .find_by_channel_id(&ChannelId::new("c1"))
            .await
            .unwrap();
        assert_eq!(live.channel.value, Amount(100));
    }

    #[tokio::test]
    async fn test_namespaces_share_a_store() {
        let store = Arc::new(MemoryStore::new());
        let contract = Arc::new(StaticContract::all_open());
        let a = Storage::with_shared(store.clone(), Namespace::new("a"), contract.clone());
        let b = Storage::with_shared(store.clone(), Namespace::new("b"), contract);

        a.tokens()
            .issue(&Token::new("tok"), &fixtures::payment("c1", 1))
            .await
            .unwrap();

        assert!(a.tokens().is_valid(&Token::new("tok")).await.unwrap());
        assert!(!b.tokens().is_valid(&Token::new("tok")).await.unwrap());
        assert_eq!(store.len(), 2);
    }
}

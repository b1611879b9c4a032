//! Storage configuration.

use std::path::PathBuf;

use paystore_core::Namespace;

/// Where the SQLite database lives.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StoreLocation {
    /// A private in-memory database, gone when the store is dropped.
    #[default]
    Memory,
    /// A database file, created on first open.
    Path(PathBuf),
}

/// Configuration for [`Storage`](crate::Storage).
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    /// Database location.
    pub location: StoreLocation,
    /// Prefix separating this store's documents from others sharing the
    /// same database. `None` or empty means unprefixed.
    pub namespace: Option<String>,
}

impl StorageConfig {
    pub fn memory() -> Self {
        Self::default()
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::Path(path.into()),
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn namespace(&self) -> Namespace {
        Namespace::from(self.namespace.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paystore_core::RecordKind;

    #[test]
    fn test_default_is_unprefixed_memory() {
        let config = StorageConfig::default();
        assert_eq!(config.location, StoreLocation::Memory);
        assert_eq!(config.namespace().qualify(RecordKind::Channel), "channel");
    }

    #[test]
    fn test_builder() {
        let config = StorageConfig::at("/tmp/paystore.db").with_namespace("hub");
        assert_eq!(config.location, StoreLocation::Path("/tmp/paystore.db".into()));
        assert_eq!(config.namespace().qualify(RecordKind::Token), "hub:token");
    }
}

//! Record kinds and namespace qualification.
//!
//! Several logical stores can share one physical store. Every document is
//! tagged with a qualified kind, `namespace:kind`, and all queries filter on
//! it, so two namespaces never see each other's documents.

use std::fmt;

/// The three kinds of document Paystore persists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Channel,
    Payment,
    Token,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::Payment => "payment",
            Self::Token => "token",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An optional namespace prefix.
///
/// An empty prefix is the same as no prefix.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Namespace(Option<String>);

impl Namespace {
    /// The unprefixed namespace.
    pub const fn none() -> Self {
        Self(None)
    }

    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if prefix.is_empty() {
            Self(None)
        } else {
            Self(Some(prefix))
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// The kind tag documents of `kind` carry in this namespace.
    pub fn qualify(&self, kind: RecordKind) -> String {
        match &self.0 {
            Some(prefix) => format!("{}:{}", prefix, kind.as_str()),
            None => kind.as_str().to_string(),
        }
    }
}

impl From<Option<String>> for Namespace {
    fn from(prefix: Option<String>) -> Self {
        prefix.map(Self::new).unwrap_or_default()
    }
}

impl From<&str> for Namespace {
    fn from(prefix: &str) -> Self {
        Self::new(prefix)
    }
}

//! Documents, filters and mutations.
//!
//! A document is a flat JSON object tagged with a kind. Queries match the
//! kind exactly and each filter clause by equality on a top-level field.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, StoreError};

/// The body of a document.
pub type Fields = serde_json::Map<String, Value>;

/// A stored document.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// Qualified kind tag (already namespaced by the caller).
    pub kind: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(kind: impl Into<String>, fields: Fields) -> Self {
        Self {
            kind: kind.into(),
            fields,
        }
    }

    /// Serialize a record into a document of the given kind.
    ///
    /// The record must serialize to a JSON object.
    pub fn encode<T: Serialize>(kind: impl Into<String>, record: &T) -> Result<Self> {
        match serde_json::to_value(record)? {
            Value::Object(fields) => Ok(Self::new(kind, fields)),
            other => Err(StoreError::Serialization(format!(
                "record must serialize to an object, got {}",
                type_name(&other)
            ))),
        }
    }

    /// Deserialize the document body into a record.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.fields.clone()))?)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// A value a filter clause compares against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
}

impl FieldValue {
    /// Whether a stored JSON value equals this one.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Text(expected), Value::String(actual)) => expected == actual,
            (Self::Integer(expected), Value::Number(actual)) => actual.as_i64() == Some(*expected),
            _ => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

/// Conjunction of equality clauses on top-level fields.
///
/// An empty filter matches every document of the queried kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    clauses: Vec<(String, FieldValue)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `field == value` clause.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    pub fn clauses(&self) -> &[(String, FieldValue)] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        self.clauses.iter().all(|(name, expected)| {
            fields
                .get(name)
                .map(|actual| expected.matches(actual))
                .unwrap_or(false)
        })
    }

    pub(crate) fn validate(&self) -> Result<()> {
        self.clauses
            .iter()
            .try_for_each(|(name, _)| validate_field(name))
    }
}

/// Partial update: each named field is replaced, all others are kept.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mutation {
    set: Fields,
}

impl Mutation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace `field` with `value`.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(field.into(), value.into());
        self
    }

    /// Replace `field` with the serialized form of `value`.
    pub fn set_serialized<T: Serialize>(self, field: impl Into<String>, value: &T) -> Result<Self> {
        Ok(self.set(field, serde_json::to_value(value)?))
    }

    pub fn fields(&self) -> &Fields {
        &self.set
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Apply the mutation to a document body in place.
    pub fn apply_to(&self, fields: &mut Fields) {
        for (name, value) in &self.set {
            fields.insert(name.clone(), value.clone());
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        self.set.keys().try_for_each(|name| validate_field(name))
    }
}

/// Field names are inlined into SQL JSON paths, so they are restricted to
/// ASCII alphanumerics and `_`.
pub fn validate_field(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidField(name.to_string()))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Note {
        channel_id: String,
        seen: i64,
    }

    #[test]
    fn test_encode_decode_record() {
        let note = Note {
            channel_id: "c1".into(),
            seen: 3,
        };
        let doc = Document::encode("note", &note).unwrap();
        assert_eq!(doc.get("channelId"), Some(&json!("c1")));
        assert_eq!(doc.decode::<Note>().unwrap(), note);
    }

    #[test]
    fn test_encode_rejects_non_objects() {
        let err = Document::encode("note", &42).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn test_filter_matching() {
        let fields = json!({"channelId": "c1", "seen": 3})
            .as_object()
            .cloned()
            .unwrap();

        assert!(Filter::new().matches(&fields));
        assert!(Filter::new().eq("channelId", "c1").matches(&fields));
        assert!(Filter::new().eq("seen", 3i64).matches(&fields));
        assert!(!Filter::new().eq("seen", "3").matches(&fields));
        assert!(!Filter::new().eq("channelId", "c1").eq("seen", 4i64).matches(&fields));
        assert!(!Filter::new().eq("missing", "c1").matches(&fields));
    }

    #[test]
    fn test_mutation_is_partial() {
        let mut fields = json!({"channelId": "c1", "spent": "0"})
            .as_object()
            .cloned()
            .unwrap();
        Mutation::new().set("spent", "30").apply_to(&mut fields);
        assert_eq!(fields.get("channelId"), Some(&json!("c1")));
        assert_eq!(fields.get("spent"), Some(&json!("30")));
    }

    #[test]
    fn test_field_validation() {
        assert!(validate_field("channelId").is_ok());
        assert!(validate_field("spent_2").is_ok());
        assert!(validate_field("").is_err());
        assert!(validate_field("a.b").is_err());
        assert!(validate_field("x') OR 1=1 --").is_err());
    }
}

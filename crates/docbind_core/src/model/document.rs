//! Document representation and serde bridge helpers.
//!
//! # Responsibility
//! - Define the wire/storage shape of one entity instance.
//! - Strip absent fields before writes so storage never sees them.
//!
//! # Invariants
//! - `Value::Null` is the in-memory stand-in for an absent field; stripped
//!   documents contain no null values at the top level.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Canonical persisted field mapping for one entity instance.
pub type Document = Map<String, Value>;

/// Error produced while converting between models and documents.
#[derive(Debug)]
pub enum DocumentError {
    /// The serialized model was not a JSON object.
    NotAnObject,
    /// Underlying serialization/deserialization failure.
    Serde(serde_json::Error),
    /// Persisted data violates the model's expectations.
    Invalid(String),
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "serialized model is not a JSON object"),
            Self::Serde(err) => write!(f, "{err}"),
            Self::Invalid(message) => write!(f, "invalid document data: {message}"),
        }
    }
}

impl Error for DocumentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serde(err) => Some(err),
            Self::NotAnObject | Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for DocumentError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// Removes all top-level fields whose value is `Value::Null`.
///
/// Write paths call this before handing a document to the store, so fields a
/// model left unset are absent from storage rather than stored as null.
pub fn strip_absent(doc: &mut Document) {
    doc.retain(|_, value| !value.is_null());
}

/// Serializes any `Serialize` value into a [`Document`].
///
/// Convenience for models that derive `Serialize` and reuse it for their
/// `to_document` implementation.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, DocumentError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(DocumentError::NotAnObject),
    }
}

/// Deserializes a [`Document`] into any `DeserializeOwned` value.
pub fn from_document<T: DeserializeOwned>(doc: &Document) -> Result<T, DocumentError> {
    Ok(serde_json::from_value(Value::Object(doc.clone()))?)
}

#[cfg(test)]
mod tests {
    use super::{from_document, strip_absent, to_document};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        note: Option<String>,
    }

    #[test]
    fn strip_absent_removes_only_nulls() {
        let mut doc = to_document(&json!({
            "a": 1,
            "b": null,
            "c": "kept",
            "d": [null]
        }))
        .unwrap();

        strip_absent(&mut doc);

        assert!(doc.contains_key("a"));
        assert!(!doc.contains_key("b"));
        assert!(doc.contains_key("c"));
        // Nested nulls are the model's business, not the adapter's.
        assert_eq!(doc["d"], json!([null]));
    }

    #[test]
    fn serde_bridge_roundtrip() {
        let sample = Sample {
            name: "x".to_string(),
            note: None,
        };
        let mut doc = to_document(&sample).unwrap();
        assert!(doc["note"].is_null());

        strip_absent(&mut doc);
        let back: Sample = from_document(&doc).unwrap();
        assert_eq!(back, sample);
    }

    #[test]
    fn to_document_rejects_non_objects() {
        assert!(to_document(&json!([1, 2, 3])).is_err());
    }
}

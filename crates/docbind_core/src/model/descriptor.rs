//! Model type descriptors and the `Model` trait.
//!
//! # Responsibility
//! - Describe an entity type: name, ordered properties, index specifications.
//! - Define the contract a model must satisfy to flow through the adapter.
//!
//! # Invariants
//! - An index declared on an array-typed property always gets multi-value
//!   semantics (each element becomes an index key).
//! - Computed index functions are pure over the document's fields.

use crate::model::document::{Document, DocumentError};
use serde_json::Value;

/// Derives a composite index key from a document's fields.
pub type IndexKeyFn = fn(&Document) -> Value;

/// Index specification attached to one declared property.
#[derive(Debug, Clone, Copy)]
pub enum IndexSpec {
    /// No secondary index.
    None,
    /// Index the property's own value. On an array-typed property this
    /// becomes a multi index over the elements.
    Simple,
    /// Index a key computed from the whole document.
    Computed(IndexKeyFn),
}

/// Type tag for one declared property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    String,
    Number,
    Bool,
    Array,
    Object,
}

/// One declared property of a model type.
#[derive(Debug, Clone, Copy)]
pub struct PropertySpec {
    pub name: &'static str,
    pub kind: PropertyKind,
    pub index: IndexSpec,
}

/// Static description of an entity type.
///
/// The type name doubles as the store table name.
#[derive(Debug, Clone, Copy)]
pub struct ModelDescriptor {
    pub type_name: &'static str,
    pub properties: &'static [PropertySpec],
}

impl ModelDescriptor {
    /// Looks up a declared property by name.
    pub fn property(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.iter().find(|prop| prop.name == name)
    }

    /// Iterates properties that declared an index specification.
    pub fn indexed_properties(&self) -> impl Iterator<Item = &PropertySpec> {
        self.properties
            .iter()
            .filter(|prop| !matches!(prop.index, IndexSpec::None))
    }
}

/// Contract a persistable entity type satisfies.
///
/// The adapter never inspects model internals beyond this trait: it builds
/// instances from stored documents, serializes instances back to documents,
/// and reads/assigns the primary key.
pub trait Model: Sized {
    /// Static descriptor; the type name is also the table name.
    fn descriptor() -> &'static ModelDescriptor;

    /// Builds an instance from a stored document.
    fn from_document(doc: &Document) -> Result<Self, DocumentError>;

    /// Serializes to a plain document. `include_private` controls whether
    /// fields the model considers private are included.
    fn to_document(&self, include_private: bool) -> Document;

    /// Primary key, when one has been assigned.
    fn id(&self) -> Option<&str>;

    /// Adopts a store-generated primary key.
    fn assign_id(&mut self, id: String);

    /// Table name shorthand.
    fn type_name() -> &'static str {
        Self::descriptor().type_name
    }
}

#[cfg(test)]
mod tests {
    use super::{IndexSpec, ModelDescriptor, PropertyKind, PropertySpec};
    use serde_json::Value;

    const DESCRIPTOR: ModelDescriptor = ModelDescriptor {
        type_name: "things",
        properties: &[
            PropertySpec {
                name: "user",
                kind: PropertyKind::Number,
                index: IndexSpec::Simple,
            },
            PropertySpec {
                name: "label",
                kind: PropertyKind::String,
                index: IndexSpec::None,
            },
            PropertySpec {
                name: "pair",
                kind: PropertyKind::String,
                index: IndexSpec::Computed(|_| Value::Null),
            },
        ],
    };

    #[test]
    fn property_lookup_by_name() {
        assert!(DESCRIPTOR.property("user").is_some());
        assert!(DESCRIPTOR.property("missing").is_none());
    }

    #[test]
    fn indexed_properties_skip_unindexed() {
        let names: Vec<&str> = DESCRIPTOR
            .indexed_properties()
            .map(|prop| prop.name)
            .collect();
        assert_eq!(names, ["user", "pair"]);
    }
}

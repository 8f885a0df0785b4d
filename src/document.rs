// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Documents and the type registry.
//!
//! Concrete document types register themselves against their string
//! discriminator at startup; heterogeneous results are decoded by reading
//! a minimal envelope first and dispatching to the concrete decoder.
//! There is no runtime type scanning.
//!
//! # Example
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use store_engine::schema::Field;
//! use store_engine::{DocumentRegistry, StoredDocument};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Person {
//!     id: String,
//!     #[serde(default)]
//!     last_name: String,
//! }
//!
//! impl StoredDocument for Person {
//!     const TYPE_NAME: &'static str = "person";
//!
//!     fn id(&self) -> String {
//!         self.id.clone()
//!     }
//!
//!     fn schema_fields() -> Vec<Field> {
//!         vec![Field::text("last_name")]
//!     }
//! }
//!
//! let mut registry = DocumentRegistry::new();
//! registry.register::<Person>();
//! assert!(registry.contains("person"));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;
use crate::schema::Field;

/// Name of the type discriminator field on every stored document.
pub const TYPE_FIELD: &str = "type";

/// A document as it comes back from a search: any registered concrete
/// type, behind one object-safe surface.
pub trait Document: std::fmt::Debug + Send + Sync {
    /// Document identifier.
    fn id(&self) -> String;

    /// Type discriminator.
    fn type_name(&self) -> &'static str;

    /// The document as a JSON value, in the concrete type's own shape.
    fn to_value(&self) -> Result<Value, StoreError>;
}

/// A concrete document type that can live in a store.
///
/// Implementors are plain serde structs; `schema_fields` is the statically
/// declared searchable shape used when the store is created.
pub trait StoredDocument:
    Serialize + DeserializeOwned + std::fmt::Debug + Clone + Send + Sync + 'static
{
    /// Discriminator this type registers under.
    const TYPE_NAME: &'static str;

    /// Document identifier.
    fn id(&self) -> String;

    /// Statically declared field tree for stores of this type.
    fn schema_fields() -> Vec<Field>;
}

impl<T: StoredDocument> Document for T {
    fn id(&self) -> String {
        StoredDocument::id(self)
    }

    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn to_value(&self) -> Result<Value, StoreError> {
        Ok(serde_json::to_value(self)?)
    }
}

type DecodeFn = Arc<dyn Fn(Value) -> Result<Box<dyn Document>, StoreError> + Send + Sync>;

/// One registered document type.
#[derive(Clone)]
struct TypeEntry {
    fields: Vec<Field>,
    decode: DecodeFn,
}

/// Minimal envelope decoded first to learn a document's concrete type.
#[derive(Deserialize)]
struct TypeEnvelope {
    #[serde(rename = "type")]
    type_name: String,
}

/// Explicit, statically-built registry mapping type discriminators to
/// decoders and schema fields.
#[derive(Clone, Default)]
pub struct DocumentRegistry {
    entries: HashMap<String, TypeEntry>,
}

impl DocumentRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a concrete document type under its discriminator.
    /// Re-registering replaces the previous entry.
    pub fn register<T: StoredDocument>(&mut self) {
        let decode: DecodeFn = Arc::new(|value| {
            let concrete: T = serde_json::from_value(value)?;
            Ok(Box::new(concrete) as Box<dyn Document>)
        });
        self.entries.insert(
            T::TYPE_NAME.to_string(),
            TypeEntry {
                fields: T::schema_fields(),
                decode,
            },
        );
    }

    /// Whether a discriminator is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    /// Registered discriminators.
    pub fn type_names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Statically declared fields for a registered type.
    pub fn schema_fields(&self, type_name: &str) -> Result<Vec<Field>, StoreError> {
        self.entries
            .get(type_name)
            .map(|entry| entry.fields.clone())
            .ok_or_else(|| StoreError::UnknownDocumentType(type_name.to_string()))
    }

    /// Decode a document of unknown concrete type.
    ///
    /// Reads the `type` discriminator from a minimal envelope, then
    /// re-decodes the full payload as the registered concrete type.
    pub fn deserialize(&self, value: Value) -> Result<Box<dyn Document>, StoreError> {
        let envelope: TypeEnvelope = serde_json::from_value(value.clone())
            .map_err(|_| StoreError::UnknownDocumentType("<missing type field>".to_string()))?;

        let entry = self
            .entries
            .get(&envelope.type_name)
            .ok_or_else(|| StoreError::UnknownDocumentType(envelope.type_name.clone()))?;

        (entry.decode)(value)
    }

    /// Serialize a document for the wire, stamping the discriminator and
    /// store name so every persisted source carries the envelope fields.
    pub fn serialize<T: StoredDocument>(
        &self,
        document: &T,
        index_name: &str,
    ) -> Result<Value, StoreError> {
        let mut value = serde_json::to_value(document)?;
        if let Value::Object(map) = &mut value {
            map.insert(
                TYPE_FIELD.to_string(),
                Value::String(T::TYPE_NAME.to_string()),
            );
            map.insert(
                "index_name".to_string(),
                Value::String(index_name.to_string()),
            );
        }
        Ok(value)
    }
}

// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Persisted store schema and the immutable catalog value built from it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::field::Field;
use crate::store_id::StoreId;

/// Well-known metadata key the serialized [`StoreSchema`] is persisted
/// under in backend index metadata. Absence of this key means the schema
/// must be synthesized from the live mapping.
pub const META_SCHEMA_KEY: &str = "store_schema";

/// The persisted description of one store: its fields plus display and
/// behavioral metadata.
///
/// This exact value round-trips through the backend's index metadata, so
/// changes to its shape must stay backward-deserializable (hence the
/// defaults on every optional knob).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSchema {
    /// Identifier of the store this schema belongs to
    pub store_id: StoreId,
    /// Discriminator of the document type held by the store
    pub document_type: String,
    /// Backend aliases pointing at the store's index
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Primary shard count the index was created with
    #[serde(default = "default_one")]
    pub primary_shards: u32,
    /// Replica shard count the index was created with
    #[serde(default)]
    pub replica_shards: u32,
    /// Whether commits against this store request an immediate refresh
    #[serde(default)]
    pub force_refresh_on_commit: bool,
    /// Whether the schema is re-persisted right after index creation
    #[serde(default)]
    pub eagerly_persist_schema: bool,
    /// Store is deprecated and should be hidden from pickers
    #[serde(default)]
    pub deprecated: bool,
    /// Store is hidden from discovery UIs
    #[serde(default)]
    pub hidden: bool,
    /// Whether global (type-less) searches include this store
    #[serde(default = "default_true")]
    pub return_in_global_search: bool,
    /// Singular display label for the stored objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_label: Option<String>,
    /// Plural display label for the stored objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_label_plural: Option<String>,
    /// Primary display field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_field: Option<String>,
    /// Secondary display field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_field: Option<String>,
    /// The store's field tree
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Free-form metadata carried alongside the schema
    #[serde(default)]
    pub meta: HashMap<String, Value>,
}

fn default_one() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl StoreSchema {
    /// Build a schema with defaults for the given store and document type.
    pub fn new(store_id: StoreId, document_type: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            store_id,
            document_type: document_type.into(),
            aliases: Vec::new(),
            primary_shards: 1,
            replica_shards: 0,
            force_refresh_on_commit: false,
            eagerly_persist_schema: false,
            deprecated: false,
            hidden: false,
            return_in_global_search: true,
            object_label: None,
            object_label_plural: None,
            primary_field: None,
            secondary_field: None,
            fields,
            meta: HashMap::new(),
        }
    }

    /// Canonical name of the backing index.
    pub fn name(&self) -> String {
        self.store_id.name()
    }
}

/// An immutable store value as published by the catalog.
///
/// Superseded (a whole new value is published), never mutated, whenever
/// the schema changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Store {
    /// Identifier of the store
    pub id: StoreId,
    /// Current schema
    pub schema: StoreSchema,
}

impl Store {
    /// Compose a store from its schema.
    pub fn new(schema: StoreSchema) -> Self {
        Self {
            id: schema.store_id.clone(),
            schema,
        }
    }

    /// Canonical name of the backing index.
    pub fn name(&self) -> String {
        self.id.name()
    }

    /// Discriminator of the document type held by the store.
    pub fn document_type(&self) -> &str {
        &self.schema.document_type
    }
}

/// Settings for creating a new store.
///
/// Unset knobs fall back to the cluster config's defaults.
#[derive(Debug, Clone, Default)]
pub struct CreateStoreSettings {
    /// Document type discriminator; must be registered
    pub document_type: String,
    /// Moniker override; defaults to the lowercased document type
    pub moniker: Option<String>,
    /// Primary shard count override
    pub primary_shards: Option<u32>,
    /// Replica shard count override
    pub replica_shards: Option<u32>,
    /// Per-call eager schema persistence override
    pub eagerly_persist_schema: Option<bool>,
}

impl CreateStoreSettings {
    /// Settings for the given document type with all defaults.
    pub fn for_type(document_type: impl Into<String>) -> Self {
        Self {
            document_type: document_type.into(),
            ..Default::default()
        }
    }

    /// Override the moniker.
    pub fn with_moniker(mut self, moniker: impl Into<String>) -> Self {
        self.moniker = Some(moniker.into());
        self
    }

    /// Override the shard counts.
    pub fn with_shards(mut self, primary: u32, replicas: u32) -> Self {
        self.primary_shards = Some(primary);
        self.replica_shards = Some(replicas);
        self
    }

    /// Override eager schema persistence for this call.
    pub fn with_eager_persist(mut self, eager: bool) -> Self {
        self.eagerly_persist_schema = Some(eager);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> StoreSchema {
        StoreSchema::new(
            StoreId::new("app", "person").unwrap(),
            "person",
            vec![Field::text("last_name")],
        )
    }

    #[test]
    fn test_schema_round_trips_through_json() {
        let schema = schema();
        let json = serde_json::to_value(&schema).unwrap();
        let back: StoreSchema = serde_json::from_value(json).unwrap();
        assert_eq!(back, schema);
    }

    #[test]
    fn test_schema_deserializes_with_missing_knobs() {
        // Minimal persisted form, as an older writer might have produced.
        let json = serde_json::json!({
            "store_id": {"scope": "app", "moniker": "person"},
            "document_type": "person",
        });
        let schema: StoreSchema = serde_json::from_value(json).unwrap();
        assert_eq!(schema.primary_shards, 1);
        assert!(schema.return_in_global_search);
        assert!(schema.fields.is_empty());
    }

    #[test]
    fn test_store_name_matches_id() {
        let store = Store::new(schema());
        assert_eq!(store.name(), "app_person");
        assert_eq!(store.document_type(), "person");
    }
}

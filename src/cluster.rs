// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Store catalog.
//!
//! The [`Cluster`] owns the in-memory map of known stores, discovers
//! backend indices at startup, and drives store lifecycle (create,
//! delete, save-schema) plus query execution.
//!
//! # Concurrency
//!
//! Queries only read the catalog and run fully in parallel. Lifecycle
//! mutations serialize through a single-writer gate; the gate is released
//! before every backend call and re-acquired only to publish, and the
//! published value is always a whole new `Arc<Store>`, so readers never
//! observe a half-updated store.
//!
//! # Store lifecycle
//!
//! ```text
//! Unknown → Created → (SchemaSaved)* → Deleted
//! ```
//!
//! `SchemaSaved` is idempotent and repeatable. `Deleted` is terminal:
//! operations against a deleted name fail with `StoreNotFound` until the
//! store is recreated.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::backend::{BulkOp, BulkResponse, CreateIndexRequest, RefreshPolicy, SearchBackend};
use crate::config::ClusterConfig;
use crate::document::{DocumentRegistry, StoredDocument};
use crate::error::StoreError;
use crate::query::{compile, normalize, QueryCriteria, QueryResult};
use crate::schema::{
    merge_fields, CreateStoreSettings, Field, Store, StoreSchema, META_SCHEMA_KEY,
};
use crate::store_id::StoreId;

/// The in-memory registry of known stores and their schemas, backed by
/// one search backend.
pub struct Cluster {
    config: ClusterConfig,
    backend: Arc<dyn SearchBackend>,
    registry: Arc<DocumentRegistry>,
    stores: DashMap<String, Arc<Store>>,
    /// Single-writer gate for lifecycle mutations. Never held across a
    /// backend call.
    lifecycle: Mutex<()>,
}

impl Cluster {
    /// Connect to the backend and build the catalog.
    ///
    /// Lists every backend index under the configured scope prefix. Each
    /// index contributes one store: its persisted schema when the
    /// metadata key is present, otherwise a minimal schema synthesized
    /// from the live mapping. When both exist, the persisted fields stay
    /// authoritative and structurally new mapping fields are appended.
    pub async fn connect(
        config: ClusterConfig,
        backend: Arc<dyn SearchBackend>,
        registry: Arc<DocumentRegistry>,
    ) -> Result<Self, StoreError> {
        let prefix = format!("{}{}", config.scope.to_lowercase(), crate::store_id::SEPARATOR);
        let indices = backend.list_indices(&prefix).await?;

        let stores = DashMap::new();
        for index in indices {
            match Self::schema_from_index(&index.name, &index.meta, &index.mapping) {
                Ok(schema) => {
                    stores.insert(index.name.clone(), Arc::new(Store::new(schema)));
                }
                Err(err) => {
                    warn!(index = %index.name, %err, "Skipping undecodable index");
                }
            }
        }

        info!(
            scope = %config.scope,
            stores = stores.len(),
            "Connected store cluster"
        );

        Ok(Self {
            config,
            backend,
            registry,
            stores,
            lifecycle: Mutex::new(()),
        })
    }

    fn schema_from_index(
        name: &str,
        meta: &HashMap<String, Value>,
        mapping: &[Field],
    ) -> Result<StoreSchema, StoreError> {
        match meta.get(META_SCHEMA_KEY) {
            Some(raw) => {
                let mut schema: StoreSchema = serde_json::from_value(raw.clone())?;
                // Live mappings can gain fields from documents written
                // through other paths; the persisted schema stays
                // authoritative for everything it already names.
                schema.fields = merge_fields(&schema.fields, mapping);
                Ok(schema)
            }
            None => {
                let store_id = StoreId::parse(name)?;
                let document_type = store_id.moniker().to_string();
                Ok(StoreSchema::new(store_id, document_type, mapping.to_vec()))
            }
        }
    }

    /// The cluster's configuration.
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Names of all known stores.
    pub fn store_names(&self) -> Vec<String> {
        self.stores.iter().map(|e| e.key().clone()).collect()
    }

    /// Number of known stores.
    pub fn store_count(&self) -> usize {
        self.stores.len()
    }

    /// Look up a store by name.
    pub fn get_store(&self, name: &str) -> Option<Arc<Store>> {
        self.stores.get(name).map(|e| e.value().clone())
    }

    /// Names of the stores holding a given document type.
    pub fn stores_for_type(&self, document_type: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .stores
            .iter()
            .filter(|e| e.value().document_type() == document_type)
            .map(|e| e.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Create a new store for a registered document type.
    ///
    /// Builds the schema from the type's declared fields, creates the
    /// backing index with the schema embedded as metadata, and publishes
    /// the store only after the backend reports success.
    pub async fn create_store(
        &self,
        settings: CreateStoreSettings,
    ) -> Result<Arc<Store>, StoreError> {
        let fields = self.registry.schema_fields(&settings.document_type)?;

        let moniker = settings
            .moniker
            .clone()
            .unwrap_or_else(|| settings.document_type.to_lowercase());
        let store_id = StoreId::new(self.config.scope.clone(), moniker)?;
        let name = store_id.name();

        let gate = self.lifecycle.lock().await;
        if self.stores.contains_key(&name) {
            return Err(StoreError::Backend(format!("store '{name}' already exists")));
        }
        drop(gate);

        let mut schema = StoreSchema::new(store_id, settings.document_type.clone(), fields);
        schema.primary_shards = settings.primary_shards.unwrap_or(self.config.primary_shards);
        schema.replica_shards = settings.replica_shards.unwrap_or(self.config.replica_shards);
        schema.force_refresh_on_commit = self.config.force_refresh_on_commit;
        schema.eagerly_persist_schema = settings
            .eagerly_persist_schema
            .unwrap_or(self.config.eagerly_persist_schema);

        let mut meta = HashMap::new();
        meta.insert(META_SCHEMA_KEY.to_string(), serde_json::to_value(&schema)?);

        let created = self
            .backend
            .create_index(CreateIndexRequest {
                name: name.clone(),
                primary_shards: schema.primary_shards,
                replica_shards: schema.replica_shards,
                lowercase_normalizer: true,
                mapping: schema.fields.clone(),
                meta,
            })
            .await?;

        info!(store = %created.resolved_name, document_type = %schema.document_type, "Created store");

        let store = Arc::new(Store::new(schema.clone()));
        {
            let _gate = self.lifecycle.lock().await;
            self.stores.insert(name.clone(), store.clone());
        }

        if schema.eagerly_persist_schema {
            // Reconcile against whatever mapping the backend actually
            // materialized, then persist the merged schema right away.
            let live = self.backend.list_indices(&name).await?;
            if let Some(index) = live.into_iter().find(|i| i.name == name) {
                let mut reconciled = schema;
                reconciled.fields = merge_fields(&reconciled.fields, &index.mapping);
                return self.save_store_schema(&name, reconciled).await;
            }
        }

        Ok(store)
    }

    /// Delete a store and its backing index.
    ///
    /// Unknown names fail with [`StoreError::StoreNotFound`] and leave
    /// the catalog untouched.
    pub async fn delete_store(&self, name: &str) -> Result<(), StoreError> {
        let gate = self.lifecycle.lock().await;
        if !self.stores.contains_key(name) {
            return Err(StoreError::StoreNotFound(name.to_string()));
        }
        drop(gate);

        self.backend.delete_index(name).await?;

        let _gate = self.lifecycle.lock().await;
        self.stores.remove(name);
        info!(store = %name, "Deleted store");
        Ok(())
    }

    /// Persist a store's schema and publish the updated store.
    ///
    /// The cached value is replaced, never mutated, and only after the
    /// backend accepted the metadata write. Idempotent and repeatable.
    pub async fn save_store_schema(
        &self,
        name: &str,
        schema: StoreSchema,
    ) -> Result<Arc<Store>, StoreError> {
        let gate = self.lifecycle.lock().await;
        if !self.stores.contains_key(name) {
            return Err(StoreError::StoreNotFound(name.to_string()));
        }
        drop(gate);

        let mut meta = HashMap::new();
        meta.insert(META_SCHEMA_KEY.to_string(), serde_json::to_value(&schema)?);
        self.backend.put_index_meta(name, meta).await?;

        let store = Arc::new(Store::new(schema));
        let _gate = self.lifecycle.lock().await;
        self.stores.insert(name.to_string(), store.clone());
        debug!(store = %name, "Saved store schema");
        Ok(store)
    }

    /// Fetch one store's schema, preferring the cache.
    pub async fn get_store_schema(&self, name: &str) -> Result<StoreSchema, StoreError> {
        if let Some(store) = self.get_store(name) {
            return Ok(store.schema.clone());
        }

        let indices = self.backend.list_indices(name).await?;
        indices
            .into_iter()
            .find(|index| index.name == name)
            .map(|index| Self::schema_from_index(&index.name, &index.meta, &index.mapping))
            .transpose()?
            .ok_or_else(|| StoreError::StoreNotFound(name.to_string()))
    }

    /// Fetch several schemas, merging cached and backend-fetched results
    /// without duplication.
    pub async fn get_store_schemas(
        &self,
        names: &[String],
    ) -> Result<Vec<StoreSchema>, StoreError> {
        let mut schemas: Vec<StoreSchema> = Vec::with_capacity(names.len());
        for name in names {
            if schemas.iter().any(|s| s.name() == *name) {
                continue;
            }
            schemas.push(self.get_store_schema(name).await?);
        }
        Ok(schemas)
    }

    /// Resolve the criteria's logical document type into concrete store
    /// names (idempotent, case-insensitive union). A criteria with no
    /// type and no explicit stores becomes a global search across every
    /// store that opts in.
    fn resolve_indices(&self, criteria: &mut QueryCriteria) {
        if let Some(document_type) = criteria.document_type.clone() {
            for name in self.stores_for_type(&document_type) {
                criteria.add_index(&name);
            }
        } else if criteria.indices.is_empty() {
            let mut names: Vec<String> = self
                .stores
                .iter()
                .filter(|e| e.value().schema.return_in_global_search)
                .map(|e| e.key().clone())
                .collect();
            names.sort();
            for name in names {
                criteria.add_index(&name);
            }
        }
    }

    /// Union of the target stores' field trees, for compilation.
    fn gather_fields(&self, indices: &[String]) -> Vec<Field> {
        let mut fields: Vec<Field> = Vec::new();
        for name in indices {
            if let Some(store) = self.get_store(name) {
                fields = merge_fields(&fields, &store.schema.fields);
            }
        }
        fields
    }

    /// Execute a query: resolve targets, compile, search, normalize.
    pub async fn search(&self, criteria: QueryCriteria) -> Result<QueryResult, StoreError> {
        let mut criteria = criteria;
        self.resolve_indices(&mut criteria);

        // A logical type that resolves to no stores matches nothing;
        // don't fall through to a global search.
        if criteria.indices.is_empty() && criteria.document_type.is_some() {
            return Ok(QueryResult {
                documents: Vec::new(),
                total: 0,
                elapsed: std::time::Duration::ZERO,
                buckets: Vec::new(),
            });
        }

        // Schema-dependent operations require every target's document
        // type to resolve in the registry.
        for name in &criteria.indices {
            if let Some(store) = self.get_store(name) {
                if !self.registry.contains(store.document_type()) {
                    return Err(StoreError::SchemaResolution {
                        store: name.clone(),
                        document_type: store.document_type().to_string(),
                    });
                }
            }
        }

        let fields = self.gather_fields(&criteria.indices);
        let request = compile(&criteria, &fields)?;
        debug!(
            indices = ?request.indices,
            filters = criteria.filters.len(),
            buckets = criteria.bucket_fields.len(),
            "Executing search"
        );

        let response = self.backend.search(request).await?;
        normalize(response, &self.registry)
    }

    /// Commit documents to a store via a bulk write.
    ///
    /// Per-item failures are returned in the response; succeeded items
    /// are not rolled back and nothing is retried.
    pub async fn commit<T: StoredDocument>(
        &self,
        store_name: &str,
        documents: &[T],
    ) -> Result<BulkResponse, StoreError> {
        let store = self
            .get_store(store_name)
            .ok_or_else(|| StoreError::StoreNotFound(store_name.to_string()))?;

        if store.document_type() != T::TYPE_NAME {
            return Err(StoreError::SchemaResolution {
                store: store_name.to_string(),
                document_type: T::TYPE_NAME.to_string(),
            });
        }

        let mut ops = Vec::with_capacity(documents.len());
        for document in documents {
            ops.push(BulkOp::Index {
                index: store_name.to_string(),
                id: StoredDocument::id(document),
                document: self.registry.serialize(document, store_name)?,
            });
        }

        let refresh = if store.schema.force_refresh_on_commit {
            RefreshPolicy::Immediate
        } else {
            RefreshPolicy::None
        };
        debug!(store = %store_name, count = documents.len(), "Committing documents");
        self.backend.bulk_write(ops, refresh).await
    }

    /// Delete documents from a store by id.
    pub async fn delete_documents(
        &self,
        store_name: &str,
        ids: &[String],
    ) -> Result<BulkResponse, StoreError> {
        if !self.stores.contains_key(store_name) {
            return Err(StoreError::StoreNotFound(store_name.to_string()));
        }

        let ops = ids
            .iter()
            .map(|id| BulkOp::Delete {
                index: store_name.to_string(),
                id: id.clone(),
            })
            .collect();
        self.backend.bulk_write(ops, RefreshPolicy::None).await
    }
}

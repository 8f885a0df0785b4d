//! # Store Engine
//!
//! A schema-aware abstraction layer between application code and a
//! clustered, schema-flexible document search backend. Callers define
//! logical stores of homogeneous documents, persist and evolve each
//! store's field schema, and issue structured queries without speaking
//! the backend's native query language.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Query Criteria                         │
//! │  • Typed filters, sort, pagination, projection, buckets    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                (Cluster resolves type → store names)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Query Compiler                          │
//! │  • Comparator registry builds one predicate per filter     │
//! │  • Keyword/sort suffix resolution from the field schema    │
//! │  • Reserved bucket keys escaped with a sentinel prefix     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                     (SearchBackend executes)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Result Normalizer                         │
//! │  • Polymorphic document decoding by type discriminator     │
//! │  • Bucket tree rebuilt, sentinel stripped, singletons cut  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use serde::{Deserialize, Serialize};
//! use store_engine::schema::{CreateStoreSettings, Field};
//! use store_engine::{
//!     ClusterConfig, Cluster, Comparator, DocumentRegistry, MemoryBackend, QueryCriteria,
//!     StoredDocument,
//! };
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
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut registry = DocumentRegistry::new();
//!     registry.register::<Person>();
//!
//!     let cluster = Cluster::connect(
//!         ClusterConfig::new("app"),
//!         Arc::new(MemoryBackend::new()),
//!         Arc::new(registry),
//!     )
//!     .await?;
//!
//!     cluster
//!         .create_store(CreateStoreSettings::for_type("person"))
//!         .await?;
//!     cluster
//!         .commit(
//!             "app_person",
//!             &[Person { id: "1".into(), last_name: "Smith".into() }],
//!         )
//!         .await?;
//!
//!     let result = cluster
//!         .search(QueryCriteria::for_type("person").filter(
//!             "last_name",
//!             Comparator::Equal,
//!             "Smith",
//!         ))
//!         .await?;
//!     assert_eq!(result.total, 1);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cluster;
pub mod config;
pub mod document;
pub mod error;
pub mod query;
pub mod schema;
pub mod store_id;

pub use backend::{MemoryBackend, SearchBackend};
pub use cluster::Cluster;
pub use config::ClusterConfig;
pub use document::{Document, DocumentRegistry, StoredDocument, TYPE_FIELD};
pub use error::StoreError;
pub use query::{Bucket, Comparator, Filter, QueryCriteria, QueryResult, SortField};
pub use schema::{Field, FieldType, Store, StoreSchema};
pub use store_id::StoreId;

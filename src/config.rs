//! Configuration for a store cluster.
//!
//! # Example
//!
//! ```
//! use store_engine::ClusterConfig;
//!
//! // Minimal config (uses defaults)
//! let config = ClusterConfig::new("tenant");
//! assert_eq!(config.primary_shards, 1);
//!
//! // Full config
//! let config = ClusterConfig {
//!     scope: "tenant".into(),
//!     primary_shards: 3,
//!     replica_shards: 1,
//!     force_refresh_on_commit: true,
//!     eagerly_persist_schema: true,
//! };
//! ```

use serde::Deserialize;

/// Configuration for a [`Cluster`](crate::Cluster).
///
/// `scope` namespaces every store this cluster owns: physical index names
/// are `{scope}_{moniker}` and startup discovery only lists indices under
/// that prefix. All other fields have sensible defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    /// Namespace prefix for all stores owned by this cluster.
    pub scope: String,

    /// Primary shard count for newly created indices (default: 1)
    #[serde(default = "default_primary_shards")]
    pub primary_shards: u32,

    /// Replica shard count for newly created indices (default: 0)
    #[serde(default = "default_replica_shards")]
    pub replica_shards: u32,

    /// Whether commits request an immediate refresh so documents are
    /// searchable as soon as the bulk call returns (default: false)
    #[serde(default)]
    pub force_refresh_on_commit: bool,

    /// Whether `create_store` immediately re-reads the backend's resulting
    /// mapping and persists a reconciled schema (default: false)
    #[serde(default)]
    pub eagerly_persist_schema: bool,
}

fn default_primary_shards() -> u32 { 1 }
fn default_replica_shards() -> u32 { 0 }

impl ClusterConfig {
    /// Create a config for the given scope with default settings.
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            primary_shards: default_primary_shards(),
            replica_shards: default_replica_shards(),
            force_refresh_on_commit: false,
            eagerly_persist_schema: false,
        }
    }
}

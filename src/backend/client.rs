//! Backend client contract.
//!
//! The cluster talks to the search backend exclusively through
//! [`SearchBackend`], so the engine stays agnostic of transport and
//! authentication. Requests are typed ASTs rather than raw query-language
//! strings; a concrete client translates them to its wire format.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;
use crate::schema::Field;

/// One backend index as reported by discovery.
#[derive(Debug, Clone)]
pub struct IndexInfo {
    /// Physical index name
    pub name: String,
    /// Aliases pointing at the index
    pub aliases: Vec<String>,
    /// Live field mapping
    pub mapping: Vec<Field>,
    /// Persisted index metadata
    pub meta: HashMap<String, Value>,
}

/// Index creation request.
#[derive(Debug, Clone)]
pub struct CreateIndexRequest {
    /// Physical index name
    pub name: String,
    /// Primary shard count
    pub primary_shards: u32,
    /// Replica shard count
    pub replica_shards: u32,
    /// Install the lowercase normalizer backing `.sort` sub-fields
    pub lowercase_normalizer: bool,
    /// Initial field mapping
    pub mapping: Vec<Field>,
    /// Index metadata to persist alongside the mapping
    pub meta: HashMap<String, Value>,
}

/// Result of index creation.
#[derive(Debug, Clone)]
pub struct CreateIndexResponse {
    /// Name the backend resolved the index to
    pub resolved_name: String,
}

/// A compiled filter predicate.
///
/// The conjunction/negation shape mirrors a bool query: `must` clauses
/// all have to match, `must_not` clauses all have to miss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Matches every document
    MatchAll,
    /// Exact value match on a concrete backend field
    Term { field: String, value: Value },
    /// Numeric/date range with optional open bounds
    Range {
        field: String,
        lower: Option<RangeBound>,
        upper: Option<RangeBound>,
    },
    /// Exact phrase match against an analyzed text field
    Phrase { field: String, phrase: String },
    /// Match any of the given tokens against an analyzed text field
    AnyWord { field: String, tokens: Vec<String> },
    /// Boolean combination
    Bool {
        must: Vec<Predicate>,
        must_not: Vec<Predicate>,
    },
}

/// One bound of a range predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeBound {
    /// Bound value (number, date string, or raw string)
    pub value: Value,
    /// Whether the bound itself is included
    pub inclusive: bool,
}

impl RangeBound {
    /// Inclusive bound.
    pub fn inclusive(value: Value) -> Self {
        Self {
            value,
            inclusive: true,
        }
    }

    /// Exclusive bound.
    pub fn exclusive(value: Value) -> Self {
        Self {
            value,
            inclusive: false,
        }
    }
}

/// One sort clause of a compiled request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortClause {
    /// Concrete backend field (already resolved to the sort projection)
    pub field: String,
    /// Ascending or descending
    pub ascending: bool,
}

/// A terms aggregation of a compiled request.
///
/// Bucket order is part of the contract: backends return buckets sorted
/// by document count descending, ties broken by key ascending. A
/// translator that cannot get this order natively must request or apply
/// it itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermsAggregation {
    /// Aggregation key in the response (may carry the reserved-name sentinel)
    pub key: String,
    /// Concrete backend field to bucket on
    pub field: String,
    /// Minimum document count for a bucket to be returned
    pub min_doc_count: u64,
    /// Nested aggregations evaluated per bucket
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aggregations: Vec<TermsAggregation>,
}

/// A compiled, backend-native search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Target index names; empty means global search
    pub indices: Vec<String>,
    /// Filter predicate
    pub predicate: Predicate,
    /// Sort clauses, already ordered
    pub sort: Vec<SortClause>,
    /// Documents to skip
    pub from: usize,
    /// Documents to return
    pub size: usize,
    /// Source fields to project; `None` returns full sources
    pub source_fields: Option<Vec<String>>,
    /// Terms aggregations
    pub aggregations: Vec<TermsAggregation>,
}

/// One matching document.
#[derive(Debug, Clone)]
pub struct Hit {
    /// Index the document came from
    pub index: String,
    /// Document identifier
    pub id: String,
    /// Projected document source
    pub source: Value,
}

/// One raw aggregation bucket as the backend returned it.
#[derive(Debug, Clone)]
pub struct RawBucket {
    /// Bucket key
    pub key: Value,
    /// Number of documents in the bucket
    pub doc_count: u64,
    /// Nested aggregation results
    pub aggregations: Vec<AggregationResult>,
}

/// One named aggregation in a search response.
#[derive(Debug, Clone)]
pub struct AggregationResult {
    /// Aggregation key as sent in the request
    pub name: String,
    /// Buckets, count descending then key ascending
    pub buckets: Vec<RawBucket>,
}

/// A raw search response.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    /// Matching documents after skip/take
    pub hits: Vec<Hit>,
    /// Total matching document count before pagination
    pub total: u64,
    /// Backend-reported execution time in milliseconds
    pub took_millis: u64,
    /// Aggregation results
    pub aggregations: Vec<AggregationResult>,
}

/// One bulk write operation.
#[derive(Debug, Clone)]
pub enum BulkOp {
    /// Index (upsert) a document
    Index {
        index: String,
        id: String,
        document: Value,
    },
    /// Delete a document by id
    Delete { index: String, id: String },
}

impl BulkOp {
    /// Id of the document this op targets.
    pub fn doc_id(&self) -> &str {
        match self {
            Self::Index { id, .. } | Self::Delete { id, .. } => id,
        }
    }
}

/// Refresh behavior requested for a bulk write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    /// Let the backend refresh on its own schedule
    #[default]
    None,
    /// Refresh the touched indices before returning
    Immediate,
}

/// Per-item failure from a bulk write. Successful items are not rolled
/// back when siblings fail.
#[derive(Debug, Clone)]
pub struct BulkItemError {
    /// Id of the failed document
    pub id: String,
    /// Backend-reported reason
    pub reason: String,
}

/// Outcome of a bulk write.
#[derive(Debug, Clone, Default)]
pub struct BulkResponse {
    /// Items that failed; empty means full success
    pub errors: Vec<BulkItemError>,
}

/// The search backend as consumed by the cluster.
///
/// Implementations own transport, authentication, timeouts, and retry
/// policy; a timed-out call surfaces as a recoverable
/// [`StoreError::Backend`].
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// List indices whose name starts with `prefix`.
    async fn list_indices(&self, prefix: &str) -> Result<Vec<IndexInfo>, StoreError>;

    /// Create an index. Fails if the name is already taken.
    async fn create_index(
        &self,
        request: CreateIndexRequest,
    ) -> Result<CreateIndexResponse, StoreError>;

    /// Delete an index.
    async fn delete_index(&self, name: &str) -> Result<(), StoreError>;

    /// Replace an index's persisted metadata.
    async fn put_index_meta(
        &self,
        name: &str,
        meta: HashMap<String, Value>,
    ) -> Result<(), StoreError>;

    /// Execute a compiled search request.
    ///
    /// Aggregation buckets come back ordered count descending, ties
    /// broken by key ascending, as [`TermsAggregation`] requires.
    async fn search(&self, request: SearchRequest) -> Result<SearchResponse, StoreError>;

    /// Execute a batch of write operations.
    async fn bulk_write(
        &self,
        ops: Vec<BulkOp>,
        refresh: RefreshPolicy,
    ) -> Result<BulkResponse, StoreError>;
}

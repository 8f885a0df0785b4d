//! Result normalization.
//!
//! Converts a raw backend [`SearchResponse`] into a typed
//! [`QueryResult`]: documents are decoded polymorphically through the
//! registry, totals and timings are copied verbatim, and aggregation
//! buckets are rebuilt with reserved-name sentinels stripped.

use std::time::Duration;

use serde_json::Value;

use crate::backend::{AggregationResult, SearchResponse};
use crate::document::{Document, DocumentRegistry};
use crate::error::StoreError;
use crate::query::compiler::{BUCKET_MIN_DOC_COUNT, RESERVED_KEY_SENTINEL};

/// One group produced by a terms aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    /// Field the aggregation grouped on (sentinel already stripped)
    pub field: String,
    /// The grouping key's display value
    pub value: String,
    /// Number of documents in the group
    pub count: u64,
    /// Nested buckets for multi-level aggregations
    pub buckets: Vec<Bucket>,
}

/// A typed query result.
#[derive(Debug)]
pub struct QueryResult {
    /// Decoded documents
    pub documents: Vec<Box<dyn Document>>,
    /// Total matching count before pagination
    pub total: u64,
    /// Backend-reported execution time
    pub elapsed: Duration,
    /// Aggregation buckets
    pub buckets: Vec<Bucket>,
}

fn key_display(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Rebuild the bucket tree for one aggregation, stripping the reserved
/// sentinel and dropping buckets below the minimum document count. The
/// compiler already asks the backend for the same minimum; the second
/// filter here stays deliberately (see DESIGN.md).
fn build_buckets(aggregation: &AggregationResult) -> Vec<Bucket> {
    let field = aggregation
        .name
        .strip_prefix(RESERVED_KEY_SENTINEL)
        .unwrap_or(&aggregation.name)
        .to_string();

    aggregation
        .buckets
        .iter()
        .filter(|bucket| bucket.doc_count >= BUCKET_MIN_DOC_COUNT)
        .map(|bucket| Bucket {
            field: field.clone(),
            value: key_display(&bucket.key),
            count: bucket.doc_count,
            buckets: bucket.aggregations.iter().flat_map(build_buckets).collect(),
        })
        .collect()
}

/// Normalize a backend response into a typed result.
pub fn normalize(
    response: SearchResponse,
    registry: &DocumentRegistry,
) -> Result<QueryResult, StoreError> {
    let mut documents = Vec::with_capacity(response.hits.len());
    for hit in response.hits {
        documents.push(registry.deserialize(hit.source)?);
    }

    let buckets = response.aggregations.iter().flat_map(build_buckets).collect();

    Ok(QueryResult {
        documents,
        total: response.total,
        elapsed: Duration::from_millis(response.took_millis),
        buckets,
    })
}

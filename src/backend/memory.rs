// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-process search backend.
//!
//! Executes compiled [`SearchRequest`]s against JSON documents held in a
//! `DashMap`, with the same observable semantics a real cluster client
//! provides: keyword/sort suffix resolution, dotted-path traversal,
//! conjunctive filtering, sorting, pagination, projection, and terms
//! aggregations with a minimum document count. Used by the test suites
//! and as the reference semantics of the [`SearchBackend`] contract.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use super::client::{
    AggregationResult, BulkItemError, BulkOp, BulkResponse, CreateIndexRequest,
    CreateIndexResponse, Hit, IndexInfo, Predicate, RangeBound, RawBucket, RefreshPolicy,
    SearchBackend, SearchRequest, SearchResponse, TermsAggregation,
};
use crate::error::StoreError;
use crate::schema::{Field, KEYWORD_SUFFIX, SORT_SUFFIX};

#[derive(Debug, Clone)]
struct IndexRecord {
    aliases: Vec<String>,
    mapping: Vec<Field>,
    meta: HashMap<String, Value>,
    docs: BTreeMap<String, Value>,
}

/// DashMap-backed backend holding whole indices in memory.
#[derive(Default)]
pub struct MemoryBackend {
    indices: DashMap<String, IndexRecord>,
}

impl MemoryBackend {
    /// Empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held by an index.
    pub fn doc_count(&self, index: &str) -> usize {
        self.indices
            .get(index)
            .map(|record| record.docs.len())
            .unwrap_or(0)
    }

    /// Number of indices.
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}

/// Strip the keyword/sort projection suffix back to the base path the
/// raw document actually stores.
fn base_path(field: &str) -> &str {
    field
        .strip_suffix(&format!(".{KEYWORD_SUFFIX}"))
        .or_else(|| field.strip_suffix(&format!(".{SORT_SUFFIX}")))
        .unwrap_or(field)
}

/// Walk a dotted path into a JSON object.
fn lookup<'a>(doc: &'a Value, field: &str) -> Option<&'a Value> {
    let mut current = doc;
    for segment in base_path(field).split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Order two JSON scalars: numerically when both are numeric, otherwise
/// by string form. Absent values sort first. `fold_case` compares the
/// string forms lowercased, matching the lowercase normalizer indices
/// are created with.
fn compare_values(a: Option<&Value>, b: Option<&Value>, fold_case: bool) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ if fold_case => value_text(a)
                .to_lowercase()
                .cmp(&value_text(b).to_lowercase()),
            _ => value_text(a).cmp(&value_text(b)),
        },
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn term_matches(actual: &Value, expected: &Value) -> bool {
    if let (Some(a), Some(b)) = (as_f64(actual), as_f64(expected)) {
        return a == b;
    }
    match (actual, expected) {
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Array(items), _) => items.iter().any(|item| term_matches(item, expected)),
        _ => value_text(actual) == value_text(expected),
    }
}

fn within_bound(actual: &Value, bound: &RangeBound, lower: bool) -> bool {
    let ord = compare_values(Some(actual), Some(&bound.value), false);
    match (lower, bound.inclusive) {
        (true, true) => ord != Ordering::Less,
        (true, false) => ord == Ordering::Greater,
        (false, true) => ord != Ordering::Greater,
        (false, false) => ord == Ordering::Less,
    }
}

fn text_tokens(value: &Value) -> Vec<String> {
    value_text(value)
        .split_whitespace()
        .map(str::to_lowercase)
        .collect()
}

fn matches(doc: &Value, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::MatchAll => true,
        Predicate::Term { field, value } => {
            lookup(doc, field).is_some_and(|actual| term_matches(actual, value))
        }
        Predicate::Range { field, lower, upper } => lookup(doc, field).is_some_and(|actual| {
            lower
                .as_ref()
                .map_or(true, |bound| within_bound(actual, bound, true))
                && upper
                    .as_ref()
                    .map_or(true, |bound| within_bound(actual, bound, false))
        }),
        Predicate::Phrase { field, phrase } => lookup(doc, field).is_some_and(|actual| {
            value_text(actual)
                .to_lowercase()
                .contains(&phrase.to_lowercase())
        }),
        Predicate::AnyWord { field, tokens } => lookup(doc, field).is_some_and(|actual| {
            let doc_tokens = text_tokens(actual);
            tokens
                .iter()
                .any(|token| doc_tokens.contains(&token.to_lowercase()))
        }),
        Predicate::Bool { must, must_not } => {
            must.iter().all(|p| matches(doc, p)) && !must_not.iter().any(|p| matches(doc, p))
        }
    }
}

fn project(source: &Value, allowed: &[String]) -> Value {
    let Value::Object(map) = source else {
        return source.clone();
    };
    let retained: serde_json::Map<String, Value> = map
        .iter()
        .filter(|(key, _)| {
            allowed.iter().any(|allowed_field| {
                allowed_field == *key || allowed_field.starts_with(&format!("{key}."))
            })
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Value::Object(retained)
}

fn run_aggregation(docs: &[&Value], aggregation: &TermsAggregation) -> AggregationResult {
    let mut groups: BTreeMap<String, Vec<&Value>> = BTreeMap::new();
    for doc in docs {
        if let Some(value) = lookup(doc, &aggregation.field) {
            groups.entry(value_text(value)).or_default().push(*doc);
        }
    }

    let mut buckets: Vec<RawBucket> = groups
        .into_iter()
        .filter(|(_, members)| members.len() as u64 >= aggregation.min_doc_count)
        .map(|(key, members)| RawBucket {
            key: Value::String(key),
            doc_count: members.len() as u64,
            aggregations: aggregation
                .aggregations
                .iter()
                .map(|nested| run_aggregation(&members, nested))
                .collect(),
        })
        .collect();

    // Count descending, then key ascending.
    buckets.sort_by(|a, b| {
        b.doc_count
            .cmp(&a.doc_count)
            .then_with(|| value_text(&a.key).cmp(&value_text(&b.key)))
    });

    AggregationResult {
        name: aggregation.key.clone(),
        buckets,
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    async fn list_indices(&self, prefix: &str) -> Result<Vec<IndexInfo>, StoreError> {
        let mut infos: Vec<IndexInfo> = self
            .indices
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| IndexInfo {
                name: entry.key().clone(),
                aliases: entry.value().aliases.clone(),
                mapping: entry.value().mapping.clone(),
                meta: entry.value().meta.clone(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }

    async fn create_index(
        &self,
        request: CreateIndexRequest,
    ) -> Result<CreateIndexResponse, StoreError> {
        if self.indices.contains_key(&request.name) {
            return Err(StoreError::Backend(format!(
                "index '{}' already exists",
                request.name
            )));
        }
        self.indices.insert(
            request.name.clone(),
            IndexRecord {
                aliases: Vec::new(),
                mapping: request.mapping,
                meta: request.meta,
                docs: BTreeMap::new(),
            },
        );
        Ok(CreateIndexResponse {
            resolved_name: request.name,
        })
    }

    async fn delete_index(&self, name: &str) -> Result<(), StoreError> {
        self.indices
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::Backend(format!("index '{name}' does not exist")))
    }

    async fn put_index_meta(
        &self,
        name: &str,
        meta: HashMap<String, Value>,
    ) -> Result<(), StoreError> {
        let mut record = self
            .indices
            .get_mut(name)
            .ok_or_else(|| StoreError::Backend(format!("index '{name}' does not exist")))?;
        record.meta = meta;
        Ok(())
    }

    async fn search(&self, request: SearchRequest) -> Result<SearchResponse, StoreError> {
        let started = Instant::now();

        // Empty target list means global search across every index.
        let targets: Vec<String> = if request.indices.is_empty() {
            self.indices.iter().map(|e| e.key().clone()).collect()
        } else {
            request.indices.clone()
        };

        let mut matched: Vec<(String, String, Value)> = Vec::new();
        for target in &targets {
            let Some(record) = self.indices.get(target) else {
                return Err(StoreError::Backend(format!(
                    "index '{target}' does not exist"
                )));
            };
            for (id, doc) in &record.docs {
                if matches(doc, &request.predicate) {
                    matched.push((target.clone(), id.clone(), doc.clone()));
                }
            }
        }

        for clause in request.sort.iter().rev() {
            // `.sort` targets the lowercase-normalized projection.
            let fold_case = clause.field.ends_with(&format!(".{SORT_SUFFIX}"));
            matched.sort_by(|a, b| {
                let ord = compare_values(
                    lookup(&a.2, &clause.field),
                    lookup(&b.2, &clause.field),
                    fold_case,
                );
                if clause.ascending { ord } else { ord.reverse() }
            });
        }

        let total = matched.len() as u64;
        let doc_refs: Vec<&Value> = matched.iter().map(|(_, _, doc)| doc).collect();
        let aggregations = request
            .aggregations
            .iter()
            .map(|aggregation| run_aggregation(&doc_refs, aggregation))
            .collect();

        let hits = matched
            .iter()
            .skip(request.from)
            .take(request.size)
            .map(|(index, id, doc)| Hit {
                index: index.clone(),
                id: id.clone(),
                source: match &request.source_fields {
                    Some(allowed) => project(doc, allowed),
                    None => doc.clone(),
                },
            })
            .collect();

        Ok(SearchResponse {
            hits,
            total,
            took_millis: started.elapsed().as_millis() as u64,
            aggregations,
        })
    }

    async fn bulk_write(
        &self,
        ops: Vec<BulkOp>,
        _refresh: RefreshPolicy,
    ) -> Result<BulkResponse, StoreError> {
        let mut errors = Vec::new();
        for op in ops {
            match op {
                BulkOp::Index {
                    index,
                    id,
                    document,
                } => match self.indices.get_mut(&index) {
                    Some(mut record) => {
                        record.docs.insert(id, document);
                    }
                    None => errors.push(BulkItemError {
                        id,
                        reason: format!("index '{index}' does not exist"),
                    }),
                },
                BulkOp::Delete { index, id } => match self.indices.get_mut(&index) {
                    Some(mut record) => {
                        record.docs.remove(&id);
                    }
                    None => errors.push(BulkItemError {
                        id,
                        reason: format!("index '{index}' does not exist"),
                    }),
                },
            }
        }
        Ok(BulkResponse { errors })
    }
}

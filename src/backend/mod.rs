// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search backend contract and implementations.
//!
//! The engine consumes the backend through [`SearchBackend`]; it never
//! re-specifies the backend's storage, sharding, or query execution.
//! [`MemoryBackend`] is a full in-process implementation used for tests
//! and as the reference semantics of the contract.

mod client;
mod memory;

pub use client::{
    AggregationResult, BulkItemError, BulkOp, BulkResponse, CreateIndexRequest, CreateIndexResponse,
    Hit, IndexInfo, Predicate, RangeBound, RawBucket, RefreshPolicy, SearchBackend, SearchRequest,
    SearchResponse, SortClause, TermsAggregation,
};
pub use memory::MemoryBackend;

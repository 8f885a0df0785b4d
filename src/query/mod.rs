// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query model, compiler, and result normalization.
//!
//! # Architecture
//!
//! ```text
//! QueryCriteria (typed request)
//!     │  comparator registry builds one predicate per filter
//!     ▼
//! compile() → SearchRequest (backend-native AST)
//!     │  executed by a SearchBackend
//!     ▼
//! normalize() → QueryResult (typed documents + buckets)
//! ```

mod comparator;
mod compiler;
mod criteria;
mod results;

pub use comparator::{build_predicate, Comparator, Filter, RANGE_DELIMITER};
pub use compiler::{
    compile, ALWAYS_RETURNED_FIELDS, BUCKET_MIN_DOC_COUNT, RESERVED_KEY_SENTINEL,
    RESERVED_RESPONSE_FIELDS,
};
pub use criteria::{QueryCriteria, SortField, DEFAULT_TAKE};
pub use results::{normalize, Bucket, QueryResult};

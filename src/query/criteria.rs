//! Typed query request.
//!
//! # Example
//!
//! ```
//! use store_engine::query::{Comparator, QueryCriteria};
//!
//! let criteria = QueryCriteria::for_type("person")
//!     .filter("last_name", Comparator::Equal, "Smith")
//!     .sort("last_name", true)
//!     .take(25)
//!     .bucket("last_name");
//! assert_eq!(criteria.skip, 0);
//! ```

use serde::{Deserialize, Serialize};

use super::comparator::{Comparator, Filter};

/// Default page size when the caller does not set one.
pub const DEFAULT_TAKE: usize = 10;

/// One sort directive. Ordinals order the clauses; ties keep insertion
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortField {
    /// Dotted field name as the caller knows it
    pub field_name: String,
    /// Position among the sort clauses
    pub ordinal: u32,
    /// Ascending or descending
    pub ascending: bool,
}

/// An abstract query against one document type or an explicit set of
/// stores.
///
/// `indices` is resolved through the catalog before compilation; it is
/// only empty at execution time when a global search is intended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryCriteria {
    /// Logical document type to search; resolved to store names by the
    /// catalog when set
    pub document_type: Option<String>,
    /// Explicit target store names
    #[serde(default)]
    pub indices: Vec<String>,
    /// Filters, compiled into a conjunction
    #[serde(default)]
    pub filters: Vec<Filter>,
    /// Sort directives
    #[serde(default)]
    pub sort_fields: Vec<SortField>,
    /// Documents to skip (default 0)
    #[serde(default)]
    pub skip: usize,
    /// Documents to return (default 10)
    #[serde(default = "default_take")]
    pub take: usize,
    /// Fields to project; empty means the always-returned minimal set
    #[serde(default)]
    pub return_fields: Vec<String>,
    /// Fields to bucket on with terms aggregations
    #[serde(default)]
    pub bucket_fields: Vec<String>,
}

fn default_take() -> usize {
    DEFAULT_TAKE
}

impl QueryCriteria {
    /// Criteria targeting a logical document type.
    pub fn for_type(document_type: impl Into<String>) -> Self {
        Self {
            document_type: Some(document_type.into()),
            ..Self::empty()
        }
    }

    /// Criteria targeting explicit store names.
    pub fn for_stores(indices: Vec<String>) -> Self {
        Self {
            indices,
            ..Self::empty()
        }
    }

    /// Criteria with no target: a global search.
    pub fn global() -> Self {
        Self::empty()
    }

    fn empty() -> Self {
        Self {
            document_type: None,
            indices: Vec::new(),
            filters: Vec::new(),
            sort_fields: Vec::new(),
            skip: 0,
            take: DEFAULT_TAKE,
            return_fields: Vec::new(),
            bucket_fields: Vec::new(),
        }
    }

    /// Add a filter.
    pub fn filter(
        mut self,
        field: impl Into<String>,
        comparator: Comparator,
        value: impl Into<String>,
    ) -> Self {
        self.filters.push(Filter::new(field, comparator, value));
        self
    }

    /// Add a sort directive after any existing ones.
    pub fn sort(mut self, field: impl Into<String>, ascending: bool) -> Self {
        let ordinal = self.sort_fields.len() as u32;
        self.sort_fields.push(SortField {
            field_name: field.into(),
            ordinal,
            ascending,
        });
        self
    }

    /// Set the number of documents to skip.
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Set the number of documents to return.
    pub fn take(mut self, take: usize) -> Self {
        self.take = take;
        self
    }

    /// Request a field in the result projection.
    pub fn return_field(mut self, field: impl Into<String>) -> Self {
        self.return_fields.push(field.into());
        self
    }

    /// Request a terms aggregation on a field.
    pub fn bucket(mut self, field: impl Into<String>) -> Self {
        self.bucket_fields.push(field.into());
        self
    }

    /// Union a resolved store name in, case-insensitively and
    /// idempotently.
    pub fn add_index(&mut self, name: &str) {
        if !self
            .indices
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(name))
        {
            self.indices.push(name.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let criteria = QueryCriteria::for_type("person");
        assert_eq!(criteria.skip, 0);
        assert_eq!(criteria.take, DEFAULT_TAKE);
        assert!(criteria.filters.is_empty());
    }

    #[test]
    fn test_sort_ordinals_follow_insertion() {
        let criteria = QueryCriteria::for_type("person")
            .sort("last_name", true)
            .sort("age", false);
        assert_eq!(criteria.sort_fields[0].ordinal, 0);
        assert_eq!(criteria.sort_fields[1].ordinal, 1);
    }

    #[test]
    fn test_add_index_is_case_insensitive_union() {
        let mut criteria = QueryCriteria::for_stores(vec!["app_person".into()]);
        criteria.add_index("APP_PERSON");
        criteria.add_index("app_company");
        assert_eq!(criteria.indices, vec!["app_person", "app_company"]);
    }

    #[test]
    fn test_take_deserializes_to_default() {
        let criteria: QueryCriteria =
            serde_json::from_str(r#"{"document_type":"person"}"#).unwrap();
        assert_eq!(criteria.take, DEFAULT_TAKE);
        assert_eq!(criteria.skip, 0);
    }
}

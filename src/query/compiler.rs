// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Criteria compiler.
//!
//! Renders a [`QueryCriteria`] into a backend-native [`SearchRequest`].
//! Compilation is pure and synchronous: index resolution against the
//! catalog happens before this point, and no network I/O happens here.

use convert_case::{Case, Casing};

use crate::backend::{Predicate, SearchRequest, SortClause, TermsAggregation};
use crate::error::StoreError;
use crate::query::comparator::build_predicate;
use crate::query::criteria::QueryCriteria;
use crate::schema::{find_field, Field};

/// Sentinel prefixed to an aggregation key whose field name collides with
/// the response envelope's own vocabulary; stripped during normalization.
pub const RESERVED_KEY_SENTINEL: char = '@';

/// Response-envelope names a caller-chosen bucket field must never shadow.
pub const RESERVED_RESPONSE_FIELDS: &[&str] = &[
    "key",
    "value",
    "count",
    "doc_count",
    "buckets",
    "total",
    "took",
    "hits",
    "aggregations",
];

/// Fields included in every projection: the identifier, the store name,
/// and the type discriminator.
pub const ALWAYS_RETURNED_FIELDS: &[&str] = &["id", "index_name", "type"];

/// Minimum document count for an aggregation bucket to be returned;
/// singleton buckets are suppressed.
pub const BUCKET_MIN_DOC_COUNT: u64 = 2;

/// Compile criteria into a backend request against the given schema
/// fields (the union of the target stores' field trees).
pub fn compile(criteria: &QueryCriteria, fields: &[Field]) -> Result<SearchRequest, StoreError> {
    Ok(SearchRequest {
        indices: criteria.indices.clone(),
        predicate: compile_filters(criteria, fields)?,
        sort: compile_sort(criteria, fields),
        from: criteria.skip,
        size: criteria.take,
        source_fields: Some(compile_projection(criteria)),
        aggregations: compile_buckets(criteria, fields),
    })
}

/// Empty filter set compiles to match-all; N filters compile to a
/// conjunction of exactly N predicates. There is no default disjunction
/// or precedence grouping.
fn compile_filters(criteria: &QueryCriteria, fields: &[Field]) -> Result<Predicate, StoreError> {
    if criteria.filters.is_empty() {
        return Ok(Predicate::MatchAll);
    }

    let must = criteria
        .filters
        .iter()
        .map(|filter| build_predicate(filter, fields))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Predicate::Bool {
        must,
        must_not: Vec::new(),
    })
}

fn compile_sort(criteria: &QueryCriteria, fields: &[Field]) -> Vec<SortClause> {
    let mut sort_fields = criteria.sort_fields.clone();
    sort_fields.sort_by_key(|s| s.ordinal);

    sort_fields
        .into_iter()
        .map(|s| {
            let field = match find_field(fields, &s.field_name) {
                Some(field) => field.sort_name(),
                None => s.field_name,
            };
            SortClause {
                field,
                ascending: s.ascending,
            }
        })
        .collect()
}

/// Always-returned minimal set plus any requested fields, normalized to
/// the backend's snake_case convention.
fn compile_projection(criteria: &QueryCriteria) -> Vec<String> {
    let mut projected: Vec<String> = ALWAYS_RETURNED_FIELDS
        .iter()
        .map(|s| s.to_string())
        .collect();

    for requested in &criteria.return_fields {
        let normalized = requested.to_case(Case::Snake);
        if !projected.contains(&normalized) {
            projected.push(normalized);
        }
    }

    projected
}

fn compile_buckets(criteria: &QueryCriteria, fields: &[Field]) -> Vec<TermsAggregation> {
    criteria
        .bucket_fields
        .iter()
        .map(|bucket_field| {
            let key = if RESERVED_RESPONSE_FIELDS.contains(&bucket_field.as_str()) {
                format!("{RESERVED_KEY_SENTINEL}{bucket_field}")
            } else {
                bucket_field.clone()
            };
            let field = match find_field(fields, bucket_field) {
                Some(field) => field.keyword_name(),
                None => bucket_field.clone(),
            };
            TermsAggregation {
                key,
                field,
                min_doc_count: BUCKET_MIN_DOC_COUNT,
                aggregations: Vec::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Comparator;

    fn person_fields() -> Vec<Field> {
        vec![Field::text("last_name"), Field::integer("age")]
    }

    #[test]
    fn test_no_filters_compiles_to_match_all() {
        let criteria = QueryCriteria::for_stores(vec!["app_person".into()]);
        let request = compile(&criteria, &person_fields()).unwrap();
        assert_eq!(request.predicate, Predicate::MatchAll);
    }

    #[test]
    fn test_n_filters_compile_to_n_ary_conjunction() {
        let criteria = QueryCriteria::for_stores(vec!["app_person".into()])
            .filter("last_name", Comparator::Equal, "Smith")
            .filter("age", Comparator::GreaterThan, "18")
            .filter("age", Comparator::LessThan, "65");
        let request = compile(&criteria, &person_fields()).unwrap();
        match request.predicate {
            Predicate::Bool { must, must_not } => {
                assert_eq!(must.len(), 3);
                assert!(must_not.is_empty());
            }
            other => panic!("expected Bool, got {other:?}"),
        }
    }

    #[test]
    fn test_sort_ordered_by_ordinal_and_suffixed() {
        let mut criteria = QueryCriteria::for_stores(vec!["app_person".into()])
            .sort("age", false)
            .sort("last_name", true);
        // Swap ordinals so declaration order and ordinal order disagree.
        criteria.sort_fields[0].ordinal = 1;
        criteria.sort_fields[1].ordinal = 0;

        let request = compile(&criteria, &person_fields()).unwrap();
        assert_eq!(request.sort[0].field, "last_name.sort");
        assert!(request.sort[0].ascending);
        assert_eq!(request.sort[1].field, "age");
    }

    #[test]
    fn test_default_projection_is_minimal_set() {
        let criteria = QueryCriteria::for_stores(vec!["app_person".into()]);
        let request = compile(&criteria, &person_fields()).unwrap();
        assert_eq!(
            request.source_fields.unwrap(),
            vec!["id", "index_name", "type"]
        );
    }

    #[test]
    fn test_requested_projection_is_case_normalized() {
        let criteria =
            QueryCriteria::for_stores(vec!["app_person".into()]).return_field("lastName");
        let request = compile(&criteria, &person_fields()).unwrap();
        let projected = request.source_fields.unwrap();
        assert!(projected.contains(&"last_name".to_string()));
        assert!(projected.contains(&"id".to_string()));
    }

    #[test]
    fn test_bucket_aggregation_defaults() {
        let criteria = QueryCriteria::for_stores(vec!["app_person".into()]).bucket("last_name");
        let request = compile(&criteria, &person_fields()).unwrap();
        assert_eq!(request.aggregations.len(), 1);
        let agg = &request.aggregations[0];
        assert_eq!(agg.key, "last_name");
        assert_eq!(agg.field, "last_name.keyword");
        assert_eq!(agg.min_doc_count, BUCKET_MIN_DOC_COUNT);
    }

    #[test]
    fn test_reserved_bucket_field_gets_sentinel() {
        let criteria = QueryCriteria::for_stores(vec!["app_person".into()]).bucket("count");
        let request = compile(&criteria, &person_fields()).unwrap();
        assert_eq!(request.aggregations[0].key, "@count");
        assert_eq!(request.aggregations[0].field, "count");
    }

    #[test]
    fn test_pagination_defaults() {
        let criteria = QueryCriteria::for_stores(vec!["app_person".into()]);
        let request = compile(&criteria, &person_fields()).unwrap();
        assert_eq!(request.from, 0);
        assert_eq!(request.size, 10);
    }
}

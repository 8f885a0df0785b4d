// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Comparator registry.
//!
//! A [`Comparator`] is a named predicate kind from a closed set; together
//! with a target field and a literal value it builds one backend
//! [`Predicate`]. Comparators carry no state.
//!
//! Text-targeting comparators resolve the concrete backend field through
//! the schema's keyword/sort suffix rules, so callers never type
//! backend-specific suffixes.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::{Predicate, RangeBound};
use crate::error::StoreError;
use crate::schema::{Field, FieldType};

/// Literal delimiter splitting the lower and upper bound of a `Between`
/// value, e.g. `"5|||50"`.
pub const RANGE_DELIMITER: &str = "|||";

/// Closed set of predicate kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Between,
    FullPhrase,
    AnyWord,
    NotAnyWord,
}

impl Comparator {
    /// Stable machine token.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Equal => "eq",
            Self::NotEqual => "ne",
            Self::GreaterThan => "gt",
            Self::GreaterThanOrEqual => "gte",
            Self::LessThan => "lt",
            Self::LessThanOrEqual => "lte",
            Self::Between => "between",
            Self::FullPhrase => "phrase",
            Self::AnyWord => "any",
            Self::NotAnyWord => "not_any",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Equal => "Equal",
            Self::NotEqual => "Not Equal",
            Self::GreaterThan => "Greater Than",
            Self::GreaterThanOrEqual => "Greater Than Or Equal",
            Self::LessThan => "Less Than",
            Self::LessThanOrEqual => "Less Than Or Equal",
            Self::Between => "Between",
            Self::FullPhrase => "Full Phrase",
            Self::AnyWord => "Any Word",
            Self::NotAnyWord => "Not Any Word",
        }
    }

    /// All comparators, in declaration order.
    pub fn all() -> &'static [Comparator] {
        &[
            Self::Equal,
            Self::NotEqual,
            Self::GreaterThan,
            Self::GreaterThanOrEqual,
            Self::LessThan,
            Self::LessThanOrEqual,
            Self::Between,
            Self::FullPhrase,
            Self::AnyWord,
            Self::NotAnyWord,
        ]
    }
}

impl std::fmt::Display for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One filter of a query: a field, a literal value, and the comparator
/// relating them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Dotted field name as the caller knows it
    pub field: String,
    /// Literal value; `Between` values carry the [`RANGE_DELIMITER`]
    pub value: String,
    /// Predicate kind
    pub comparator: Comparator,
}

impl Filter {
    /// Build a filter.
    pub fn new(
        field: impl Into<String>,
        comparator: Comparator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            comparator,
        }
    }
}

/// Resolved view of a filter's target field. Fields absent from the
/// schema fall back to raw keyword targeting.
struct ResolvedField {
    exact_name: String,
    analyzed_name: String,
    field_type: FieldType,
}

fn resolve(field_name: &str, fields: &[Field]) -> ResolvedField {
    match crate::schema::find_field(fields, field_name) {
        Some(field) => ResolvedField {
            exact_name: field.keyword_name(),
            analyzed_name: field.name.clone(),
            field_type: field.field_type,
        },
        None => ResolvedField {
            exact_name: field_name.to_string(),
            analyzed_name: field_name.to_string(),
            field_type: FieldType::Keyword,
        },
    }
}

/// Parse a literal according to the resolved field type. Unparseable
/// literals degrade to strings; the backend decides whether they match.
fn typed_value(raw: &str, field_type: FieldType) -> Value {
    match field_type {
        FieldType::Integer => raw
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        FieldType::Float => raw
            .trim()
            .parse::<f64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        FieldType::Boolean => match raw.trim().to_lowercase().as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(raw.to_string()),
        },
        FieldType::Date => {
            // Normalized to RFC 3339 so string ordering matches time ordering.
            match DateTime::parse_from_rfc3339(raw.trim()) {
                Ok(dt) => Value::String(dt.to_rfc3339()),
                Err(_) => Value::String(raw.to_string()),
            }
        }
        _ => Value::String(raw.to_string()),
    }
}

fn range_predicate(
    filter: &Filter,
    resolved: &ResolvedField,
    lower: Option<RangeBound>,
    upper: Option<RangeBound>,
) -> Result<Predicate, StoreError> {
    if !resolved.field_type.is_orderable() {
        return Err(StoreError::UnsupportedComparator {
            comparator: filter.comparator.display_name().to_string(),
            field: filter.field.clone(),
            field_type: resolved.field_type.to_string(),
        });
    }
    Ok(Predicate::Range {
        field: resolved.analyzed_name.clone(),
        lower,
        upper,
    })
}

fn tokens_of(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

/// Build the backend predicate for one filter.
///
/// Never panics for well-formed inputs; malformed `Between` values fail
/// with [`StoreError::MalformedRangeValue`] and range comparators against
/// non-orderable fields fail with [`StoreError::UnsupportedComparator`].
pub fn build_predicate(filter: &Filter, fields: &[Field]) -> Result<Predicate, StoreError> {
    let resolved = resolve(&filter.field, fields);

    match filter.comparator {
        Comparator::Equal => Ok(Predicate::Term {
            field: resolved.exact_name,
            value: typed_value(&filter.value, resolved.field_type),
        }),
        Comparator::NotEqual => Ok(Predicate::Bool {
            must: Vec::new(),
            must_not: vec![Predicate::Term {
                field: resolved.exact_name,
                value: typed_value(&filter.value, resolved.field_type),
            }],
        }),
        Comparator::GreaterThan => {
            let bound = RangeBound::exclusive(typed_value(&filter.value, resolved.field_type));
            range_predicate(filter, &resolved, Some(bound), None)
        }
        Comparator::GreaterThanOrEqual => {
            let bound = RangeBound::inclusive(typed_value(&filter.value, resolved.field_type));
            range_predicate(filter, &resolved, Some(bound), None)
        }
        Comparator::LessThan => {
            let bound = RangeBound::exclusive(typed_value(&filter.value, resolved.field_type));
            range_predicate(filter, &resolved, None, Some(bound))
        }
        Comparator::LessThanOrEqual => {
            let bound = RangeBound::inclusive(typed_value(&filter.value, resolved.field_type));
            range_predicate(filter, &resolved, None, Some(bound))
        }
        Comparator::Between => {
            let parts: Vec<&str> = filter.value.split(RANGE_DELIMITER).collect();
            if parts.len() != 2 {
                return Err(StoreError::MalformedRangeValue(filter.value.clone()));
            }
            let lower = RangeBound::inclusive(typed_value(parts[0], resolved.field_type));
            let upper = RangeBound::inclusive(typed_value(parts[1], resolved.field_type));
            range_predicate(filter, &resolved, Some(lower), Some(upper))
        }
        Comparator::FullPhrase => Ok(Predicate::Phrase {
            field: resolved.analyzed_name,
            phrase: filter.value.clone(),
        }),
        Comparator::AnyWord => Ok(Predicate::AnyWord {
            field: resolved.analyzed_name,
            tokens: tokens_of(&filter.value),
        }),
        Comparator::NotAnyWord => Ok(Predicate::Bool {
            must: Vec::new(),
            must_not: vec![Predicate::AnyWord {
                field: resolved.analyzed_name,
                tokens: tokens_of(&filter.value),
            }],
        }),
    }
}

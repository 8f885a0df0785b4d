// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Field tree describing one store's searchable shape.
//!
//! Fields are recursive: a text field carries `keyword` and `sort`
//! sub-fields so exact matching and sorting target the right backend
//! projection, and object fields nest their children. Names are dotted
//! paths, unique within their parent.
//!
//! # Example
//!
//! ```
//! use store_engine::schema::Field;
//!
//! let field = Field::text("last_name");
//! assert_eq!(field.keyword_name(), "last_name.keyword");
//! assert_eq!(field.sort_name(), "last_name.sort");
//! assert!(field.has_keyword());
//! ```

use serde::{Deserialize, Serialize};

/// Suffix of the exact-match projection of a text field.
pub const KEYWORD_SUFFIX: &str = "keyword";

/// Suffix of the lowercase-normalized sortable projection of a text field.
pub const SORT_SUFFIX: &str = "sort";

/// Backend field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Analyzed full-text field
    Text,
    /// Exact-match (un-analyzed) field
    Keyword,
    /// 64-bit integer field
    Integer,
    /// Double-precision float field
    Float,
    /// Date field (RFC 3339 on the wire)
    Date,
    /// Boolean field
    Boolean,
    /// Nested object with child fields
    Object,
}

impl FieldType {
    /// Whether range comparators apply to this type.
    pub fn is_orderable(self) -> bool {
        matches!(self, Self::Integer | Self::Float | Self::Date)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Keyword => write!(f, "keyword"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Date => write!(f, "date"),
            Self::Boolean => write!(f, "boolean"),
            Self::Object => write!(f, "object"),
        }
    }
}

/// One node in a store's field tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Dotted path name, unique within the parent's children
    pub name: String,
    /// Backend type of this field
    pub field_type: FieldType,
    /// Relevance boost applied at query time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
    /// Whether the field may be used as a filter target
    #[serde(default = "default_true")]
    pub filterable: bool,
    /// Whether the field is returned in result projections
    #[serde(default = "default_true")]
    pub include_in_results: bool,
    /// Human-readable label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Child fields (sub-fields of text, properties of objects)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
}

fn default_true() -> bool {
    true
}

impl Field {
    /// Create a field with no children.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            boost: None,
            filterable: true,
            include_in_results: true,
            label: None,
            fields: Vec::new(),
        }
    }

    /// Text field with the implicit `keyword` and `sort` sub-fields.
    pub fn text(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut field = Self::new(name.clone(), FieldType::Text);
        field.fields.push(Self::new(
            format!("{name}.{KEYWORD_SUFFIX}"),
            FieldType::Keyword,
        ));
        field
            .fields
            .push(Self::new(format!("{name}.{SORT_SUFFIX}"), FieldType::Keyword));
        field
    }

    /// Integer field.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    /// Float field.
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Float)
    }

    /// Date field.
    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Date)
    }

    /// Boolean field.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    /// Keyword (un-analyzed) field.
    pub fn keyword(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Keyword)
    }

    /// Object field with the given children.
    pub fn object(name: impl Into<String>, children: Vec<Field>) -> Self {
        let mut field = Self::new(name, FieldType::Object);
        field.fields = children;
        field
    }

    /// Set a query-time boost.
    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost = Some(boost);
        self
    }

    /// Set a display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Mark the field as non-filterable.
    pub fn not_filterable(mut self) -> Self {
        self.filterable = false;
        self
    }

    /// Exclude the field from result projections.
    pub fn excluded_from_results(mut self) -> Self {
        self.include_in_results = false;
        self
    }

    /// Whether this is the keyword projection of some text field.
    pub fn is_keyword_subfield(&self) -> bool {
        self.name
            .rsplit('.')
            .next()
            .is_some_and(|leaf| leaf == KEYWORD_SUFFIX)
    }

    /// Whether this is the sort projection of some text field.
    pub fn is_sort_subfield(&self) -> bool {
        self.name
            .rsplit('.')
            .next()
            .is_some_and(|leaf| leaf == SORT_SUFFIX)
    }

    /// Whether this field or any descendant has a keyword projection.
    pub fn has_keyword(&self) -> bool {
        self.is_keyword_subfield() || self.fields.iter().any(Field::has_keyword)
    }

    /// Whether this field or any descendant has a sort projection.
    pub fn has_sort(&self) -> bool {
        self.is_sort_subfield() || self.fields.iter().any(Field::has_sort)
    }

    /// Whether this field or any descendant is filterable.
    pub fn has_filterable(&self) -> bool {
        self.filterable || self.fields.iter().any(Field::has_filterable)
    }

    /// Whether this field or any descendant is included in results.
    pub fn has_included(&self) -> bool {
        self.include_in_results || self.fields.iter().any(Field::has_included)
    }

    /// Concrete backend name for exact-match targeting.
    ///
    /// Text fields resolve to their keyword sub-field; everything else
    /// matches on the raw name.
    pub fn keyword_name(&self) -> String {
        match self.field_type {
            FieldType::Text => format!("{}.{KEYWORD_SUFFIX}", self.name),
            _ => self.name.clone(),
        }
    }

    /// Concrete backend name for sort targeting.
    pub fn sort_name(&self) -> String {
        match self.field_type {
            FieldType::Text => format!("{}.{SORT_SUFFIX}", self.name),
            _ => self.name.clone(),
        }
    }

    /// Flattened dotted-name closure of this field and all descendants.
    pub fn field_tree(&self) -> Vec<String> {
        let mut names = vec![self.name.clone()];
        for child in &self.fields {
            names.extend(child.field_tree());
        }
        names
    }

    /// Find a field by dotted name in this subtree.
    pub fn find(&self, name: &str) -> Option<&Field> {
        if self.name == name {
            return Some(self);
        }
        self.fields.iter().find_map(|child| child.find(name))
    }
}

/// Reconcile an authoritative field list with a backend-introspected one.
///
/// Right-biased union keyed by name: fields present in both keep the
/// `target` (caller-authoritative) version so deliberate metadata (boost,
/// label, filterable) survives; structurally new `source` fields are
/// appended. Child lists are merged recursively when both sides have
/// children. Idempotent.
pub fn merge_fields(target: &[Field], source: &[Field]) -> Vec<Field> {
    let mut merged: Vec<Field> = target.to_vec();

    for incoming in source {
        match merged.iter_mut().find(|f| f.name == incoming.name) {
            Some(existing) => {
                if !existing.fields.is_empty() && !incoming.fields.is_empty() {
                    existing.fields = merge_fields(&existing.fields, &incoming.fields);
                }
            }
            None => merged.push(incoming.clone()),
        }
    }

    merged
}

/// Look up a field by dotted name across a full field list.
pub fn find_field<'a>(fields: &'a [Field], name: &str) -> Option<&'a Field> {
    fields.iter().find_map(|f| f.find(name))
}

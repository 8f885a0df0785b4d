use thiserror::Error;

/// Errors surfaced by the store engine.
///
/// Validation failures (`MalformedIdentifier`, `MalformedRangeValue`,
/// `UnsupportedComparator`) are rejected before any backend call is made.
/// `Backend` wraps failures reported by the search backend itself; the
/// catalog is never mutated on a backend failure.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Malformed store identifier '{0}'")]
    MalformedIdentifier(String),

    #[error("Store '{0}' not found")]
    StoreNotFound(String),

    #[error("Schema for store '{store}' references unknown document type '{document_type}'")]
    SchemaResolution {
        store: String,
        document_type: String,
    },

    #[error("Comparator '{comparator}' cannot be applied to field '{field}' of type {field_type}")]
    UnsupportedComparator {
        comparator: String,
        field: String,
        field_type: String,
    },

    #[error("Malformed range value '{0}': expected exactly one '|||' delimiter")]
    MalformedRangeValue(String),

    #[error("Unknown document type discriminator '{0}'")]
    UnknownDocumentType(String),

    #[error("Search backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Backend(format!("serialization failure: {err}"))
    }
}

//! Store identifier.
//!
//! A [`StoreId`] names one logical store as a `(scope, moniker)` pair.
//! The physical index name is the lowercase join of the two components
//! with `'_'`, e.g. scope `tenant` + moniker `people` → `tenant_people`.
//! The separator is reserved: neither component may contain it, so the
//! string form parses back unambiguously.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Separator between scope and moniker in a store's canonical name.
pub const SEPARATOR: char = '_';

/// Canonical two-part identifier for a logical store.
///
/// Immutable once constructed; equality is structural on the two
/// components.
///
/// # Example
///
/// ```
/// use store_engine::StoreId;
///
/// let id = StoreId::new("tenant", "people").unwrap();
/// assert_eq!(id.name(), "tenant_people");
/// assert_eq!(StoreId::parse("tenant_people").unwrap(), id);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreId {
    scope: String,
    moniker: String,
}

impl StoreId {
    /// Build an id from scope and moniker.
    ///
    /// The moniker is required; neither component may contain the
    /// separator character.
    pub fn new(scope: impl Into<String>, moniker: impl Into<String>) -> Result<Self, StoreError> {
        let scope = scope.into();
        let moniker = moniker.into();

        if moniker.is_empty() {
            return Err(StoreError::MalformedIdentifier(format!(
                "{scope}{SEPARATOR}"
            )));
        }
        if scope.contains(SEPARATOR) || moniker.contains(SEPARATOR) {
            return Err(StoreError::MalformedIdentifier(format!(
                "{scope}{SEPARATOR}{moniker}"
            )));
        }

        Ok(Self { scope, moniker })
    }

    /// Parse a persisted canonical name back into its components.
    ///
    /// Fails with [`StoreError::MalformedIdentifier`] when the name
    /// contains more than one separator or the moniker part is empty.
    pub fn parse(name: &str) -> Result<Self, StoreError> {
        let mut parts = name.split(SEPARATOR);
        let first = parts.next().unwrap_or_default();
        match (parts.next(), parts.next()) {
            // No separator at all: the whole name is the moniker.
            (None, _) => Self::new("", first),
            (Some(moniker), None) => Self::new(first, moniker),
            (Some(_), Some(_)) => Err(StoreError::MalformedIdentifier(name.to_string())),
        }
    }

    /// The scope component (may be empty).
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// The moniker component (never empty).
    pub fn moniker(&self) -> &str {
        &self.moniker
    }

    /// Canonical lowercase name, used as the physical index name.
    pub fn name(&self) -> String {
        if self.scope.is_empty() {
            self.moniker.to_lowercase()
        } else {
            format!("{}{}{}", self.scope, SEPARATOR, self.moniker).to_lowercase()
        }
    }
}

impl std::fmt::Display for StoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

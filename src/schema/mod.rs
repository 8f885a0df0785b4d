// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Store schemas.
//!
//! A store's searchable shape is a recursive tree of [`Field`]s; the
//! persisted description of a store (fields plus display/behavioral
//! metadata) is a [`StoreSchema`]. The catalog composes both into
//! immutable [`Store`] values.

mod field;
mod store_schema;

pub use field::{find_field, merge_fields, Field, FieldType, KEYWORD_SUFFIX, SORT_SUFFIX};
pub use store_schema::{CreateStoreSettings, Store, StoreSchema, META_SCHEMA_KEY};

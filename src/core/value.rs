//! Value types shared by the store, the comparator and live records.
//!
//! Field values are opaque to this crate; they are carried as JSON values so
//! that they survive the persistence envelope unchanged.

use serde_json::{Map, Value};

/// A single field value as edited by the user.
pub type FieldValue = Value;

/// Field name to value mapping (a record snapshot or baseline).
pub type FieldMap = Map<String, FieldValue>;

/// Persisted partial snapshot of an in-progress edit, keyed by field name.
pub type Draft = Map<String, FieldValue>;

/// Value of `name` in `map`, `Null` when the field is absent.
pub fn field_or_null(map: &FieldMap, name: &str) -> FieldValue {
    map.get(name).cloned().unwrap_or(Value::Null)
}

/// Builds a [`FieldMap`] from a JSON object literal.
///
/// Non-object values produce an empty map.
pub fn field_map(value: Value) -> FieldMap {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

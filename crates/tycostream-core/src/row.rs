//! Row representation and the merge/diff helpers the fold step and views share.

use std::collections::BTreeMap;

use serde_json::Value;

/// A decoded row: field name to value. Field values are opaque to this crate — they
/// arrive already decoded by the external SQL type decoder.
///
/// A `BTreeMap` gives deterministic field iteration order, which matters for
/// snapshot replay and for tests that assert on exact field sets.
pub type Row = BTreeMap<String, Value>;

/// The canonical string form of `row`'s primary key value, or `None` if the
/// primary key field is missing or `null`. Shared by [`crate::Cache`] and
/// [`crate::View`] so both key on exactly the same notion of row identity.
#[must_use]
pub fn primary_key_string(row: &Row, primary_key_field: &str) -> Option<String> {
    match row.get(primary_key_field) {
        Some(Value::Null) | None => None,
        Some(value) => Some(value.to_string()),
    }
}

/// Build the full post-image of a row: fields from `incoming` override same-named
/// fields in `prior`. Used by the hub's fold step to compute `fullRow = prior ∪ row`.
#[must_use]
pub fn merge(prior: Option<&Row>, incoming: &Row) -> Row {
    let mut merged = prior.cloned().unwrap_or_default();
    for (field, value) in incoming {
        merged.insert(field.clone(), value.clone());
    }
    merged
}

/// Field names that differ between `prior` and `current`, plus every field present
/// in one but not the other.
#[must_use]
pub fn changed_fields(prior: &Row, current: &Row) -> Vec<String> {
    let mut changed = Vec::new();
    for (field, value) in current {
        match prior.get(field) {
            Some(prior_value) if prior_value == value => {}
            _ => changed.push(field.clone()),
        }
    }
    for field in prior.keys() {
        if !current.contains_key(field) {
            changed.push(field.clone());
        }
    }
    changed
}

use std::collections::BTreeMap;

use serde_json::Value;

use crate::row::{self, Row};

/// Primary-key-indexed map of the rows currently known to exist upstream.
///
/// Not thread-safe by design (§4.3): the source hub is this cache's only writer,
/// and it runs the fold loop (§4.4.1) from a single task. Concurrent readers that
/// need a consistent view take a snapshot (see `tycostream-pipeline`'s hub) rather
/// than reading through the cache directly.
#[derive(Debug, Default)]
pub struct Cache {
    primary_key_field: String,
    rows: BTreeMap<String, Row>,
}

impl Cache {
    /// Create an empty cache keyed on `primary_key_field`.
    #[must_use]
    pub fn new(primary_key_field: impl Into<String>) -> Self {
        Self {
            primary_key_field: primary_key_field.into(),
            rows: BTreeMap::new(),
        }
    }

    /// The field this cache is keyed on.
    #[must_use]
    pub fn primary_key_field(&self) -> &str {
        &self.primary_key_field
    }

    /// Insert or overwrite `row` under its primary key.
    ///
    /// Returns `false` without modifying the cache if the primary key field is
    /// missing or `null` in `row`.
    pub fn set(&mut self, row: Row) -> bool {
        let Some(key) = self.key_of(&row) else {
            return false;
        };
        self.rows.insert(key, row);
        true
    }

    /// Remove the row sharing `row`'s primary key, if any. Only the primary key
    /// field of `row` is consulted.
    pub fn delete(&mut self, row: &Row) -> Option<Row> {
        let key = self.key_of(row)?;
        self.rows.remove(&key)
    }

    /// Look up a row by its already-serialized primary key value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Row> {
        self.rows.get(key)
    }

    /// Look up a row by the value of its primary key field.
    #[must_use]
    pub fn get_by_value(&self, primary_key: &Value) -> Option<&Row> {
        self.rows.get(&primary_key.to_string())
    }

    /// Iterate every row currently in the cache, in primary-key order.
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    /// Number of rows currently cached.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the cache currently holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drop every cached row. Called when the owning hub disposes (§4.4.3).
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    fn key_of(&self, row: &Row) -> Option<String> {
        row::primary_key_string(row, &self.primary_key_field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(id: i64, name: &str) -> Row {
        [("id".into(), json!(id)), ("name".into(), json!(name))].into()
    }

    #[test]
    fn set_rejects_missing_primary_key() {
        let mut cache = Cache::new("id");
        let row: Row = [("name".into(), json!("A"))].into();
        assert!(!cache.set(row));
        assert!(cache.is_empty());
    }

    #[test]
    fn set_rejects_null_primary_key() {
        let mut cache = Cache::new("id");
        let row: Row = [("id".into(), Value::Null)].into();
        assert!(!cache.set(row));
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut cache = Cache::new("id");
        assert!(cache.set(row(1, "A")));
        assert_eq!(cache.get_by_value(&json!(1)), Some(&row(1, "A")));
    }

    #[test]
    fn set_overwrites_same_key() {
        let mut cache = Cache::new("id");
        cache.set(row(1, "A"));
        cache.set(row(1, "A2"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_by_value(&json!(1)), Some(&row(1, "A2")));
    }

    #[test]
    fn delete_removes_by_primary_key_only() {
        let mut cache = Cache::new("id");
        cache.set(row(1, "A"));
        let deleted = cache.delete(&[("id".into(), json!(1))].into());
        assert_eq!(deleted, Some(row(1, "A")));
        assert!(cache.is_empty());
    }

    #[test]
    fn iter_yields_every_row() {
        let mut cache = Cache::new("id");
        cache.set(row(1, "A"));
        cache.set(row(2, "B"));
        assert_eq!(cache.iter().count(), 2);
    }

    #[test]
    fn clear_empties_the_cache() {
        let mut cache = Cache::new("id");
        cache.set(row(1, "A"));
        cache.clear();
        assert!(cache.is_empty());
    }
}

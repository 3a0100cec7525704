use std::collections::BTreeSet;

use crate::row::Row;

/// The classification the source hub (or a view) assigns to an outgoing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A row that did not previously exist in the cache (or, for a view, a row
    /// entering visibility).
    Insert,
    /// A row whose fields changed relative to its prior cached value.
    Update,
    /// A row removed from the cache (or, for a view, a row leaving visibility).
    Delete,
}

impl EventKind {
    /// Short uppercase name, as used in log lines and the webhook envelope.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

/// One event emitted by the source hub's fold step, or synthesized by a view on a
/// visibility transition. See §3/§4.4.1/§4.5.
#[derive(Debug, Clone, PartialEq)]
pub struct RowUpdateEvent {
    /// Whether this is an insert, update, or delete.
    pub kind: EventKind,
    /// For `Insert`: every schema field. For `Update`: the primary key plus every
    /// field that actually changed. For `Delete`: just the primary key field.
    pub fields: BTreeSet<String>,
    /// The row's complete current (or, for delete, last-known) state.
    pub row: Row,
}

impl RowUpdateEvent {
    /// Build an `Insert` event with `fields` set to every key present in `row`.
    #[must_use]
    pub fn insert(row: Row) -> Self {
        Self {
            kind: EventKind::Insert,
            fields: row.keys().cloned().collect(),
            row,
        }
    }

    /// Build a `Delete` event carrying only the primary key field.
    #[must_use]
    pub fn delete(primary_key_field: &str, row: Row) -> Self {
        Self {
            kind: EventKind::Delete,
            fields: [primary_key_field.to_string()].into(),
            row,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_covers_all_row_fields() {
        let row: Row = [("id".into(), json!(1)), ("name".into(), json!("A"))].into();
        let event = RowUpdateEvent::insert(row);
        assert_eq!(event.kind, EventKind::Insert);
        assert_eq!(event.fields.len(), 2);
    }

    #[test]
    fn delete_covers_only_primary_key() {
        let row: Row = [("id".into(), json!(1)), ("name".into(), json!("A"))].into();
        let event = RowUpdateEvent::delete("id", row);
        assert_eq!(event.kind, EventKind::Delete);
        assert_eq!(event.fields, ["id".to_string()].into());
    }

    #[test]
    fn event_kind_as_str() {
        assert_eq!(EventKind::Insert.as_str(), "INSERT");
        assert_eq!(EventKind::Update.as_str(), "UPDATE");
        assert_eq!(EventKind::Delete.as_str(), "DELETE");
    }
}

use serde::Serialize;
use tycostream_core::Row;

/// JSON body POSTed for a trigger firing (§4.6/§6). `event_type` is `MATCH` when a
/// row enters the trigger's filter, `UNMATCH` when it leaves.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookEnvelope {
    /// Unique id for this delivery attempt, used for idempotency on the receiver.
    pub event_id: String,
    /// The trigger's configured name.
    pub trigger_name: String,
    /// `"MATCH"` or `"UNMATCH"`.
    pub event_type: &'static str,
    /// The row's current (or, for UNMATCH, last-known) state.
    pub data: Row,
}

impl WebhookEnvelope {
    /// Build a MATCH envelope: `row` has just entered the trigger's filter.
    #[must_use]
    pub fn matched(trigger_name: impl Into<String>, row: Row) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            trigger_name: trigger_name.into(),
            event_type: "MATCH",
            data: row,
        }
    }

    /// Build an UNMATCH envelope: `row` has just left the trigger's filter.
    #[must_use]
    pub fn unmatched(trigger_name: impl Into<String>, row: Row) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            trigger_name: trigger_name.into(),
            event_type: "UNMATCH",
            data: row,
        }
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, warn};
use tycostream_core::{EventKind, Filter, RowUpdateEvent, View};

use crate::envelope::WebhookEnvelope;
use crate::sink::WebhookSink;

/// A view whose visibility transitions become MATCH/UNMATCH webhook deliveries
/// instead of GraphQL frames (§4.6). Reuses [`View`]'s hysteresis filter semantics
/// unchanged; only the output side differs.
pub struct Trigger {
    name: String,
    url: String,
    headers: HashMap<String, String>,
    view: View,
    sink: Arc<dyn WebhookSink>,
}

impl Trigger {
    /// Build a trigger named `name`, posting to `url` whenever `filter` transitions
    /// a row's visibility, using `primary_key_field` to track visibility per row.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        headers: HashMap<String, String>,
        primary_key_field: impl Into<String>,
        filter: Filter,
        sink: Arc<dyn WebhookSink>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            headers,
            view: View::filtered(primary_key_field, filter),
            sink,
        }
    }

    /// The trigger's configured name, as sent in every envelope.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply one hub event: run it through the trigger's view, and if a visibility
    /// transition resulted, deliver the corresponding MATCH/UNMATCH envelope.
    ///
    /// Delivery failure is logged, never propagated — triggers are fire-and-forget
    /// with respect to the pipeline (§4.6/§7).
    pub async fn apply(&mut self, event: &RowUpdateEvent) {
        let Some(transition) = self.view.apply(event) else {
            return;
        };

        let envelope = match transition.kind {
            EventKind::Insert => WebhookEnvelope::matched(&self.name, transition.row),
            EventKind::Delete => WebhookEnvelope::unmatched(&self.name, transition.row),
            EventKind::Update => return,
        };

        if let Err(err) = self.sink.deliver(&self.url, &self.headers, &envelope).await {
            warn!(trigger = self.name, url = self.url, error = %err, "webhook delivery failed");
        }
    }
}

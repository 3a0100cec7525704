use std::collections::BTreeSet;

use crate::event::{EventKind, RowUpdateEvent};
use crate::filter::Filter;
use crate::row;

/// A per-subscriber stateful transform that turns a hub's unfiltered event stream
/// into a stream seen through an optional hysteresis [`Filter`] (§4.5).
///
/// A `View` has no knowledge of the hub, the subscriber's transport, or snapshot
/// vs. tail — it processes both uniformly, one event at a time, and is driven by
/// whatever owns the subscriber's event loop.
pub struct View {
    primary_key_field: String,
    filter: Option<Filter>,
    visible_keys: BTreeSet<String>,
}

impl View {
    /// Build a view with no filter: every event passes through unchanged.
    #[must_use]
    pub fn unfiltered(primary_key_field: impl Into<String>) -> Self {
        Self {
            primary_key_field: primary_key_field.into(),
            filter: None,
            visible_keys: BTreeSet::new(),
        }
    }

    /// Build a view that applies `filter` to every incoming event.
    #[must_use]
    pub fn filtered(primary_key_field: impl Into<String>, filter: Filter) -> Self {
        Self {
            primary_key_field: primary_key_field.into(),
            filter: Some(filter),
            visible_keys: BTreeSet::new(),
        }
    }

    /// Primary keys this view currently considers visible.
    #[must_use]
    pub fn visible_keys(&self) -> &BTreeSet<String> {
        &self.visible_keys
    }

    /// Apply one hub event, returning the event (if any) this view should emit.
    ///
    /// Implements §4.5's transform exactly: asymmetric `match`/`unmatch`
    /// hysteresis, the UPDATE short-circuit when changed fields don't intersect
    /// the filter's fields, and synthetic INSERT/DELETE on visibility transitions.
    pub fn apply(&mut self, event: &RowUpdateEvent) -> Option<RowUpdateEvent> {
        let Some(filter) = &self.filter else {
            return Some(event.clone());
        };

        let Some(pk) = row::primary_key_string(&event.row, &self.primary_key_field) else {
            return None;
        };
        let was = self.visible_keys.contains(&pk);

        if event.kind == EventKind::Delete {
            self.visible_keys.remove(&pk);
            return was.then(|| event.clone());
        }

        let short_circuit_stays_visible = event.kind == EventKind::Update
            && was
            && event.fields.is_disjoint(filter.fields());

        let is = if short_circuit_stays_visible {
            true
        } else if was {
            !filter.unmatch().evaluate(&event.row)
        } else {
            filter.r#match().evaluate(&event.row)
        };

        let outcome = match (was, is) {
            (false, true) => Some(RowUpdateEvent::insert(event.row.clone())),
            (true, false) => Some(RowUpdateEvent::delete(&self.primary_key_field, event.row.clone())),
            (true, true) => Some(event.clone()),
            (false, false) => None,
        };

        if is {
            self.visible_keys.insert(pk);
        } else {
            self.visible_keys.remove(&pk);
        }

        outcome
    }
}

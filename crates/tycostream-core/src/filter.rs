use std::collections::BTreeSet;

use crate::predicate::Predicate;

/// A per-view filter: a `match` predicate controlling entry, an `unmatch`
/// predicate controlling exit, and the union of fields either reads.
///
/// Asymmetric `match`/`unmatch` is what gives a [`crate::View`] hysteresis (§4.5):
/// a row must satisfy the stronger `match` to enter but only needs to avoid the
/// weaker `unmatch` to stay. Most callers don't need that and just supply a single
/// predicate; [`Filter::new`] synthesizes `unmatch` as `match`'s negation in that
/// case, which degenerates to an ordinary two-valued filter.
#[derive(Debug, Clone)]
pub struct Filter {
    r#match: Predicate,
    unmatch: Predicate,
    fields: BTreeSet<String>,
}

impl Filter {
    /// Build a filter with a single `match` predicate; `unmatch` is synthesized as
    /// its logical negation.
    #[must_use]
    pub fn new(r#match: Predicate) -> Self {
        let unmatch = r#match.negate();
        Self::with_hysteresis(r#match, unmatch)
    }

    /// Build a filter with independent `match` and `unmatch` predicates for
    /// asymmetric hysteresis.
    #[must_use]
    pub fn with_hysteresis(r#match: Predicate, unmatch: Predicate) -> Self {
        let fields = r#match
            .fields()
            .union(unmatch.fields())
            .cloned()
            .collect();
        Self {
            r#match,
            unmatch,
            fields,
        }
    }

    /// The entry predicate.
    #[must_use]
    pub fn r#match(&self) -> &Predicate {
        &self.r#match
    }

    /// The exit predicate.
    #[must_use]
    pub fn unmatch(&self) -> &Predicate {
        &self.unmatch
    }

    /// `match.fields ∪ unmatch.fields`, used by the view's short-circuit check.
    #[must_use]
    pub fn fields(&self) -> &BTreeSet<String> {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Row;
    use serde_json::json;

    #[test]
    fn synthesized_unmatch_is_negation_of_match() {
        let filter = Filter::new(Predicate::compile("value >= 100").unwrap());
        let row: Row = [("value".into(), json!(100))].into();
        assert!(filter.r#match().evaluate(&row));
        assert!(!filter.unmatch().evaluate(&row));
    }

    #[test]
    fn fields_is_union_of_match_and_unmatch() {
        let filter = Filter::with_hysteresis(
            Predicate::compile("value >= 100").unwrap(),
            Predicate::compile("status == 'archived'").unwrap(),
        );
        assert_eq!(
            filter.fields(),
            &["value".to_string(), "status".to_string()].into()
        );
    }
}

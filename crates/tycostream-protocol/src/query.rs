use tycostream_core::SourceDefinition;

/// Build the `SUBSCRIBE` query text for `source`.
///
/// Produces `SUBSCRIBE TO <name> ENVELOPE UPSERT (KEY (<pk>)) WITH (SNAPSHOT)`.
#[must_use]
pub fn build_subscribe_query(source: &SourceDefinition) -> String {
    format!(
        "SUBSCRIBE TO {} ENVELOPE UPSERT (KEY ({})) WITH (SNAPSHOT)",
        source.name(),
        source.primary_key_field(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tycostream_core::ColumnDefinition;

    fn col(name: &str, sql_type: &str) -> ColumnDefinition {
        ColumnDefinition {
            name: name.to_string(),
            sql_type: sql_type.to_string(),
        }
    }

    #[test]
    fn builds_expected_query_text() {
        let source = SourceDefinition::new("orders", "id", vec![col("id", "int8"), col("total", "numeric")]);

        assert_eq!(
            build_subscribe_query(&source),
            "SUBSCRIBE TO orders ENVELOPE UPSERT (KEY (id)) WITH (SNAPSHOT)"
        );
    }
}

use tycostream_core::{ColumnDefinition, SourceDefinition};

/// A `orders(id, customer, total)` source definition, keyed on `id`.
#[must_use]
pub fn orders_source() -> SourceDefinition {
    source_with_columns(
        "orders",
        "id",
        &[("id", "int8"), ("customer", "text"), ("total", "numeric")],
    )
}

/// Build a [`SourceDefinition`] named `name`, keyed on `primary_key`, with the given
/// `(column_name, sql_type)` pairs in schema order.
#[must_use]
pub fn source_with_columns(name: &str, primary_key: &str, columns: &[(&str, &str)]) -> SourceDefinition {
    let columns = columns
        .iter()
        .map(|(column_name, sql_type)| ColumnDefinition {
            name: (*column_name).to_string(),
            sql_type: (*sql_type).to_string(),
        })
        .collect();
    SourceDefinition::new(name, primary_key, columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_source_validates() {
        assert!(orders_source().validate().is_ok());
    }

    #[test]
    fn source_with_columns_preserves_order() {
        let source = source_with_columns("widgets", "sku", &[("sku", "text"), ("qty", "int4")]);
        assert_eq!(source.field_names(), vec!["sku", "qty"]);
    }
}

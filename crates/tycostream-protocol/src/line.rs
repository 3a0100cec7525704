use tycostream_core::{Op, Record, Row, SourceDefinition};
use tycostream_decode::TypeDecoder;

const NULL_SENTINEL: &str = "\\N";

/// Parse one complete (newline-stripped) wire line into a [`Record`].
///
/// Line layout is tab-separated: `mz_timestamp`, `mz_state` (`upsert`|`delete`), the
/// primary key column, then the remaining non-key columns in schema order. Fewer
/// fields than `source` declares means decode what's present; extra fields are
/// ignored. Returns `None` (skip, do not raise) for an empty line, a non-numeric
/// timestamp, or an empty state column — these are never raised as errors since the
/// codec itself does not fail (§4.1).
pub fn parse_line(line: &str, source: &SourceDefinition, decoder: &dyn TypeDecoder) -> Option<Record> {
    if line.is_empty() {
        return None;
    }

    let mut columns = line.split('\t');
    let timestamp: u64 = columns.next()?.parse().ok()?;

    let state = columns.next()?;
    let op = match state {
        "upsert" => Op::Upsert,
        "delete" => Op::Delete,
        _ => return None,
    };

    let field_names = field_order(source);
    let mut row = Row::new();
    for (name, raw) in field_names.iter().zip(columns) {
        if raw == NULL_SENTINEL {
            continue;
        }
        let Some(sql_type) = source.sql_type_of(name) else {
            continue;
        };
        match decoder.decode(sql_type, raw) {
            Ok(value) => {
                row.insert(name.clone(), value);
            }
            Err(err) => {
                tracing::debug!(field = %name, error = %err, "dropping unparseable column");
            }
        }
    }

    Some(Record { timestamp, op, row })
}

/// Primary key first, then the remaining columns in declared order — this is the
/// order the wire format places them in after `mz_timestamp`/`mz_state`.
fn field_order(source: &SourceDefinition) -> Vec<String> {
    let pk = source.primary_key_field();
    let mut ordered = vec![pk.to_string()];
    ordered.extend(
        source
            .field_names()
            .into_iter()
            .filter(|name| name != pk),
    );
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tycostream_core::ColumnDefinition;
    use tycostream_decode::DefaultTypeDecoder;

    fn col(name: &str, sql_type: &str) -> ColumnDefinition {
        ColumnDefinition {
            name: name.to_string(),
            sql_type: sql_type.to_string(),
        }
    }

    fn source() -> SourceDefinition {
        SourceDefinition::new(
            "orders",
            "id",
            vec![col("id", "int8"), col("name", "text"), col("total", "numeric")],
        )
    }

    #[test]
    fn parses_upsert_line() {
        let record = parse_line("10\tupsert\t1\tWidget\t9.99", &source(), &DefaultTypeDecoder).unwrap();
        assert_eq!(record.timestamp, 10);
        assert_eq!(record.op, Op::Upsert);
        assert_eq!(record.row.get("id"), Some(&json!(1)));
        assert_eq!(record.row.get("name"), Some(&json!("Widget")));
        assert_eq!(record.row.get("total"), Some(&json!(9.99)));
    }

    #[test]
    fn parses_delete_line() {
        let record = parse_line("11\tdelete\t1\t\\N\t\\N", &source(), &DefaultTypeDecoder).unwrap();
        assert_eq!(record.op, Op::Delete);
        assert_eq!(record.row.get("id"), Some(&json!(1)));
        assert!(!record.row.contains_key("name"));
    }

    #[test]
    fn null_sentinel_is_omitted_not_stored_null() {
        let record = parse_line("10\tupsert\t1\t\\N\t9.99", &source(), &DefaultTypeDecoder).unwrap();
        assert!(!record.row.contains_key("name"));
    }

    #[test]
    fn empty_line_is_skipped() {
        assert!(parse_line("", &source(), &DefaultTypeDecoder).is_none());
    }

    #[test]
    fn non_numeric_timestamp_is_skipped() {
        assert!(parse_line("not-a-timestamp\tupsert\t1", &source(), &DefaultTypeDecoder).is_none());
    }

    #[test]
    fn empty_state_is_skipped() {
        assert!(parse_line("10\t\t1", &source(), &DefaultTypeDecoder).is_none());
    }

    #[test]
    fn unknown_state_is_skipped() {
        assert!(parse_line("10\tgarbage\t1", &source(), &DefaultTypeDecoder).is_none());
    }

    #[test]
    fn fewer_fields_than_schema_decodes_what_is_present() {
        let record = parse_line("10\tupsert\t1\tWidget", &source(), &DefaultTypeDecoder).unwrap();
        assert_eq!(record.row.get("name"), Some(&json!("Widget")));
        assert!(!record.row.contains_key("total"));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let record = parse_line(
            "10\tupsert\t1\tWidget\t9.99\tsurplus",
            &source(),
            &DefaultTypeDecoder,
        )
        .unwrap();
        assert_eq!(record.row.len(), 3);
    }
}

//! SQL type name + raw wire text to [`serde_json::Value`] decoding.
//!
//! The protocol codec only depends on the [`TypeDecoder`] trait; this crate supplies
//! [`DefaultTypeDecoder`], a concrete decoder for the scalar types Materialize/Postgres
//! commonly stream, so the server binary is runnable end to end without callers having
//! to write their own.

#![warn(clippy::all, clippy::pedantic)]
#![forbid(unsafe_code)]

use serde_json::Value;
use tycostream_error::DecodeError;

/// Decodes one column's raw wire text into a JSON value, given its SQL type name.
///
/// Implementors never see `\N` (SQL NULL): the caller maps that sentinel to
/// `Value::Null` before calling `decode`.
pub trait TypeDecoder: Send + Sync {
    /// Decode `raw` as `sql_type`, or report why it couldn't be decoded.
    ///
    /// # Errors
    /// Returns [`DecodeError`] when `sql_type` is unsupported or `raw` doesn't parse
    /// as that type.
    fn decode(&self, sql_type: &str, raw: &str) -> Result<Value, DecodeError>;
}

/// The built-in decoder for common Postgres/Materialize scalar types.
///
/// SQL type names are matched case-insensitively. Unknown type names are rejected
/// rather than silently passed through as strings, per the configuration-time
/// validation this feeds (§7's "primary key SQL type is one of the decoder-supported
/// key types").
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTypeDecoder;

impl DefaultTypeDecoder {
    /// SQL type names this decoder recognizes, for config-time validation.
    #[must_use]
    pub fn supported_types() -> &'static [&'static str] {
        &[
            "text", "varchar", "char", "bool", "boolean", "int2", "smallint", "int4",
            "int", "integer", "int8", "bigint", "float4", "real", "float8",
            "double precision", "numeric", "decimal", "uuid", "timestamp",
            "timestamptz", "date", "json", "jsonb",
        ]
    }
}

impl TypeDecoder for DefaultTypeDecoder {
    fn decode(&self, sql_type: &str, raw: &str) -> Result<Value, DecodeError> {
        match sql_type.to_ascii_lowercase().as_str() {
            "text" | "varchar" | "char" | "uuid" | "timestamp" | "timestamptz" | "date" => {
                Ok(Value::String(raw.to_string()))
            }
            "bool" | "boolean" => match raw {
                "t" | "true" | "1" => Ok(Value::Bool(true)),
                "f" | "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(DecodeError::InvalidValue {
                    sql_type: sql_type.to_string(),
                    raw: raw.to_string(),
                    reason: "expected t/f/true/false/1/0".to_string(),
                }),
            },
            "int2" | "smallint" | "int4" | "int" | "integer" | "int8" | "bigint" => raw
                .parse::<i64>()
                .map(Value::from)
                .map_err(|e| DecodeError::InvalidValue {
                    sql_type: sql_type.to_string(),
                    raw: raw.to_string(),
                    reason: e.to_string(),
                }),
            "float4" | "real" | "float8" | "double precision" | "numeric" | "decimal" => raw
                .parse::<f64>()
                .map_err(|e| DecodeError::InvalidValue {
                    sql_type: sql_type.to_string(),
                    raw: raw.to_string(),
                    reason: e.to_string(),
                })
                .map(|f| serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number)),
            "json" | "jsonb" => serde_json::from_str(raw).map_err(|e| DecodeError::InvalidValue {
                sql_type: sql_type.to_string(),
                raw: raw.to_string(),
                reason: e.to_string(),
            }),
            other => Err(DecodeError::UnsupportedType {
                sql_type: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_integers() {
        let decoder = DefaultTypeDecoder;
        assert_eq!(decoder.decode("int4", "42").unwrap(), Value::from(42));
    }

    #[test]
    fn decodes_booleans() {
        let decoder = DefaultTypeDecoder;
        assert_eq!(decoder.decode("bool", "t").unwrap(), Value::Bool(true));
        assert_eq!(decoder.decode("bool", "f").unwrap(), Value::Bool(false));
    }

    #[test]
    fn decodes_floats() {
        let decoder = DefaultTypeDecoder;
        assert_eq!(decoder.decode("float8", "1.5").unwrap(), Value::from(1.5));
    }

    #[test]
    fn decodes_text_verbatim() {
        let decoder = DefaultTypeDecoder;
        assert_eq!(
            decoder.decode("text", "hello world").unwrap(),
            Value::String("hello world".to_string())
        );
    }

    #[test]
    fn decodes_jsonb() {
        let decoder = DefaultTypeDecoder;
        assert_eq!(
            decoder.decode("jsonb", r#"{"a":1}"#).unwrap(),
            serde_json::json!({"a": 1})
        );
    }

    #[test]
    fn rejects_unsupported_type() {
        let decoder = DefaultTypeDecoder;
        let err = decoder.decode("box", "(1,1),(2,2)").unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedType { .. }));
    }

    #[test]
    fn rejects_malformed_integer() {
        let decoder = DefaultTypeDecoder;
        let err = decoder.decode("int4", "not-a-number").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidValue { .. }));
    }
}

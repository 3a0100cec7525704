//! Errors from the SQL type decoder.

/// Errors raised when decoding a raw wire-format value against a SQL type name.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DecodeError {
    /// The type name has no registered decoder.
    #[error("unsupported SQL type '{sql_type}'")]
    UnsupportedType { sql_type: String },

    /// The raw text could not be parsed as a value of the named type.
    #[error("failed to decode '{raw}' as {sql_type}: {reason}")]
    InvalidValue {
        sql_type: String,
        raw: String,
        reason: String,
    },
}

impl DecodeError {
    /// Stable, operator-facing error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedType { .. } => "decode.unsupported_type",
            Self::InvalidValue { .. } => "decode.invalid_value",
        }
    }
}

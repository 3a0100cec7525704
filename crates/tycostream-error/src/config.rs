//! Errors from loading and validating configuration.

/// Errors raised while loading the YAML source catalog or process settings.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read from disk.
    #[error("failed to read config file '{path}': {reason}")]
    Read { path: String, reason: String },

    /// The config file's contents are not valid YAML, or don't match the expected shape.
    #[error("failed to parse config file '{path}': {reason}")]
    Parse { path: String, reason: String },

    /// A source's primary key is not among its declared columns.
    #[error("source '{source}': primary key '{primary_key}' is not a declared column")]
    PrimaryKeyNotInColumns { source: String, primary_key: String },

    /// A source declares no columns at all.
    #[error("source '{source}': declares no columns")]
    EmptyColumns { source: String },

    /// A source's primary key column uses a SQL type the decoder doesn't support as a key.
    #[error("source '{source}': primary key type '{sql_type}' is not a supported key type")]
    UnsupportedKeyType { source: String, sql_type: String },

    /// The catalog declared no sources at all.
    #[error("config declares no sources")]
    NoSources,
}

impl ConfigError {
    /// Stable, operator-facing error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Read { .. } => "config.read",
            Self::Parse { .. } => "config.parse",
            Self::PrimaryKeyNotInColumns { .. } => "config.primary_key_not_in_columns",
            Self::EmptyColumns { .. } => "config.empty_columns",
            Self::UnsupportedKeyType { .. } => "config.unsupported_key_type",
            Self::NoSources => "config.no_sources",
        }
    }
}

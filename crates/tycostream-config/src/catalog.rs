use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use tycostream_core::{ColumnDefinition, SourceDefinition, SourceDefinitionError};
use tycostream_decode::DefaultTypeDecoder;
use tycostream_error::ConfigError;

#[derive(Debug, Deserialize)]
struct RawCatalog {
    sources: BTreeMap<String, RawSource>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    primary_key: String,
    columns: Vec<RawColumn>,
}

#[derive(Debug, Deserialize)]
struct RawColumn {
    name: String,
    sql_type: String,
}

/// Load and validate a source catalog from a YAML file.
///
/// The file maps source name to `{primary_key, columns: [{name, sql_type}, ...]}`.
/// Validates, per §7: the primary key is named in `columns`; the primary key's SQL
/// type is one the decoder supports; at least one source is declared.
///
/// # Errors
/// Returns [`ConfigError::Read`] if the file can't be read, [`ConfigError::Parse`] if
/// it isn't valid YAML, [`ConfigError::NoSources`] if it declares zero sources, or a
/// validation variant if a source's schema is malformed.
pub fn load_sources(path: &Path) -> Result<Vec<SourceDefinition>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let raw: RawCatalog = serde_yaml::from_str(&text).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    if raw.sources.is_empty() {
        return Err(ConfigError::NoSources);
    }

    let supported_key_types = DefaultTypeDecoder::supported_types();
    let mut sources = Vec::with_capacity(raw.sources.len());

    for (name, raw_source) in raw.sources {
        let columns = raw_source
            .columns
            .into_iter()
            .map(|c| ColumnDefinition { name: c.name, sql_type: c.sql_type })
            .collect::<Vec<_>>();

        let source = SourceDefinition::new(name.clone(), raw_source.primary_key.clone(), columns);
        source.validate().map_err(|e| match e {
            SourceDefinitionError::PrimaryKeyNotInColumns { source, primary_key } => {
                ConfigError::PrimaryKeyNotInColumns { source, primary_key }
            }
            SourceDefinitionError::EmptyColumns { source } => ConfigError::EmptyColumns { source },
        })?;

        let key_type = source.sql_type_of(&raw_source.primary_key).unwrap_or_default();
        if !supported_key_types.iter().any(|t| t.eq_ignore_ascii_case(key_type)) {
            return Err(ConfigError::UnsupportedKeyType {
                source: name,
                sql_type: key_type.to_string(),
            });
        }

        sources.push(source);
    }

    info!(count = sources.len(), path = %path.display(), "loaded source catalog");
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_yaml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_a_valid_catalog() {
        let file = write_temp_yaml(
            "sources:\n  orders:\n    primary_key: id\n    columns:\n      - name: id\n        sql_type: int8\n      - name: total\n        sql_type: numeric\n",
        );
        let sources = load_sources(file.path()).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name(), "orders");
    }

    #[test]
    fn rejects_missing_file() {
        let err = load_sources(Path::new("/nonexistent/path.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn rejects_invalid_yaml() {
        let file = write_temp_yaml("not: valid: yaml: at all: [");
        let err = load_sources(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn rejects_empty_catalog() {
        let file = write_temp_yaml("sources: {}\n");
        let err = load_sources(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NoSources));
    }

    #[test]
    fn rejects_primary_key_not_in_columns() {
        let file = write_temp_yaml(
            "sources:\n  orders:\n    primary_key: id\n    columns:\n      - name: total\n        sql_type: numeric\n",
        );
        let err = load_sources(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::PrimaryKeyNotInColumns { .. }));
    }

    #[test]
    fn rejects_empty_columns() {
        let file = write_temp_yaml("sources:\n  orders:\n    primary_key: id\n    columns: []\n");
        let err = load_sources(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyColumns { .. }));
    }

    #[test]
    fn rejects_unsupported_key_type() {
        let file = write_temp_yaml(
            "sources:\n  orders:\n    primary_key: id\n    columns:\n      - name: id\n        sql_type: box\n",
        );
        let err = load_sources(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedKeyType { .. }));
    }
}

/// One column of a source's schema: its name and the SQL type the upstream
/// database reports it as.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ColumnDefinition {
    /// Column name as it appears in the upstream source.
    pub name: String,
    /// SQL type name, passed to the external type decoder.
    pub sql_type: String,
}

/// An immutable description of one upstream source (a materialized view). Provided
/// by the external YAML loader; this crate treats it as an opaque record with
/// accessors — it never constructs one except in tests.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceDefinition {
    name: String,
    primary_key_field: String,
    columns: Vec<ColumnDefinition>,
}

impl SourceDefinition {
    /// Build a new source definition. Does not validate; callers that load from an
    /// untrusted config file should additionally call [`SourceDefinition::validate`].
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        primary_key_field: impl Into<String>,
        columns: Vec<ColumnDefinition>,
    ) -> Self {
        Self {
            name: name.into(),
            primary_key_field: primary_key_field.into(),
            columns,
        }
    }

    /// The source's name, as used in `SUBSCRIBE TO <name> ...`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name of the column that uniquely identifies a row.
    #[must_use]
    pub fn primary_key_field(&self) -> &str {
        &self.primary_key_field
    }

    /// All columns, in schema order (primary key included).
    #[must_use]
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// All column names, in schema order.
    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// The SQL type name declared for `field`, if it exists.
    #[must_use]
    pub fn sql_type_of(&self, field: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.name == field)
            .map(|c| c.sql_type.as_str())
    }

    /// `Ok(())` iff the primary key is one of the declared columns.
    ///
    /// # Errors
    ///
    /// Returns an error if the primary key field is absent from `columns`, or if
    /// `columns` is empty.
    pub fn validate(&self) -> Result<(), SourceDefinitionError> {
        if self.columns.is_empty() {
            return Err(SourceDefinitionError::EmptyColumns {
                source: self.name.clone(),
            });
        }
        if !self.columns.iter().any(|c| c.name == self.primary_key_field) {
            return Err(SourceDefinitionError::PrimaryKeyNotInColumns {
                source: self.name.clone(),
                primary_key: self.primary_key_field.clone(),
            });
        }
        Ok(())
    }
}

/// Validation failure for a [`SourceDefinition`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceDefinitionError {
    /// The primary key field is not among the declared columns.
    #[error("primary key '{primary_key}' is not a column of source '{source}'")]
    PrimaryKeyNotInColumns { source: String, primary_key: String },
    /// No columns were declared at all.
    #[error("source '{source}' declares no columns")]
    EmptyColumns { source: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, sql_type: &str) -> ColumnDefinition {
        ColumnDefinition {
            name: name.to_string(),
            sql_type: sql_type.to_string(),
        }
    }

    #[test]
    fn validate_accepts_pk_in_columns() {
        let def = SourceDefinition::new("orders", "id", vec![col("id", "int8"), col("name", "text")]);
        assert!(def.validate().is_ok());
    }

    #[test]
    fn validate_rejects_pk_not_in_columns() {
        let def = SourceDefinition::new("orders", "id", vec![col("name", "text")]);
        assert!(matches!(
            def.validate(),
            Err(SourceDefinitionError::PrimaryKeyNotInColumns { .. })
        ));
    }

    #[test]
    fn validate_rejects_empty_columns() {
        let def = SourceDefinition::new("orders", "id", vec![]);
        assert!(matches!(
            def.validate(),
            Err(SourceDefinitionError::EmptyColumns { .. })
        ));
    }

    #[test]
    fn field_names_preserves_schema_order() {
        let def = SourceDefinition::new(
            "orders",
            "id",
            vec![col("id", "int8"), col("name", "text"), col("total", "numeric")],
        );
        assert_eq!(def.field_names(), vec!["id", "name", "total"]);
    }
}

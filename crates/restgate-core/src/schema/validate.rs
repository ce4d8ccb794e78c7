//! Row validators derived from a table descriptor.
//!
//! Two variants are derived per table: the *select* shape (what rows look
//! like coming back, nullable columns may be `null`) and the *insert*
//! shape (what write payloads may contain; the primary key is omitted and
//! nullable columns may be absent). Validation is a per-type function
//! selected by the [`SqlType`] tag.

use serde_json::{Map, Value};

use super::{SqlType, TableDescriptor};
use crate::error::{GatewayError, Result};

/// Per-table write-payload validator.
#[derive(Debug, Clone)]
pub struct RowSchema {
    columns:     Vec<super::ColumnDescriptor>,
    primary_key: String,
}

impl RowSchema {
    /// Derive the validator from a descriptor.
    #[must_use]
    pub fn for_table(descriptor: &TableDescriptor) -> Self {
        Self {
            columns:     descriptor.columns.clone(),
            primary_key: descriptor.primary_key.clone(),
        }
    }

    /// Validate an insert/patch payload: every provided field that names a
    /// known column must carry a value of the column's type (or `null`
    /// for a nullable column). Unknown fields are ignored here; the SQL
    /// synthesizer drops them.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] naming the first offending
    /// field.
    pub fn validate_types(&self, body: &Map<String, Value>) -> Result<()> {
        for column in &self.columns {
            let Some(value) = body.get(&column.name) else {
                continue;
            };
            if value.is_null() {
                if column.nullable {
                    continue;
                }
                return Err(GatewayError::validation(format!(
                    "Field '{}' must not be null",
                    column.name
                )));
            }
            if !value_matches(&column.sql_type, value) {
                return Err(GatewayError::validation(format!(
                    "Field '{}' expects {}",
                    column.name,
                    expected_shape(&column.sql_type)
                )));
            }
        }
        Ok(())
    }

    /// Required fields absent from a full-replace payload, sorted by name.
    ///
    /// Required means: not nullable and not the primary key. A `null`
    /// value counts as absent for a non-nullable column.
    #[must_use]
    pub fn missing_replace_fields(&self, body: &Map<String, Value>) -> Vec<String> {
        let mut missing: Vec<String> = self
            .columns
            .iter()
            .filter(|c| !c.nullable && c.name != self.primary_key)
            .filter(|c| body.get(&c.name).is_none_or(Value::is_null))
            .map(|c| c.name.clone())
            .collect();
        missing.sort();
        missing
    }

    /// The primary key column this schema was derived with.
    #[must_use]
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }
}

fn value_matches(sql_type: &SqlType, value: &Value) -> bool {
    match sql_type {
        SqlType::Integer | SqlType::Numeric | SqlType::Real | SqlType::DoublePrecision => {
            value.is_number()
        }
        SqlType::Boolean => value.is_boolean(),
        // Timestamps travel as ISO-8601 strings; everything unrecognized
        // falls back to string as well.
        SqlType::Text | SqlType::Varchar | SqlType::Timestamp | SqlType::Other(_) => {
            value.is_string()
        }
    }
}

fn expected_shape(sql_type: &SqlType) -> &'static str {
    match sql_type {
        SqlType::Integer | SqlType::Numeric | SqlType::Real | SqlType::DoublePrecision => "a number",
        SqlType::Boolean => "a boolean",
        SqlType::Text | SqlType::Varchar | SqlType::Timestamp | SqlType::Other(_) => "a string",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::users_descriptor;
    use serde_json::json;

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().expect("object literal").clone()
    }

    #[test]
    fn test_valid_insert_body() {
        let schema = RowSchema::for_table(&users_descriptor());
        let b = body(json!({
            "name": "A",
            "email": "a@x",
            "is_active": true,
            "created_at": "2024-01-01T00:00:00Z"
        }));
        assert!(schema.validate_types(&b).is_ok());
        assert!(schema.missing_replace_fields(&b).is_empty());
    }

    #[test]
    fn test_wrong_type_rejected() {
        let schema = RowSchema::for_table(&users_descriptor());
        let b = body(json!({"is_active": "yes"}));
        let err = schema.validate_types(&b).unwrap_err();
        assert!(err.to_string().contains("is_active"));
    }

    #[test]
    fn test_null_allowed_only_when_nullable() {
        let schema = RowSchema::for_table(&users_descriptor());
        assert!(schema.validate_types(&body(json!({"age": null}))).is_ok());
        assert!(schema.validate_types(&body(json!({"name": null}))).is_err());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let schema = RowSchema::for_table(&users_descriptor());
        assert!(schema.validate_types(&body(json!({"phone": 42}))).is_ok());
    }

    #[test]
    fn test_missing_replace_fields_sorted() {
        let schema = RowSchema::for_table(&users_descriptor());
        let missing = schema.missing_replace_fields(&body(json!({"name": "B"})));
        assert_eq!(missing, vec!["created_at", "email", "is_active"]);
    }

    #[test]
    fn test_primary_key_never_required() {
        let schema = RowSchema::for_table(&users_descriptor());
        let missing = schema.missing_replace_fields(&body(json!({
            "name": "A",
            "email": "a@x",
            "is_active": true,
            "created_at": "2024-01-01T00:00:00Z"
        })));
        assert!(!missing.contains(&"id".to_string()));
        assert!(missing.is_empty());
    }

    #[test]
    fn test_nullable_absence_allowed() {
        let schema = RowSchema::for_table(&users_descriptor());
        let missing = schema.missing_replace_fields(&body(json!({
            "name": "A",
            "email": "a@x",
            "is_active": true,
            "created_at": "2024-01-01T00:00:00Z"
        })));
        // age is nullable and may be absent from a full replace.
        assert!(!missing.contains(&"age".to_string()));
    }

    #[test]
    fn test_numeric_types_accept_numbers() {
        use crate::schema::{ColumnDescriptor, SchemaConventions, TableDescriptor};
        let desc = TableDescriptor::build(
            "metrics",
            vec![
                ColumnDescriptor::new("id", SqlType::Integer, false),
                ColumnDescriptor::new("score", SqlType::DoublePrecision, false),
            ],
            &SchemaConventions::default(),
        );
        let schema = RowSchema::for_table(&desc);
        assert!(schema.validate_types(&body(json!({"score": 1.5}))).is_ok());
        assert!(schema.validate_types(&body(json!({"score": "high"}))).is_err());
    }
}

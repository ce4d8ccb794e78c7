//! Table descriptors built from introspected column metadata.
//!
//! A [`TableDescriptor`] is the immutable, shared description of one table:
//! ordered columns, the primary key, and the soft-delete column if any.
//! It is built once per introspection and replaced wholesale when the
//! table definition drifts; route handlers hold it by `Arc`.

mod validate;

pub use validate::RowSchema;

use serde::{Deserialize, Serialize};

/// PostgreSQL column types the gateway distinguishes.
///
/// Everything outside this set falls back to [`SqlType::Other`] and is
/// treated as text on the wire; the database remains the final authority
/// on whether a value fits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SqlType {
    Integer,
    Text,
    Varchar,
    Boolean,
    Timestamp,
    Numeric,
    Real,
    DoublePrecision,
    Other(String),
}

impl SqlType {
    /// Parse an `information_schema.columns.data_type` spelling.
    #[must_use]
    pub fn from_data_type(data_type: &str) -> Self {
        match data_type {
            "integer" => Self::Integer,
            "text" => Self::Text,
            "character varying" => Self::Varchar,
            "boolean" => Self::Boolean,
            "timestamp without time zone" => Self::Timestamp,
            "numeric" => Self::Numeric,
            "real" => Self::Real,
            "double precision" => Self::DoublePrecision,
            other => Self::Other(other.to_string()),
        }
    }

    /// The PostgreSQL spelling this type was parsed from.
    #[must_use]
    pub fn as_data_type(&self) -> &str {
        match self {
            Self::Integer => "integer",
            Self::Text => "text",
            Self::Varchar => "character varying",
            Self::Boolean => "boolean",
            Self::Timestamp => "timestamp without time zone",
            Self::Numeric => "numeric",
            Self::Real => "real",
            Self::DoublePrecision => "double precision",
            Self::Other(raw) => raw,
        }
    }

    /// Whether range operators (`gt`, `gte`, `lt`, `lte`) are advertised
    /// for this type in the OpenAPI document.
    #[must_use]
    pub const fn is_orderable(&self) -> bool {
        matches!(
            self,
            Self::Integer | Self::Timestamp | Self::Numeric | Self::Real | Self::DoublePrecision
        )
    }

    /// Whether pattern operators (`like`, `ilike`) are advertised.
    #[must_use]
    pub const fn is_textual(&self) -> bool {
        matches!(self, Self::Text | Self::Varchar)
    }
}

impl From<String> for SqlType {
    fn from(raw: String) -> Self {
        Self::from_data_type(&raw)
    }
}

impl From<SqlType> for String {
    fn from(t: SqlType) -> Self {
        t.as_data_type().to_string()
    }
}

/// One introspected column. Immutable after introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,

    /// Column type.
    #[serde(rename = "type")]
    pub sql_type: SqlType,

    /// Whether the column accepts NULL.
    pub nullable: bool,
}

impl ColumnDescriptor {
    /// Construct a column descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: SqlType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            sql_type,
            nullable,
        }
    }
}

/// Naming conventions used to derive descriptor roles from column names.
#[derive(Debug, Clone)]
pub struct SchemaConventions {
    /// Column name treated as the primary key.
    pub primary_key: String,

    /// Column names marking a soft-deletable table, in preference order
    /// of the configuration (column order of the table decides ties).
    pub soft_delete_columns: Vec<String>,
}

impl Default for SchemaConventions {
    fn default() -> Self {
        Self {
            primary_key: "id".to_string(),
            soft_delete_columns: vec!["deleted_at".to_string(), "is_deleted".to_string()],
        }
    }
}

impl From<&crate::config::GatewayConfig> for SchemaConventions {
    fn from(config: &crate::config::GatewayConfig) -> Self {
        Self {
            primary_key: config.primary_key.clone(),
            soft_delete_columns: config.soft_delete_columns.clone(),
        }
    }
}

/// Immutable description of one table.
///
/// Built by [`TableDescriptor::build`] from introspected columns; mutated
/// only by replacement when drift is detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    /// Table name in the public schema.
    pub name: String,

    /// Columns in ordinal order.
    pub columns: Vec<ColumnDescriptor>,

    /// Primary key column name.
    ///
    /// The first column whose name equals the configured PK name; when no
    /// column matches, the first column stands in.
    pub primary_key: String,

    /// Soft-delete marker column, when the table has one.
    pub soft_delete_column: Option<String>,
}

impl TableDescriptor {
    /// Build a descriptor from introspected columns.
    #[must_use]
    pub fn build(
        name: impl Into<String>,
        columns: Vec<ColumnDescriptor>,
        conventions: &SchemaConventions,
    ) -> Self {
        let primary_key = columns
            .iter()
            .find(|c| c.name == conventions.primary_key)
            .or_else(|| columns.first())
            .map(|c| c.name.clone())
            .unwrap_or_default();

        let soft_delete_column = columns
            .iter()
            .find(|c| conventions.soft_delete_columns.contains(&c.name))
            .map(|c| c.name.clone());

        Self {
            name: name.into(),
            columns,
            primary_key,
            soft_delete_column,
        }
    }

    /// Look up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether the table has a column of this name.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Column names in ordinal order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[cfg(test)]
pub(crate) fn users_descriptor() -> TableDescriptor {
    // Shared test fixture: the canonical users table.
    TableDescriptor::build(
        "users",
        vec![
            ColumnDescriptor::new("id", SqlType::Integer, false),
            ColumnDescriptor::new("name", SqlType::Text, false),
            ColumnDescriptor::new("email", SqlType::Text, false),
            ColumnDescriptor::new("is_active", SqlType::Boolean, false),
            ColumnDescriptor::new("created_at", SqlType::Timestamp, false),
            ColumnDescriptor::new("age", SqlType::Integer, true),
        ],
        &SchemaConventions::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_type_round_trip() {
        for raw in [
            "integer",
            "text",
            "character varying",
            "boolean",
            "timestamp without time zone",
            "numeric",
            "real",
            "double precision",
        ] {
            assert_eq!(SqlType::from_data_type(raw).as_data_type(), raw);
        }
    }

    #[test]
    fn test_unknown_type_falls_back() {
        let t = SqlType::from_data_type("uuid");
        assert_eq!(t, SqlType::Other("uuid".to_string()));
        assert!(!t.is_orderable());
        assert!(!t.is_textual());
    }

    #[test]
    fn test_operator_applicability() {
        assert!(SqlType::Integer.is_orderable());
        assert!(SqlType::Timestamp.is_orderable());
        assert!(SqlType::Numeric.is_orderable());
        assert!(!SqlType::Text.is_orderable());
        assert!(SqlType::Text.is_textual());
        assert!(SqlType::Varchar.is_textual());
        assert!(!SqlType::Boolean.is_textual());
    }

    #[test]
    fn test_build_resolves_primary_key() {
        let desc = users_descriptor();
        assert_eq!(desc.primary_key, "id");
        assert_eq!(desc.soft_delete_column, None);
    }

    #[test]
    fn test_build_falls_back_to_first_column() {
        let desc = TableDescriptor::build(
            "events",
            vec![
                ColumnDescriptor::new("event_id", SqlType::Integer, false),
                ColumnDescriptor::new("payload", SqlType::Text, true),
            ],
            &SchemaConventions::default(),
        );
        assert_eq!(desc.primary_key, "event_id");
    }

    #[test]
    fn test_build_detects_soft_delete_column() {
        let desc = TableDescriptor::build(
            "posts",
            vec![
                ColumnDescriptor::new("id", SqlType::Integer, false),
                ColumnDescriptor::new("title", SqlType::Text, false),
                ColumnDescriptor::new("deleted_at", SqlType::Timestamp, true),
            ],
            &SchemaConventions::default(),
        );
        assert_eq!(desc.soft_delete_column.as_deref(), Some("deleted_at"));
    }

    #[test]
    fn test_column_lookup() {
        let desc = users_descriptor();
        assert!(desc.has_column("email"));
        assert!(!desc.has_column("phone"));
        assert_eq!(desc.column("age").map(|c| c.nullable), Some(true));
    }

    #[test]
    fn test_column_descriptor_serde_layout() {
        let col = ColumnDescriptor::new("created_at", SqlType::Timestamp, false);
        let json = serde_json::to_value(&col).expect("serializable");
        assert_eq!(
            json,
            serde_json::json!({
                "name": "created_at",
                "type": "timestamp without time zone",
                "nullable": false
            })
        );
        let back: ColumnDescriptor = serde_json::from_value(json).expect("deserializable");
        assert_eq!(back, col);
    }
}

//! Error types for the restgate core.
//!
//! # Error Hierarchy
//!
//! ```text
//! GatewayError
//! ├── NotFound        - Unknown table or row
//! ├── Validation      - Bad write payloads, missing required fields
//! ├── Database        - PostgreSQL errors
//! ├── ConnectionPool  - Pool exhaustion or connect failures
//! ├── Cache           - Control- or data-plane I/O failures
//! ├── Configuration   - Config/setup errors
//! └── Internal        - Unexpected internal errors
//! ```
//!
//! Cache errors are special: callers log and swallow them, falling back to
//! the authoritative source. A cache failure must never fail a request.

use thiserror::Error;

/// Result type alias for restgate operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for restgate operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Resource not found.
    ///
    /// Returned for unknown tables and for single-row operations that
    /// matched no row.
    #[error("{resource} not found")]
    NotFound {
        /// What was looked up ("Table" or "Record").
        resource: String,
    },

    /// Write payload validation error.
    ///
    /// Returned before any SQL is issued when a body cannot be accepted:
    /// unparseable JSON, wrong value types, or missing required fields on
    /// a full replace.
    #[error("Validation error: {message}")]
    Validation {
        /// Error message describing the validation failure.
        message:        String,
        /// Required fields absent from the payload, sorted by name.
        missing_fields: Vec<String>,
    },

    /// Database operation error.
    ///
    /// Wraps errors from PostgreSQL operations.
    #[error("Database error: {message}")]
    Database {
        /// Error message from the database.
        message:   String,
        /// SQL state code if available (e.g., "23505" for unique violation).
        sql_state: Option<String>,
    },

    /// Connection pool error.
    #[error("Connection pool error: {message}")]
    ConnectionPool {
        /// Error message.
        message: String,
    },

    /// Control- or data-plane I/O failure.
    ///
    /// Callers log these and fall back to the database; they never bubble
    /// into a response.
    #[error("Cache error: {message}")]
    Cache {
        /// Error message.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message.
        message: String,
    },

    /// Internal error. Should be rare.
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl GatewayError {
    /// Create a not-found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a validation error without field details.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message:        message.into(),
            missing_fields: Vec::new(),
        }
    }

    /// Create a validation error carrying the missing required fields.
    #[must_use]
    pub fn missing_fields(fields: Vec<String>) -> Self {
        Self::Validation {
            message:        "Missing required fields".to_string(),
            missing_fields: fields,
        }
    }

    /// Create a database error.
    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message:   message.into(),
            sql_state: None,
        }
    }

    /// Create a cache error.
    #[must_use]
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this is a client error (4xx equivalent).
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Validation { .. })
    }

    /// Get HTTP status code equivalent.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::Database { .. }
            | Self::ConnectionPool { .. }
            | Self::Cache { .. }
            | Self::Configuration { .. }
            | Self::Internal { .. } => 500,
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        Self::Validation {
            message:        format!("Invalid JSON: {e}"),
            missing_fields: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = GatewayError::not_found("Table");
        assert!(err.is_client_error());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_string(), "Table not found");
    }

    #[test]
    fn test_missing_fields_error() {
        let err = GatewayError::missing_fields(vec!["email".to_string(), "name".to_string()]);
        assert_eq!(err.status_code(), 400);
        match err {
            GatewayError::Validation { missing_fields, .. } => {
                assert_eq!(missing_fields, vec!["email", "name"]);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_database_error_is_server_error() {
        let err = GatewayError::database("connection refused");
        assert!(!err.is_client_error());
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_from_serde_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: GatewayError = json_err.into();
        assert!(matches!(err, GatewayError::Validation { .. }));
    }
}

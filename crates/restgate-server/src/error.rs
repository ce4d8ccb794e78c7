//! HTTP error shaping.
//!
//! Error bodies are JSON objects with an `error` string field; validation
//! failures on full replaces additionally carry `missingFields`. Server
//! errors are logged before the response is written; client errors are
//! not, they are the client's problem.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use restgate_core::GatewayError;

/// API-level error, rendered as a JSON response.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unknown table.
    #[error("Table not found")]
    TableNotFound,

    /// Single-row operation matched no row.
    #[error("Record not found")]
    RecordNotFound,

    /// Bad write payload.
    #[error("{message}")]
    Validation {
        message:        String,
        missing_fields: Vec<String>,
    },

    /// Database failure; the framework yields 500 and logs.
    #[error("Database error: {0}")]
    Database(String),

    /// Invariant violation.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Validation failure without field details.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message:        message.into(),
            missing_fields: Vec::new(),
        }
    }

    /// Validation failure naming the missing required fields.
    #[must_use]
    pub fn missing_fields(fields: Vec<String>) -> Self {
        Self::Validation {
            message:        "Missing required fields".to_string(),
            missing_fields: fields,
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::TableNotFound | Self::RecordNotFound => StatusCode::NOT_FOUND,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::NotFound { resource } => {
                if resource == "Table" {
                    Self::TableNotFound
                } else {
                    Self::RecordNotFound
                }
            }
            GatewayError::Validation {
                message,
                missing_fields,
            } => Self::Validation {
                message,
                missing_fields,
            },
            GatewayError::Database { message, sql_state } => Self::Database(match sql_state {
                Some(state) => format!("{message} (SQLSTATE {state})"),
                None => message,
            }),
            GatewayError::ConnectionPool { message } => Self::Database(message),
            GatewayError::Cache { message }
            | GatewayError::Configuration { message }
            | GatewayError::Internal { message } => Self::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = match &self {
            Self::Validation {
                message,
                missing_fields,
            } if !missing_fields.is_empty() => json!({
                "error": message,
                "missingFields": missing_fields,
            }),
            other => json!({"error": other.to_string()}),
        };

        (status, Json(body)).into_response()
    }
}

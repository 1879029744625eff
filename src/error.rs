//! Error types for paraphrase-worker
//!
//! This module provides:
//! - Domain-specific error types (Database, Table, Telegram, Config)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes
//!
//! Per-item failures of the paraphrasing protocol are not errors at this level;
//! they are carried as [`TaskErrorKind`](crate::types::TaskErrorKind) inside a
//! [`TaskResult`](crate::types::TaskResult) and never abort a batch.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for paraphrase-worker operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for paraphrase-worker
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "service.process_url")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Input or output spreadsheet problem
    #[error("table error: {0}")]
    Table(#[from] TableError),

    /// Telegram Bot API error
    #[error("telegram error: {0}")]
    Telegram(#[from] TelegramError),

    /// Requester has not registered
    #[error("user {user_id} is not registered")]
    NotRegistered {
        /// The unknown user ID
        user_id: i64,
    },

    /// Request is missing a required part
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Shutdown in progress - not accepting new documents
    #[error("shutdown in progress: not accepting new documents")]
    ShuttingDown,

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// Spreadsheet errors raised by the table adapter
#[derive(Debug, Error)]
pub enum TableError {
    /// The uploaded file is not a supported spreadsheet type
    #[error("unsupported file type: {mime_type}")]
    UnsupportedFormat {
        /// The MIME type or file name that was rejected
        mime_type: String,
    },

    /// The required text column is absent from the header row
    #[error("column '{column}' not found")]
    MissingColumn {
        /// The column that was expected
        column: String,
    },

    /// The workbook has no sheets or no header row
    #[error("spreadsheet is empty")]
    Empty,

    /// The workbook could not be parsed
    #[error("failed to read spreadsheet: {0}")]
    Read(String),

    /// The output workbook could not be encoded
    #[error("failed to write spreadsheet: {0}")]
    Write(String),
}

impl TableError {
    /// Message shown to the uploader in chat replies
    pub fn user_message(&self) -> String {
        match self {
            TableError::UnsupportedFormat { .. } => {
                "This file format is not supported. Please upload an Excel file.".to_string()
            }
            TableError::MissingColumn { column } => format!(
                "Please make sure the column with texts is named '{}'.",
                column
            ),
            TableError::Empty => "The uploaded spreadsheet is empty.".to_string(),
            TableError::Read(_) => {
                "The file could not be read as a spreadsheet. Please upload an Excel file."
                    .to_string()
            }
            TableError::Write(_) => {
                "Something went wrong while building the result file.".to_string()
            }
        }
    }
}

/// Telegram Bot API errors
#[derive(Debug, Error)]
pub enum TelegramError {
    /// The API answered with `ok: false`
    #[error("{method} failed: {description}")]
    Api {
        /// Bot API method name (e.g. "sendDocument")
        method: String,
        /// Description returned by Telegram
        description: String,
    },

    /// The API answered `ok: true` without a result
    #[error("{method} returned no result")]
    MissingResult {
        /// Bot API method name
        method: String,
    },

    /// Downloading a file failed with a non-success status
    #[error("file download failed with status {status}")]
    Download {
        /// HTTP status code
        status: u16,
    },
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "missing_column",
///     "message": "table error: column 'text_column' not found",
///     "details": { "column": "text_column" }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_registered", "missing_column")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an "unauthorized" error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::InvalidRequest(_) => 400,

            // 403 Forbidden - unknown requester
            Error::NotRegistered { .. } => 403,

            // 415/422 - Spreadsheet problems
            Error::Table(TableError::UnsupportedFormat { .. }) => 415,
            Error::Table(TableError::MissingColumn { .. }) => 422,
            Error::Table(TableError::Empty) => 422,
            Error::Table(TableError::Read(_)) => 422,
            Error::Table(TableError::Write(_)) => 500,

            // 500 Internal Server Error - Server-side issues
            Error::Database(_) => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - External service errors
            Error::Network(_) => 502,
            Error::Telegram(_) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(_) => "database_error",
            Error::Table(e) => match e {
                TableError::UnsupportedFormat { .. } => "unsupported_format",
                TableError::MissingColumn { .. } => "missing_column",
                TableError::Empty => "empty_table",
                TableError::Read(_) => "unreadable_table",
                TableError::Write(_) => "table_write_failed",
            },
            Error::Telegram(_) => "telegram_error",
            Error::NotRegistered { .. } => "not_registered",
            Error::InvalidRequest(_) => "invalid_request",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::ShuttingDown => "shutting_down",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::NotRegistered { user_id } => Some(serde_json::json!({
                "user_id": user_id,
            })),
            Error::Table(TableError::MissingColumn { column }) => Some(serde_json::json!({
                "column": column,
            })),
            Error::Table(TableError::UnsupportedFormat { mime_type }) => {
                Some(serde_json::json!({
                    "mime_type": mime_type,
                }))
            }
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    /// (Error, expected_status_code, expected_error_code) for every match arm
    fn all_error_variants() -> Vec<(Error, u16, &'static str)> {
        vec![
            (
                Error::Config {
                    message: "missing".into(),
                    key: Some("service.api_token".into()),
                },
                400,
                "config_error",
            ),
            (
                Error::InvalidRequest("no file".into()),
                400,
                "invalid_request",
            ),
            (Error::NotRegistered { user_id: 7 }, 403, "not_registered"),
            (
                Error::Table(TableError::UnsupportedFormat {
                    mime_type: "text/plain".into(),
                }),
                415,
                "unsupported_format",
            ),
            (
                Error::Table(TableError::MissingColumn {
                    column: "text_column".into(),
                }),
                422,
                "missing_column",
            ),
            (Error::Table(TableError::Empty), 422, "empty_table"),
            (
                Error::Table(TableError::Read("zip".into())),
                422,
                "unreadable_table",
            ),
            (
                Error::Table(TableError::Write("io".into())),
                500,
                "table_write_failed",
            ),
            (
                Error::Database(DatabaseError::QueryFailed("locked".into())),
                500,
                "database_error",
            ),
            (
                Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")),
                500,
                "io_error",
            ),
            (
                Error::ApiServerError("bind failed".into()),
                500,
                "api_server_error",
            ),
            (Error::Other("unknown".into()), 500, "internal_error"),
            (
                Error::Telegram(TelegramError::Download { status: 404 }),
                502,
                "telegram_error",
            ),
            (Error::ShuttingDown, 503, "shutting_down"),
        ]
    }

    #[test]
    fn every_variant_maps_to_expected_status_code() {
        for (error, expected_status, expected_code) in all_error_variants() {
            let actual_status = error.status_code();
            assert_eq!(
                actual_status, expected_status,
                "Error variant with error_code={expected_code} returned status {actual_status}, expected {expected_status}"
            );
        }
    }

    #[test]
    fn every_variant_maps_to_expected_error_code() {
        for (error, expected_status, expected_code) in all_error_variants() {
            let actual_code = error.error_code();
            assert_eq!(
                actual_code, expected_code,
                "Error variant with expected status={expected_status} returned error_code={actual_code}, expected {expected_code}"
            );
        }
    }

    #[test]
    fn api_error_from_missing_column_has_column() {
        let err = Error::Table(TableError::MissingColumn {
            column: "text_column".into(),
        });
        let api: ApiError = err.into();

        assert_eq!(api.error.code, "missing_column");
        let details = api.error.details.expect("should have details");
        assert_eq!(details["column"], "text_column");
    }

    #[test]
    fn api_error_from_not_registered_has_user_id() {
        let api: ApiError = Error::NotRegistered { user_id: 42 }.into();

        assert_eq!(api.error.code, "not_registered");
        assert_eq!(api.error.details.expect("should have details")["user_id"], 42);
    }

    #[test]
    fn api_error_without_context_omits_details() {
        let api: ApiError = Error::ShuttingDown.into();
        let json = serde_json::to_value(&api).unwrap();

        assert!(json["error"].get("details").is_none());
        assert_eq!(json["error"]["code"], "shutting_down");
    }

    #[test]
    fn missing_column_user_message_names_the_column() {
        let err = TableError::MissingColumn {
            column: "text_column".into(),
        };
        assert_eq!(
            err.user_message(),
            "Please make sure the column with texts is named 'text_column'."
        );
    }
}

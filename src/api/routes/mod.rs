//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - `users` - Registration and stored texts
//! - `documents` - Spreadsheet processing
//! - `system` - Health, OpenAPI

use serde::{Deserialize, Serialize};

mod documents;
mod system;
mod users;

pub use documents::*;
pub use system::*;
pub use users::*;

/// Request body for POST /users
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RegisterUserRequest {
    /// Platform user ID
    pub user_id: i64,
    /// Display name, if any
    #[serde(default)]
    pub username: Option<String>,
}

/// Response for POST /users
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RegisterUserResponse {
    /// Registered user ID
    pub user_id: i64,
    /// False when the user had registered before
    pub created: bool,
}

/// Response headers of POST /documents
pub mod headers {
    /// Number of data rows in the upload
    pub const ROWS_TOTAL: &str = "x-rows-total";
    /// Rows with a paraphrase
    pub const ROWS_SUCCEEDED: &str = "x-rows-succeeded";
    /// Rows whose paraphrase failed
    pub const ROWS_FAILED: &str = "x-rows-failed";
}

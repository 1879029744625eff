//! Database layer for paraphrase-worker
//!
//! Handles SQLite persistence for registered users and processed text pairs.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`users`] - Registration bookkeeping
//! - [`texts`] - `(original, result)` pairs of finished batches

use serde::Serialize;
use sqlx::{FromRow, sqlite::SqlitePool};
use utoipa::ToSchema;

mod migrations;
mod texts;
mod users;

/// Registered user record from database
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct User {
    /// Platform user ID
    pub user_id: i64,
    /// Username at registration time
    pub username: Option<String>,
    /// Unix timestamp of the first registration
    pub registered_at: i64,
}

/// Stored text pair record from database
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct StoredText {
    /// Unique database ID (insertion order)
    pub id: i64,
    /// Uploading user
    pub user_id: i64,
    /// Source text
    pub original: String,
    /// Paraphrased text, NULL when the item failed
    pub result: Option<String>,
    /// Unix timestamp when the batch was stored
    pub created_at: i64,
}

/// Database handle for paraphrase-worker
pub struct Database {
    pool: SqlitePool,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

//! Registration bookkeeping.

use crate::error::DatabaseError;
use crate::{Error, Result};

use super::{Database, User};

impl Database {
    /// Register a user; registering twice keeps the first record
    ///
    /// Returns true when the user was newly inserted.
    pub async fn register_user(&self, user_id: i64, username: Option<&str>) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            "INSERT OR IGNORE INTO users (user_id, username, registered_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(username)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to register user: {}",
                e
            )))
        })?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether `user_id` has registered
    pub async fn is_user_registered(&self, user_id: i64) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to check registration: {}",
                    e
                )))
            })?;

        Ok(found.is_some())
    }

    /// Look up a registered user
    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT user_id, username, registered_at FROM users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get user: {}",
                e
            )))
        })?;

        Ok(user)
    }
}

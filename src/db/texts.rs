//! Processed text pairs.

use crate::error::DatabaseError;
use crate::types::TextPair;
use crate::{Error, Result};

use super::{Database, StoredText};

impl Database {
    /// Store every pair of one batch in a single transaction
    ///
    /// Failed items are stored with a NULL result.
    pub async fn save_texts(&self, user_id: i64, pairs: &[TextPair]) -> Result<()> {
        if pairs.is_empty() {
            return Ok(());
        }

        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to begin transaction: {}",
                e
            )))
        })?;

        for pair in pairs {
            sqlx::query(
                "INSERT INTO texts (user_id, original, result, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(user_id)
            .bind(&pair.original)
            .bind(pair.result.as_deref())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to insert text: {}",
                    e
                )))
            })?;
        }

        tx.commit().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to commit texts: {}",
                e
            )))
        })?;

        tracing::debug!(user_id, count = pairs.len(), "texts saved");
        Ok(())
    }

    /// All pairs stored for `user_id`, in insertion order
    pub async fn get_texts(&self, user_id: i64) -> Result<Vec<TextPair>> {
        let rows = self.get_stored_texts(user_id).await?;
        Ok(rows
            .into_iter()
            .map(|row| TextPair {
                original: row.original,
                result: row.result,
            })
            .collect())
    }

    /// Full stored rows for `user_id`, in insertion order
    pub async fn get_stored_texts(&self, user_id: i64) -> Result<Vec<StoredText>> {
        let rows = sqlx::query_as::<_, StoredText>(
            r#"
            SELECT id, user_id, original, result, created_at
            FROM texts
            WHERE user_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get texts: {}",
                e
            )))
        })?;

        Ok(rows)
    }
}

//! Last-read position storage

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::Result;

/// Book position repository
pub struct BookRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> BookRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Saved position, empty when the book was never opened
    pub async fn current(&self, book_id: &str) -> Result<String> {
        let row: Option<(String,)> = sqlx::query_as("SELECT current FROM books WHERE id = ?")
            .bind(book_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(|(current,)| current).unwrap_or_default())
    }

    /// Store the position, creating the book row on first use
    pub async fn set_current(&self, book_id: &str, current: &str) -> Result<String> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO books (id, current, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET current = excluded.current, updated_at = excluded.updated_at
            "#,
        )
        .bind(book_id)
        .bind(current)
        .bind(&now)
        .execute(self.pool)
        .await?;

        Ok(current.to_string())
    }
}

//! Marks database operations

use chrono::Utc;
use sqlx::SqlitePool;

use crate::annotations::{color_field, Mark, MarkFields, MarkId, MarkType};
use crate::cfi::Cfi;
use crate::error::{AppError, Result};

/// Mark record
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MarkRow {
    pub id: String,
    pub book_id: String,
    pub epubcfi: String,
    pub selected_string: String,
    pub color: String,
    pub content: String,
    #[sqlx(rename = "type")]
    pub mark_type: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<MarkRow> for Mark {
    type Error = AppError;

    fn try_from(row: MarkRow) -> Result<Self> {
        let epubcfi = Cfi::new(row.epubcfi)
            .map_err(|e| AppError::Internal(format!("mark {} has a bad CFI: {}", row.id, e)))?;
        let mark_type: MarkType = row
            .mark_type
            .parse()
            .map_err(|e| AppError::Internal(format!("mark {}: {}", row.id, e)))?;

        Ok(Mark::new(
            MarkId::from(row.id),
            MarkFields {
                book_id: row.book_id,
                epubcfi,
                selected_string: row.selected_string,
                color: color_field::parse(&row.color),
                content: row.content,
                mark_type,
                title: row.title,
            },
        ))
    }
}

fn color_column(fields: &MarkFields) -> &'static str {
    fields.color.map(|c| c.label()).unwrap_or("")
}

/// Mark repository
pub struct MarkRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MarkRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a specific mark
    pub async fn get(&self, id: &str) -> Result<Option<Mark>> {
        let row = sqlx::query_as::<_, MarkRow>(
            r#"
            SELECT id, book_id, epubcfi, selected_string, color, content, type,
                   title, created_at, updated_at
            FROM marks
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Mark::try_from).transpose()
    }

    /// List marks, optionally narrowed to a book and a type
    pub async fn list(&self, book_id: Option<&str>, mark_type: Option<MarkType>) -> Result<Vec<Mark>> {
        let rows = sqlx::query_as::<_, MarkRow>(
            r#"
            SELECT id, book_id, epubcfi, selected_string, color, content, type,
                   title, created_at, updated_at
            FROM marks
            WHERE (?1 IS NULL OR book_id = ?1) AND (?2 IS NULL OR type = ?2)
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(book_id)
        .bind(mark_type.map(|t| t.as_str()))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Mark::try_from).collect()
    }

    /// Create a new mark
    pub async fn create(&self, fields: &MarkFields) -> Result<Mark> {
        let id = MarkId::generate();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO marks (id, book_id, epubcfi, selected_string, color, content, type, title, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.as_str())
        .bind(&fields.book_id)
        .bind(fields.epubcfi.as_str())
        .bind(&fields.selected_string)
        .bind(color_column(fields))
        .bind(&fields.content)
        .bind(fields.mark_type.as_str())
        .bind(&fields.title)
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await?;

        tracing::debug!("Created {} {} in book {}", fields.mark_type.as_str(), id, fields.book_id);

        self.get(id.as_str())
            .await?
            .ok_or_else(|| AppError::Internal("Failed to fetch created mark".to_string()))
    }

    /// Replace the fields of a mark of a book; the mark never changes book
    pub async fn update(&self, id: &str, book_id: &str, fields: &MarkFields) -> Result<Option<Mark>> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            UPDATE marks
            SET epubcfi = ?, selected_string = ?, color = ?, content = ?,
                type = ?, title = ?, updated_at = ?
            WHERE id = ? AND book_id = ?
            "#,
        )
        .bind(fields.epubcfi.as_str())
        .bind(&fields.selected_string)
        .bind(color_column(fields))
        .bind(&fields.content)
        .bind(fields.mark_type.as_str())
        .bind(&fields.title)
        .bind(&now)
        .bind(id)
        .bind(book_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    /// Delete a mark of a book
    pub async fn delete(&self, id: &str, book_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM marks WHERE id = ? AND book_id = ?")
            .bind(id)
            .bind(book_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

//! Database schema initialization

use sqlx::SqlitePool;

use crate::error::Result;

/// Initialize the database schema
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SCHEMA_SQL)
        .execute(pool)
        .await?;

    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Last-read position per book
CREATE TABLE IF NOT EXISTS books (
    id TEXT PRIMARY KEY,
    current TEXT NOT NULL DEFAULT '',
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Highlights and bookmarks
CREATE TABLE IF NOT EXISTS marks (
    id TEXT PRIMARY KEY,
    book_id TEXT NOT NULL,
    epubcfi TEXT NOT NULL,
    selected_string TEXT NOT NULL DEFAULT '',
    color TEXT NOT NULL DEFAULT '',
    content TEXT NOT NULL DEFAULT '',
    type TEXT NOT NULL DEFAULT 'highlight',
    title TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_marks_book_id ON marks(book_id);
CREATE INDEX IF NOT EXISTS idx_marks_book_type ON marks(book_id, type);
"#;

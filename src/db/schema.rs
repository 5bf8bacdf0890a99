//! SQL DDL for the student table and the one-time initializer that applies it.

use crate::db::sqlite::{ConnectionFactory, release};
use crate::error::StudentError;
use tracing::info;

/// SQLite schema with:
/// - `id` INTEGER PRIMARY KEY AUTOINCREMENT, so ids are never reused after a delete
/// - `name` required, `age`/`grade` optional
/// - `email` UNIQUE; NULLs never collide
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    age INTEGER,
    grade TEXT,
    email TEXT UNIQUE
)
"#;

/// Create the `students` table if it does not exist yet. Safe to run repeatedly.
pub async fn ensure_schema(factory: &ConnectionFactory) -> Result<(), StudentError> {
    let mut conn = factory.acquire().await?;
    let outcome = sqlx::query(SQLITE_INIT).execute(&mut conn).await;
    release(conn).await;
    outcome?;
    info!(database = %factory.filename().display(), "students schema ready");
    Ok(())
}

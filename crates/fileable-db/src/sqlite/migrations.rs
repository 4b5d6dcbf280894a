use rusqlite::Connection;

use super::SqliteResultExt;
use crate::DbError;

pub(crate) const LATEST_VERSION: i64 = 1;

pub fn run(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )
    .to_db()?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if current_version < 1 {
        // v1: attachments with polymorphic owner and soft delete
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS attachments (
                id          TEXT PRIMARY KEY,
                path        TEXT NOT NULL UNIQUE,
                name        TEXT NOT NULL,
                \"type\"      TEXT NOT NULL DEFAULT '',
                size        INTEGER NOT NULL DEFAULT 0,
                mime_type   TEXT NOT NULL DEFAULT '',
                description TEXT,
                status      INTEGER NOT NULL DEFAULT 1,
                owner_type  TEXT,
                owner_id    TEXT,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL,
                deleted_at  TEXT,
                CHECK ((owner_type IS NULL) = (owner_id IS NULL))
            );
            CREATE INDEX IF NOT EXISTS idx_attachments_owner
                ON attachments(owner_type, owner_id);
            CREATE INDEX IF NOT EXISTS idx_attachments_deleted
                ON attachments(deleted_at);",
        )
        .to_db()?;

        conn.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (1, datetime('now'))",
            [],
        )
        .to_db()?;
        tracing::debug!("applied sqlite migration v1");
    }

    Ok(())
}

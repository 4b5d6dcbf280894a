use sqlx::{PgConnection, PgPool};

use crate::DbError;

/// Fixed key for the advisory lock that serialises migration runs across
/// concurrent connections.
const MIGRATION_LOCK_KEY: i64 = 0x6669_6C65_6162_6C65; // "fileable" as hex

pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    // Advisory locks belong to a session, so lock, migrate and unlock all
    // run on the same pooled connection.
    let mut conn = pool
        .acquire()
        .await
        .map_err(|e| DbError::Internal(e.to_string()))?;

    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut *conn)
        .await
        .map_err(|e| DbError::Internal(e.to_string()))?;

    let result = run_inner(&mut conn).await;

    let unlocked: Result<bool, sqlx::Error> = sqlx::query_scalar("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .fetch_one(&mut *conn)
        .await;
    match unlocked {
        Ok(true) => {}
        Ok(false) => tracing::warn!("migration lock was not held at unlock"),
        Err(e) => {
            tracing::warn!("could not release migration lock: {e}");
            // Drop the session rather than return a connection still holding the lock.
            drop(conn.detach());
            return result;
        }
    }

    result
}

async fn run_inner(conn: &mut PgConnection) -> Result<(), DbError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TIMESTAMPTZ NOT NULL
        )",
    )
    .execute(&mut *conn)
    .await
    .map_err(|e| DbError::Internal(e.to_string()))?;

    let current: i32 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_version")
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| DbError::Internal(e.to_string()))?;

    if current < 1 {
        sqlx::raw_sql(include_str!("sql/V1__attachments.sql"))
            .execute(&mut *conn)
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?;
        tracing::info!("applied postgres migration v1");
    }

    Ok(())
}

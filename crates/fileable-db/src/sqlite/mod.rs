pub(crate) mod migrations;
pub mod queries;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;

use fileable_core::attachment::{Attachment, AttachmentFilter, NewAttachment};

use crate::{Database, DbConfig, DbError};

/// Extension trait that converts `rusqlite::Result<T>` into `Result<T, DbError>`.
///
/// `DbError` carries no rusqlite variant, so every call inside the query
/// modules maps explicitly; `.to_db()?` keeps that short.
pub(crate) trait SqliteResultExt<T> {
    fn to_db(self) -> Result<T, DbError>;
}

impl<T> SqliteResultExt<T> for rusqlite::Result<T> {
    fn to_db(self) -> Result<T, DbError> {
        self.map_err(map_sqlite_err)
    }
}

#[derive(Clone)]
pub struct SqliteDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDatabase {
    pub fn open(config: &DbConfig) -> Result<Self, DbError> {
        let path = config
            .sqlite_path
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| crate::data_dir().join("fileable.db"));
        std::fs::create_dir_all(path.parent().unwrap_or(Path::new(".")))?;
        Self::open_path(&path)
    }

    pub fn open_path(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path).to_db()?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )
        .to_db()?;
        tracing::debug!("opened sqlite database at {}", path.display());
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory().to_db()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;").to_db()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, DbError> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.with_conn(migrations::run)?;
        Ok(db)
    }

    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Connection) -> Result<T, DbError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| DbError::Internal("lock poisoned".into()))?;
        f(&conn)
    }
}

/// Map a `rusqlite::Error` into a `DbError::Internal`.
pub(crate) fn map_sqlite_err(e: rusqlite::Error) -> DbError {
    DbError::Internal(e.to_string())
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn create_attachment(&self, input: &NewAttachment) -> Result<Attachment, DbError> {
        let db = self.clone();
        let input = input.clone();
        tokio::task::spawn_blocking(move || db.create_attachment_sync(&input))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }

    async fn get_attachment(&self, id: &str) -> Result<Attachment, DbError> {
        let db = self.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || db.get_attachment_sync(&id, false))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }

    async fn get_attachment_with_trashed(&self, id: &str) -> Result<Attachment, DbError> {
        let db = self.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || db.get_attachment_sync(&id, true))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }

    async fn list_attachments(
        &self,
        filter: &AttachmentFilter,
    ) -> Result<Vec<Attachment>, DbError> {
        let db = self.clone();
        let filter = filter.clone();
        tokio::task::spawn_blocking(move || db.list_attachments_sync(&filter))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }

    async fn soft_delete_attachment(&self, id: &str) -> Result<Attachment, DbError> {
        let db = self.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || db.soft_delete_attachment_sync(&id))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }

    async fn restore_attachment(&self, id: &str) -> Result<Attachment, DbError> {
        let db = self.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || db.restore_attachment_sync(&id))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }

    async fn force_delete_attachment(&self, id: &str) -> Result<Attachment, DbError> {
        let db = self.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || db.force_delete_attachment_sync(&id))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }
}

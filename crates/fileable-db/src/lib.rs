#[cfg(feature = "sqlite")]
mod sqlite;
#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use fileable_core::attachment::{Attachment, AttachmentFilter, NewAttachment};
use fileable_core::owner::{Attachable, OwnerRef};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Internal(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistence for attachment rows. Implemented by the SQLite and Postgres
/// backends; callers hold it as `Arc<dyn Database>`.
#[async_trait]
pub trait Database: Send + Sync {
    async fn create_attachment(&self, input: &NewAttachment) -> Result<Attachment, DbError>;

    /// Live (not soft-deleted) row by id.
    async fn get_attachment(&self, id: &str) -> Result<Attachment, DbError>;

    async fn get_attachment_with_trashed(&self, id: &str) -> Result<Attachment, DbError>;

    async fn list_attachments(
        &self,
        filter: &AttachmentFilter,
    ) -> Result<Vec<Attachment>, DbError>;

    async fn list_attachments_for_owner(
        &self,
        owner: &OwnerRef,
    ) -> Result<Vec<Attachment>, DbError> {
        self.list_attachments(&AttachmentFilter::for_owner(owner))
            .await
    }

    /// Mark a live row deleted. The stored bytes are left alone.
    async fn soft_delete_attachment(&self, id: &str) -> Result<Attachment, DbError>;

    /// Clear the deletion marker of a trashed row.
    async fn restore_attachment(&self, id: &str) -> Result<Attachment, DbError>;

    /// Remove the row for good, trashed or not.
    async fn force_delete_attachment(&self, id: &str) -> Result<Attachment, DbError>;
}

/// Live attachments owned by `owner`.
pub async fn attachments_of<A: Attachable + ?Sized>(
    db: &dyn Database,
    owner: &A,
) -> Result<Vec<Attachment>, DbError> {
    db.list_attachments_for_owner(&owner.owner_ref()).await
}

/// Backend selection.
#[derive(Debug, Clone, Default)]
pub struct DbConfig {
    /// Postgres connection string. Takes precedence when set and the
    /// `postgres` feature is enabled.
    pub database_url: Option<String>,
    /// SQLite file path. Defaults to `<data dir>/fileable.db`.
    pub sqlite_path: Option<String>,
}

impl DbConfig {
    /// Read `FILEABLE_DATABASE_URL` and `FILEABLE_SQLITE_PATH`.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("FILEABLE_DATABASE_URL").ok(),
            sqlite_path: std::env::var("FILEABLE_SQLITE_PATH").ok(),
        }
    }
}

/// Open the configured backend and run its migrations.
pub async fn create_database(config: &DbConfig) -> Result<Arc<dyn Database>, DbError> {
    if let Some(url) = config.database_url.as_deref() {
        #[cfg(feature = "postgres")]
        {
            tracing::info!("using postgres database");
            return Ok(Arc::new(postgres::PostgresDatabase::connect(url).await?));
        }
        #[cfg(not(feature = "postgres"))]
        {
            let _ = url;
            return Err(DbError::Internal(
                "database_url is set but the 'postgres' feature is not enabled".into(),
            ));
        }
    }

    #[cfg(feature = "sqlite")]
    {
        let db = SqliteDatabase::open(config)?;
        Ok(Arc::new(db))
    }
    #[cfg(not(feature = "sqlite"))]
    {
        Err(DbError::Internal(
            "no database backend enabled; build with 'sqlite' or 'postgres'".into(),
        ))
    }
}

/// Base directory for fileable's local state.
pub fn data_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    };
    base.join("fileable")
}

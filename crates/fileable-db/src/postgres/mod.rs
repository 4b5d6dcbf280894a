pub(crate) mod migrations;
pub mod queries;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use fileable_core::attachment::{Attachment, AttachmentFilter, NewAttachment};

use crate::{Database, DbError};

/// Map a sqlx::Error into a DbError::Internal.
pub(crate) fn pg_err(e: sqlx::Error) -> DbError {
    DbError::Internal(e.to_string())
}

/// Create a DbError::NotFound with the given entity description.
pub(crate) fn pg_not_found(entity: &str) -> DbError {
    DbError::NotFound(entity.to_string())
}

#[derive(Clone)]
pub struct PostgresDatabase {
    pub(crate) pool: PgPool,
}

impl PostgresDatabase {
    /// Connect to a Postgres database and run migrations.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(pg_err)?;

        let db = Self { pool };
        migrations::run(&db.pool).await?;
        Ok(db)
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    async fn create_attachment(&self, input: &NewAttachment) -> Result<Attachment, DbError> {
        self.pg_create_attachment(input).await
    }
    async fn get_attachment(&self, id: &str) -> Result<Attachment, DbError> {
        self.pg_get_attachment(id, false).await
    }
    async fn get_attachment_with_trashed(&self, id: &str) -> Result<Attachment, DbError> {
        self.pg_get_attachment(id, true).await
    }
    async fn list_attachments(
        &self,
        filter: &AttachmentFilter,
    ) -> Result<Vec<Attachment>, DbError> {
        self.pg_list_attachments(filter).await
    }
    async fn soft_delete_attachment(&self, id: &str) -> Result<Attachment, DbError> {
        self.pg_soft_delete_attachment(id).await
    }
    async fn restore_attachment(&self, id: &str) -> Result<Attachment, DbError> {
        self.pg_restore_attachment(id).await
    }
    async fn force_delete_attachment(&self, id: &str) -> Result<Attachment, DbError> {
        self.pg_force_delete_attachment(id).await
    }
}

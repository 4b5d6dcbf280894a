use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};

use fileable_core::attachment::{Attachment, AttachmentFilter, NewAttachment, Trashed};
use fileable_core::owner::OwnerRef;

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use crate::DbError;

#[derive(sqlx::FromRow)]
struct AttachmentRow {
    id: String,
    path: String,
    name: String,
    #[sqlx(rename = "type")]
    file_type: String,
    size: i64,
    mime_type: String,
    description: Option<String>,
    status: bool,
    owner_type: Option<String>,
    owner_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<AttachmentRow> for Attachment {
    fn from(r: AttachmentRow) -> Self {
        Attachment {
            id: r.id,
            path: r.path,
            name: r.name,
            file_type: r.file_type,
            size: r.size,
            mime_type: r.mime_type,
            description: r.description,
            status: r.status,
            owner: OwnerRef::from_columns(r.owner_type, r.owner_id),
            created_at: r.created_at,
            updated_at: r.updated_at,
            deleted_at: r.deleted_at,
        }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_create_attachment(
        &self,
        input: &NewAttachment,
    ) -> Result<Attachment, DbError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        let row = sqlx::query_as::<_, AttachmentRow>(
            "INSERT INTO attachments (
                id, path, name, \"type\", size, mime_type, description, status,
                owner_type, owner_id, created_at, updated_at
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
             RETURNING *",
        )
        .bind(&id)
        .bind(&input.path)
        .bind(&input.name)
        .bind(&input.file_type)
        .bind(input.size)
        .bind(&input.mime_type)
        .bind(&input.description)
        .bind(input.status)
        .bind(input.owner.as_ref().map(|o| o.owner_type.as_str()))
        .bind(input.owner.as_ref().map(|o| o.owner_id.as_str()))
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(row.into())
    }

    pub(crate) async fn pg_get_attachment(
        &self,
        id: &str,
        with_trashed: bool,
    ) -> Result<Attachment, DbError> {
        let sql = if with_trashed {
            "SELECT * FROM attachments WHERE id = $1"
        } else {
            "SELECT * FROM attachments WHERE id = $1 AND deleted_at IS NULL"
        };
        let row = sqlx::query_as::<_, AttachmentRow>(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("attachment {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_list_attachments(
        &self,
        filter: &AttachmentFilter,
    ) -> Result<Vec<Attachment>, DbError> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM attachments WHERE 1=1");

        if let Some(ref owner) = filter.owner {
            query.push(" AND owner_type = ").push_bind(owner.owner_type.clone());
            query.push(" AND owner_id = ").push_bind(owner.owner_id.clone());
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        match filter.trashed {
            Trashed::Exclude => {
                query.push(" AND deleted_at IS NULL");
            }
            Trashed::Only => {
                query.push(" AND deleted_at IS NOT NULL");
            }
            Trashed::Include => {}
        }

        query.push(" ORDER BY created_at ASC, id ASC");

        if let Some(limit) = filter.limit {
            query.push(" LIMIT ").push_bind(limit);
        }

        let rows = query
            .build_query_as::<AttachmentRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub(crate) async fn pg_soft_delete_attachment(&self, id: &str) -> Result<Attachment, DbError> {
        let row = sqlx::query_as::<_, AttachmentRow>(
            "UPDATE attachments SET deleted_at = $1, updated_at = $1
             WHERE id = $2 AND deleted_at IS NULL
             RETURNING *",
        )
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(pg_err)?
        .ok_or_else(|| pg_not_found(&format!("attachment {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_restore_attachment(&self, id: &str) -> Result<Attachment, DbError> {
        let row = sqlx::query_as::<_, AttachmentRow>(
            "UPDATE attachments SET deleted_at = NULL, updated_at = $1
             WHERE id = $2 AND deleted_at IS NOT NULL
             RETURNING *",
        )
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(pg_err)?
        .ok_or_else(|| pg_not_found(&format!("trashed attachment {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_force_delete_attachment(
        &self,
        id: &str,
    ) -> Result<Attachment, DbError> {
        let row = sqlx::query_as::<_, AttachmentRow>(
            "DELETE FROM attachments WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(pg_err)?
        .ok_or_else(|| pg_not_found(&format!("attachment {id}")))?;

        Ok(row.into())
    }
}

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use fileable_core::attachment::{Attachment, AttachmentFilter, NewAttachment, Trashed};
use fileable_core::owner::OwnerRef;

use super::super::{SqliteDatabase, SqliteResultExt};
use crate::DbError;

fn row_to_attachment(row: &Row) -> rusqlite::Result<Attachment> {
    Ok(Attachment {
        id: row.get("id")?,
        path: row.get("path")?,
        name: row.get("name")?,
        file_type: row.get("type")?,
        size: row.get("size")?,
        mime_type: row.get("mime_type")?,
        description: row.get("description")?,
        status: row.get("status")?,
        owner: OwnerRef::from_columns(row.get("owner_type")?, row.get("owner_id")?),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}

fn find(conn: &Connection, id: &str, with_trashed: bool) -> Result<Attachment, DbError> {
    let sql = if with_trashed {
        "SELECT * FROM attachments WHERE id = ?1"
    } else {
        "SELECT * FROM attachments WHERE id = ?1 AND deleted_at IS NULL"
    };
    conn.query_row(sql, params![id], row_to_attachment)
        .optional()
        .to_db()?
        .ok_or_else(|| DbError::NotFound(format!("attachment {id}")))
}

impl SqliteDatabase {
    pub fn create_attachment_sync(&self, input: &NewAttachment) -> Result<Attachment, DbError> {
        self.with_conn(|conn| {
            let id = uuid::Uuid::new_v4().to_string();
            let now = Utc::now();
            let (owner_type, owner_id) = match &input.owner {
                Some(owner) => (Some(owner.owner_type.as_str()), Some(owner.owner_id.as_str())),
                None => (None, None),
            };
            conn.execute(
                "INSERT INTO attachments (
                    id, path, name, \"type\", size, mime_type, description, status,
                    owner_type, owner_id, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
                params![
                    id,
                    input.path,
                    input.name,
                    input.file_type,
                    input.size,
                    input.mime_type,
                    input.description,
                    input.status,
                    owner_type,
                    owner_id,
                    now,
                ],
            )
            .to_db()?;
            find(conn, &id, true)
        })
    }

    pub fn get_attachment_sync(&self, id: &str, with_trashed: bool) -> Result<Attachment, DbError> {
        self.with_conn(|conn| find(conn, id, with_trashed))
    }

    pub fn list_attachments_sync(
        &self,
        filter: &AttachmentFilter,
    ) -> Result<Vec<Attachment>, DbError> {
        self.with_conn(|conn| {
            let mut sql = String::from("SELECT * FROM attachments WHERE 1=1");
            let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

            if let Some(ref owner) = filter.owner {
                param_values.push(Box::new(owner.owner_type.clone()));
                sql.push_str(&format!(" AND owner_type = ?{}", param_values.len()));
                param_values.push(Box::new(owner.owner_id.clone()));
                sql.push_str(&format!(" AND owner_id = ?{}", param_values.len()));
            }
            if let Some(status) = filter.status {
                param_values.push(Box::new(status));
                sql.push_str(&format!(" AND status = ?{}", param_values.len()));
            }
            match filter.trashed {
                Trashed::Exclude => sql.push_str(" AND deleted_at IS NULL"),
                Trashed::Only => sql.push_str(" AND deleted_at IS NOT NULL"),
                Trashed::Include => {}
            }

            sql.push_str(" ORDER BY created_at ASC, rowid ASC");

            if let Some(limit) = filter.limit {
                param_values.push(Box::new(limit));
                sql.push_str(&format!(" LIMIT ?{}", param_values.len()));
            }

            let params_ref: Vec<&dyn rusqlite::types::ToSql> =
                param_values.iter().map(|p| p.as_ref()).collect();

            let mut stmt = conn.prepare(&sql).to_db()?;
            let attachments = stmt
                .query_map(params_ref.as_slice(), row_to_attachment)
                .to_db()?
                .collect::<Result<Vec<_>, _>>()
                .to_db()?;
            Ok(attachments)
        })
    }

    pub fn soft_delete_attachment_sync(&self, id: &str) -> Result<Attachment, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            let changed = conn
                .execute(
                    "UPDATE attachments SET deleted_at = ?1, updated_at = ?1
                     WHERE id = ?2 AND deleted_at IS NULL",
                    params![now, id],
                )
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("attachment {id}")));
            }
            find(conn, id, true)
        })
    }

    pub fn restore_attachment_sync(&self, id: &str) -> Result<Attachment, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            let changed = conn
                .execute(
                    "UPDATE attachments SET deleted_at = NULL, updated_at = ?1
                     WHERE id = ?2 AND deleted_at IS NOT NULL",
                    params![now, id],
                )
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("trashed attachment {id}")));
            }
            find(conn, id, false)
        })
    }

    pub fn force_delete_attachment_sync(&self, id: &str) -> Result<Attachment, DbError> {
        self.with_conn(|conn| {
            let attachment = find(conn, id, true)?;
            conn.execute("DELETE FROM attachments WHERE id = ?1", params![id])
                .to_db()?;
            Ok(attachment)
        })
    }
}

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use fileable_core::attachment::{AttachmentFilter, Trashed};
use fileable_ingest::{is_http, parse_url, FileInput, FileRequest, IngestOptions};
use fileable_store::object_key;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{db_error, ingest_error, store_error, ApiError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/uploads", post(upload))
        .route(
            "/api/owners/{owner_type}/{owner_id}/attachments",
            get(list_for_owner).post(upload_for_owner),
        )
        .route(
            "/api/owners/{owner_type}/{owner_id}/attachments/remote",
            post(remote_for_owner),
        )
        .route(
            "/api/attachments/{id}",
            get(get_attachment).delete(delete_attachment),
        )
        .route("/api/attachments/{id}/restore", post(restore_attachment))
        .route("/api/attachments/{id}/content", get(attachment_content))
}

#[derive(Debug, Deserialize)]
struct UploadQuery {
    path: Option<String>,
    field: Option<String>,
    description: Option<String>,
    status: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RemoteRequest {
    urls: Vec<String>,
    path: Option<String>,
    description: Option<String>,
    status: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    with_trashed: bool,
}

/// Storage directory for owner uploads: the requested one, else
/// `<default>/<owner_type>`.
fn owner_path(state: &AppState, requested: Option<String>, owner_type: &str) -> String {
    requested.unwrap_or_else(|| object_key(&state.default_path, owner_type))
}

async fn upload(
    State(state): State<AppState>,
    Query(q): Query<UploadQuery>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let request = FileRequest::from_multipart(multipart)
        .await
        .map_err(ingest_error)?;

    let mut options = IngestOptions::new();
    if let Some(field) = q.field {
        options = options.with_field_name(field);
    }
    let path = q.path.unwrap_or_else(|| state.default_path.clone());

    let stored = state
        .ingestor
        .ingest(FileInput::Request(request), &path, &options)
        .await
        .map_err(ingest_error)?;

    Ok((StatusCode::CREATED, Json(json!({ "paths": stored.paths() }))))
}

async fn upload_for_owner(
    State(state): State<AppState>,
    Path((owner_type, owner_id)): Path<(String, String)>,
    Query(q): Query<UploadQuery>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let owner = state.resolve_owner(&owner_type, &owner_id)?;
    let request = FileRequest::from_multipart(multipart)
        .await
        .map_err(ingest_error)?;

    let mut options = IngestOptions::configure(Some(owner), q.description, q.status.unwrap_or(true));
    if let Some(field) = q.field {
        options = options.with_field_name(field);
    }
    let path = owner_path(&state, q.path, &owner_type);

    let stored = state
        .ingestor
        .ingest(FileInput::Request(request), &path, &options)
        .await
        .map_err(ingest_error)?;

    let attachments: Vec<_> = stored.attachments().collect();
    Ok((StatusCode::CREATED, Json(json!(attachments))))
}

async fn remote_for_owner(
    State(state): State<AppState>,
    Path((owner_type, owner_id)): Path<(String, String)>,
    Json(input): Json<RemoteRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let owner = state.resolve_owner(&owner_type, &owner_id)?;

    if input.urls.is_empty() {
        return Err(ingest_error(fileable_ingest::IngestError::InvalidInput(
            "urls must not be empty".into(),
        )));
    }
    // Local paths are only reachable from the CLI.
    if let Some(bad) = input
        .urls
        .iter()
        .find(|u| !parse_url(u).is_some_and(|url| is_http(&url)))
    {
        return Err(ingest_error(fileable_ingest::IngestError::InvalidInput(
            format!("`{bad}` is not an http(s) url"),
        )));
    }

    let options = IngestOptions::configure(
        Some(owner),
        input.description,
        input.status.unwrap_or(true),
    );
    let path = owner_path(&state, input.path, &owner_type);

    let stored = state
        .ingestor
        .ingest(FileInput::many(input.urls), &path, &options)
        .await
        .map_err(ingest_error)?;

    let attachments: Vec<_> = stored.attachments().collect();
    Ok((StatusCode::CREATED, Json(json!(attachments))))
}

async fn list_for_owner(
    State(state): State<AppState>,
    Path((owner_type, owner_id)): Path<(String, String)>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let owner = state.resolve_owner(&owner_type, &owner_id)?;
    let filter = AttachmentFilter {
        owner: Some(owner),
        trashed: if q.with_trashed {
            Trashed::Include
        } else {
            Trashed::Exclude
        },
        ..Default::default()
    };
    state
        .db
        .list_attachments(&filter)
        .await
        .map(|a| Json(json!(a)))
        .map_err(db_error)
}

async fn get_attachment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .db
        .get_attachment(&id)
        .await
        .map(|a| Json(json!(a)))
        .map_err(db_error)
}

async fn delete_attachment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let trashed = state.db.soft_delete_attachment(&id).await.map_err(db_error)?;
    tracing::info!(id = %trashed.id, "soft-deleted attachment");
    Ok(Json(json!(trashed)))
}

async fn restore_attachment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let restored = state.db.restore_attachment(&id).await.map_err(db_error)?;
    tracing::info!(id = %restored.id, "restored attachment");
    Ok(Json(json!(restored)))
}

async fn attachment_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let attachment = state.db.get_attachment(&id).await.map_err(db_error)?;
    let data = state
        .store
        .get(&attachment.path)
        .await
        .map_err(store_error)?;
    Ok(([(header::CONTENT_TYPE, attachment.mime_type)], data).into_response())
}

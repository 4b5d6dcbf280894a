pub mod attachments;
pub mod health;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::{Json, Router};
use fileable_core::{FileableError, OwnerRef, OwnerRegistry};
use fileable_db::{Database, DbError};
use fileable_ingest::{IngestError, Ingestor};
use fileable_store::{ObjectStore, StoreError};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

pub struct InnerAppState {
    pub db: Arc<dyn Database>,
    pub store: Arc<dyn ObjectStore>,
    pub ingestor: Ingestor,
    pub owners: OwnerRegistry,
    /// Storage directory for requests that do not name one.
    pub default_path: String,
    pub max_upload_bytes: usize,
}

impl InnerAppState {
    pub(crate) fn resolve_owner(&self, tag: &str, id: &str) -> Result<OwnerRef, ApiError> {
        self.owners.resolve(tag, id).map_err(core_error)
    }
}

pub type AppState = Arc<InnerAppState>;

pub fn build_router(state: AppState) -> Router {
    let limit = state.max_upload_bytes;
    Router::new()
        .merge(health::routes())
        .merge(attachments::routes())
        .layer(DefaultBodyLimit::max(limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// -- Error mapping --

pub(crate) type ApiError = (StatusCode, Json<Value>);

fn error_body(status: StatusCode, msg: String) -> ApiError {
    (status, Json(json!({ "error": msg })))
}

pub(crate) fn core_error(e: FileableError) -> ApiError {
    let status = match &e {
        FileableError::NotFound(_) => StatusCode::NOT_FOUND,
        FileableError::InvalidInput(_) => StatusCode::BAD_REQUEST,
    };
    error_body(status, e.to_string())
}

pub(crate) fn db_error(e: DbError) -> ApiError {
    let status = match &e {
        DbError::NotFound(_) => StatusCode::NOT_FOUND,
        DbError::Internal(_) | DbError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_body(status, e.to_string())
}

pub(crate) fn store_error(e: StoreError) -> ApiError {
    let status = match &e {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::InvalidKey(_) => StatusCode::BAD_REQUEST,
        StoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_body(status, e.to_string())
}

pub(crate) fn ingest_error(e: IngestError) -> ApiError {
    match e {
        IngestError::InvalidInput(_) => error_body(StatusCode::BAD_REQUEST, e.to_string()),
        IngestError::DownloadFailure(_) => error_body(StatusCode::BAD_GATEWAY, e.to_string()),
        IngestError::Store(inner) => store_error(inner),
        IngestError::Database(inner) => db_error(inner),
        IngestError::Io(_) => {
            tracing::error!("ingest io error: {e}");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

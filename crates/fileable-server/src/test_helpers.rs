use std::sync::Arc;

use axum::Router;
use fileable_core::OwnerRegistry;
use fileable_ingest::{Downloader, HttpDownloader, IngestConfig, Ingestor};
use fileable_store::StoreConfig;
use tokio::net::TcpListener;

use crate::routes::{AppState, InnerAppState};

/// State with in-memory SQLite, a temp local store and an open owner registry.
pub fn test_state_with(downloader: Arc<dyn Downloader>) -> AppState {
    let db = Arc::new(fileable_db::SqliteDatabase::open_in_memory().unwrap());
    let storage_dir = tempfile::tempdir().unwrap().keep();
    let store = fileable_store::create_store(&StoreConfig::local(storage_dir)).unwrap();
    let ingestor = Ingestor::new(store.clone(), db.clone(), downloader, IngestConfig::default());
    Arc::new(InnerAppState {
        db,
        store,
        ingestor,
        owners: OwnerRegistry::open(),
        default_path: "uploads".into(),
        max_upload_bytes: 10 * 1024 * 1024,
    })
}

pub fn test_state() -> AppState {
    test_state_with(Arc::new(HttpDownloader::default()))
}

/// Build a test router over `test_state()`.
pub async fn test_router() -> Router {
    crate::routes::build_router(test_state())
}

/// A running test server with base_url and background task handle.
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    _handle: tokio::task::JoinHandle<()>,
}

/// Spawn an axum test server on a random port.
pub async fn spawn_test_server_with(state: AppState) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");
    let app = crate::routes::build_router(state.clone());
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base_url,
        state,
        _handle: handle,
    }
}

pub async fn spawn_test_server() -> TestServer {
    spawn_test_server_with(test_state()).await
}

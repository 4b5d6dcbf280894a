pub mod config;
mod routes;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

use std::sync::Arc;

use anyhow::Result;
use fileable_db::DbConfig;
use fileable_ingest::Ingestor;
use fileable_store::StoreConfig;
use tokio::net::TcpListener;

pub use config::ServerConfig;
pub use routes::{build_router, AppState, InnerAppState};

/// Wire the store, database and ingestor described by `config` and the
/// environment.
pub async fn build_state(config: &ServerConfig) -> Result<AppState> {
    let store = fileable_store::create_store(&StoreConfig::from_env())?;
    let db = fileable_db::create_database(&DbConfig::from_env()).await?;
    let ingestor = Ingestor::with_http(store.clone(), db.clone(), config.ingest_config())?;

    Ok(Arc::new(InnerAppState {
        db,
        store,
        ingestor,
        owners: config.owner_registry()?,
        default_path: config.default_path.clone(),
        max_upload_bytes: config.max_upload_bytes(),
    }))
}

pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let app = routes::build_router(state);
    axum::serve(listener, app).await?;
    Ok(())
}

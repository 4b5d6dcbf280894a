use fileable_db::DbError;
use fileable_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("download failed: {0}")]
    DownloadFailure(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

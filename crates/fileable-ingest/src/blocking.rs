use tokio::runtime::Runtime;

use crate::{FileInput, IngestError, IngestOptions, Ingested, Ingestor};

/// Blocking wrapper around the async `Ingestor`.
///
/// Owns a tokio runtime and uses `block_on()` for each call. Must not be
/// used from inside another runtime.
pub struct BlockingIngestor {
    inner: Ingestor,
    rt: Runtime,
}

impl BlockingIngestor {
    pub fn new(inner: Ingestor) -> Result<Self, IngestError> {
        Ok(Self {
            inner,
            rt: Runtime::new()?,
        })
    }

    pub fn ingest(
        &self,
        input: FileInput,
        storage_path: &str,
        options: &IngestOptions,
    ) -> Result<Ingested, IngestError> {
        self.rt
            .block_on(self.inner.ingest(input, storage_path, options))
    }

    pub fn inner(&self) -> &Ingestor {
        &self.inner
    }
}

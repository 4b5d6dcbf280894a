use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use reqwest::Url;
use serde::Serialize;

use fileable_core::attachment::{Attachment, NewAttachment};
use fileable_db::Database;
use fileable_store::{object_key, ObjectStore};

use crate::download::{parse_url, url_file_name, Downloader, HttpDownloader};
use crate::input::{FileInput, RequestFiles, UploadedFile};
use crate::naming::{content_mime, hash_name};
use crate::options::{IngestConfig, IngestOptions, OrphanPolicy};
use crate::IngestError;

/// One file written to the store.
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    /// Storage-relative key.
    pub path: String,
    /// Row created for the configured owner, if any.
    pub attachment: Option<Attachment>,
}

/// Result shape mirrors the input shape: one handle in, one file out. A
/// collection yields one entry per element, each shaped like that element,
/// and a multi-file request field yields one `Single` per file.
#[derive(Debug, Clone)]
pub enum Ingested {
    Single(StoredFile),
    Many(Vec<Ingested>),
}

impl Ingested {
    /// Top-level entries: one per input element for `Many`, itself for `Single`.
    pub fn elements(&self) -> &[Ingested] {
        match self {
            Ingested::Single(_) => std::slice::from_ref(self),
            Ingested::Many(items) => items,
        }
    }

    /// Every stored file, depth first in input order.
    pub fn files(&self) -> Vec<&StoredFile> {
        let mut out = Vec::new();
        self.collect_files(&mut out);
        out
    }

    fn collect_files<'a>(&'a self, out: &mut Vec<&'a StoredFile>) {
        match self {
            Ingested::Single(file) => out.push(file),
            Ingested::Many(items) => items.iter().for_each(|item| item.collect_files(out)),
        }
    }

    pub fn into_files(self) -> Vec<StoredFile> {
        match self {
            Ingested::Single(file) => vec![file],
            Ingested::Many(items) => items.into_iter().flat_map(Ingested::into_files).collect(),
        }
    }

    pub fn paths(&self) -> Vec<&str> {
        self.files().into_iter().map(|f| f.path.as_str()).collect()
    }

    pub fn attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.files().into_iter().filter_map(|f| f.attachment.as_ref())
    }

    pub fn len(&self) -> usize {
        self.elements().len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements().is_empty()
    }
}

type IngestFuture<'a> = Pin<Box<dyn Future<Output = Result<Ingested, IngestError>> + Send + 'a>>;

/// Stores incoming files and records them against their owner.
///
/// Holds only its collaborators and immutable config; everything that varies
/// per call travels in `IngestOptions`.
pub struct Ingestor {
    store: Arc<dyn ObjectStore>,
    db: Arc<dyn Database>,
    downloader: Arc<dyn Downloader>,
    config: IngestConfig,
}

impl Ingestor {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        db: Arc<dyn Database>,
        downloader: Arc<dyn Downloader>,
        config: IngestConfig,
    ) -> Self {
        Self {
            store,
            db,
            downloader,
            config,
        }
    }

    /// Ingestor that downloads over HTTP, honoring `config.download_timeout`.
    pub fn with_http(
        store: Arc<dyn ObjectStore>,
        db: Arc<dyn Database>,
        config: IngestConfig,
    ) -> Result<Self, IngestError> {
        let downloader = HttpDownloader::new(config.download_timeout)?;
        Ok(Self::new(store, db, Arc::new(downloader), config))
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn db(&self) -> &Arc<dyn Database> {
        &self.db
    }

    /// Store `input` under `storage_path`.
    ///
    /// Elements are processed in order and the first failure aborts the call.
    /// Files stored before the failing element stay where they are.
    pub async fn ingest(
        &self,
        input: FileInput,
        storage_path: &str,
        options: &IngestOptions,
    ) -> Result<Ingested, IngestError> {
        self.dispatch(input, storage_path, options).await
    }

    fn dispatch<'a>(
        &'a self,
        input: FileInput,
        storage_path: &'a str,
        options: &'a IngestOptions,
    ) -> IngestFuture<'a> {
        Box::pin(async move {
            match input {
                FileInput::Many(items) => {
                    tracing::debug!(count = items.len(), "ingesting collection");
                    let mut stored = Vec::with_capacity(items.len());
                    for item in items {
                        stored.push(self.dispatch(item, storage_path, options).await?);
                    }
                    Ok(Ingested::Many(stored))
                }
                FileInput::Request(request) => {
                    tracing::debug!(field = %options.field_name, "ingesting request field");
                    match request.take_files(&options.field_name)? {
                        RequestFiles::One(file) => Ok(Ingested::Single(
                            self.store_file(file, storage_path, options).await?,
                        )),
                        RequestFiles::Many(files) => {
                            let mut stored = Vec::with_capacity(files.len());
                            for file in files {
                                stored.push(Ingested::Single(
                                    self.store_file(file, storage_path, options).await?,
                                ));
                            }
                            Ok(Ingested::Many(stored))
                        }
                    }
                }
                FileInput::Upload(file) => Ok(Ingested::Single(
                    self.store_file(file, storage_path, options).await?,
                )),
                FileInput::Source(source) => {
                    let file = self.resolve_source(&source).await?;
                    Ok(Ingested::Single(
                        self.store_file(file, storage_path, options).await?,
                    ))
                }
            }
        })
    }

    /// URL first, then existing local file.
    async fn resolve_source(&self, source: &str) -> Result<UploadedFile, IngestError> {
        if let Some(url) = parse_url(source) {
            tracing::debug!(%url, "source is a url");
            return self.download(&url).await;
        }

        let is_file = tokio::fs::metadata(source)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if is_file {
            tracing::debug!(path = source, "source is a local file");
            return Ok(UploadedFile::from_path(Path::new(source)));
        }

        Err(IngestError::InvalidInput(format!(
            "`{source}` is neither a url nor an existing file"
        )))
    }

    async fn download(&self, url: &Url) -> Result<UploadedFile, IngestError> {
        let download = self.downloader.fetch(url).await?;
        if download.body.is_empty() {
            return Err(IngestError::DownloadFailure(format!("{url}: empty response")));
        }

        let temp = tempfile::Builder::new().prefix("fileable-").tempfile()?;
        tokio::fs::write(temp.path(), &download.body).await?;
        tracing::debug!(%url, size = download.body.len(), "downloaded");

        Ok(UploadedFile::from_temp(
            url_file_name(url),
            download.content_type,
            temp,
        ))
    }

    async fn store_file(
        &self,
        file: UploadedFile,
        storage_path: &str,
        options: &IngestOptions,
    ) -> Result<StoredFile, IngestError> {
        let content = file.read().await?;
        let key = object_key(storage_path, &hash_name(&content));
        let size = content.len() as i64;
        let mime_type = content_mime(&content, file.declared_mime_type());

        self.store
            .put_with_content_type(&key, content, &mime_type)
            .await?;
        tracing::info!(path = %key, size, name = file.original_name(), "stored file");

        let Some(owner) = options.owner.clone() else {
            return Ok(StoredFile {
                path: key,
                attachment: None,
            });
        };

        let new = NewAttachment {
            path: key.clone(),
            name: file.original_name().to_string(),
            file_type: file.original_extension().to_string(),
            size,
            mime_type,
            description: options.description.clone(),
            status: options.status,
            owner: Some(owner),
        };

        match self.db.create_attachment(&new).await {
            Ok(attachment) => {
                tracing::info!(id = %attachment.id, path = %key, "created attachment");
                Ok(StoredFile {
                    path: key,
                    attachment: Some(attachment),
                })
            }
            Err(e) => {
                if self.config.orphan_policy == OrphanPolicy::Compensate {
                    if let Err(del) = self.store.delete(&key).await {
                        tracing::warn!(path = %key, "could not remove orphaned file: {del}");
                    }
                }
                Err(e.into())
            }
        }
    }
}


//! Turn loosely shaped file input (uploads, request fields, URLs, local
//! paths, or collections of those) into stored objects, optionally recorded
//! as attachment rows for an owner.

mod blocking;
mod download;
mod error;
mod ingestor;
mod input;
#[cfg(feature = "multipart")]
mod multipart;
mod naming;
mod options;

pub use blocking::BlockingIngestor;
pub use download::{is_http, parse_url, Download, Downloader, HttpDownloader};
pub use error::IngestError;
pub use ingestor::{Ingested, Ingestor, StoredFile};
pub use input::{FileInput, FileRequest, RequestField, UploadedFile};
pub use naming::{hash_name, sniff_mime};
pub use options::{IngestConfig, IngestOptions, OrphanPolicy};
pub use reqwest::Url;

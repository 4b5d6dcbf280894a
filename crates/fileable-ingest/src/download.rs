use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};

use crate::IngestError;

/// A fully buffered response body.
#[derive(Debug, Clone)]
pub struct Download {
    pub body: Bytes,
    pub content_type: Option<String>,
}

/// Fetches remote files for `FileInput::Source` URLs.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Fetch `url` completely. Transport errors and non-success statuses are
    /// `IngestError::DownloadFailure`.
    async fn fetch(&self, url: &Url) -> Result<Download, IngestError>;
}

/// `reqwest`-backed downloader.
#[derive(Debug, Clone, Default)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new(timeout: Option<Duration>) -> Result<Self, IngestError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| IngestError::DownloadFailure(format!("http client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn fetch(&self, url: &Url) -> Result<Download, IngestError> {
        if !is_http(url) {
            return Err(IngestError::DownloadFailure(format!(
                "{url}: unsupported scheme `{}`",
                url.scheme()
            )));
        }

        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| IngestError::DownloadFailure(format!("{url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(IngestError::DownloadFailure(format!("{url}: {status}")));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp
            .bytes()
            .await
            .map_err(|e| IngestError::DownloadFailure(format!("{url}: read body: {e}")))?;

        Ok(Download { body, content_type })
    }
}

/// `Some` for any absolute URL with a host, whatever its scheme. Whether the
/// scheme can actually be fetched is up to the `Downloader`.
pub fn parse_url(source: &str) -> Option<Url> {
    let url = Url::parse(source).ok()?;
    url.host_str().is_some_and(|h| !h.is_empty()).then_some(url)
}

pub fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Last non-empty path segment, or `"download"`.
pub(crate) fn url_file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.rfind(|segment| !segment.is_empty()))
        .unwrap_or("download")
        .to_string()
}

use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tempfile::NamedTempFile;

use crate::IngestError;

/// Everything `Ingestor::ingest` accepts.
#[derive(Debug)]
pub enum FileInput {
    /// Ingested element by element, in order; the result holds one entry
    /// per element.
    Many(Vec<FileInput>),
    /// A request whose named field carries one or more uploads.
    Request(FileRequest),
    /// A file handle ready to be stored.
    Upload(UploadedFile),
    /// A URL to download, or a path to an existing local file.
    Source(String),
}

impl FileInput {
    pub fn many<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<FileInput>,
    {
        FileInput::Many(items.into_iter().map(Into::into).collect())
    }
}

impl From<UploadedFile> for FileInput {
    fn from(file: UploadedFile) -> Self {
        FileInput::Upload(file)
    }
}

impl From<FileRequest> for FileInput {
    fn from(request: FileRequest) -> Self {
        FileInput::Request(request)
    }
}

impl From<String> for FileInput {
    fn from(source: String) -> Self {
        FileInput::Source(source)
    }
}

impl From<&str> for FileInput {
    fn from(source: &str) -> Self {
        FileInput::Source(source.to_string())
    }
}

impl From<Vec<FileInput>> for FileInput {
    fn from(items: Vec<FileInput>) -> Self {
        FileInput::Many(items)
    }
}

enum FileBody {
    Bytes(Bytes),
    Path(PathBuf),
    // Removed from disk when the handle drops.
    Temp(NamedTempFile),
}

/// A file as the client presented it: original name, optional declared MIME
/// type, and where the bytes currently live.
pub struct UploadedFile {
    original_name: String,
    mime_type: Option<String>,
    body: FileBody,
}

impl UploadedFile {
    pub fn from_bytes(
        original_name: impl Into<String>,
        mime_type: Option<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            mime_type,
            body: FileBody::Bytes(data.into()),
        }
    }

    /// Wrap a local file. The original name is the path's final component.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            original_name: base_name(&path),
            mime_type: None,
            body: FileBody::Path(path),
        }
    }

    pub(crate) fn from_temp(
        original_name: impl Into<String>,
        mime_type: Option<String>,
        file: NamedTempFile,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            mime_type,
            body: FileBody::Temp(file),
        }
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Extension of the original name, case preserved. Empty when there is
    /// none.
    pub fn original_extension(&self) -> &str {
        Path::new(&self.original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
    }

    pub fn declared_mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// Local path backing this handle, if the bytes are on disk.
    pub fn local_path(&self) -> Option<&Path> {
        match &self.body {
            FileBody::Bytes(_) => None,
            FileBody::Path(path) => Some(path),
            FileBody::Temp(file) => Some(file.path()),
        }
    }

    pub async fn read(&self) -> Result<Bytes, std::io::Error> {
        match &self.body {
            FileBody::Bytes(data) => Ok(data.clone()),
            FileBody::Path(path) => tokio::fs::read(path).await.map(Bytes::from),
            FileBody::Temp(file) => tokio::fs::read(file.path()).await.map(Bytes::from),
        }
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = match &self.body {
            FileBody::Bytes(data) => format!("{} bytes in memory", data.len()),
            FileBody::Path(path) => path.display().to_string(),
            FileBody::Temp(file) => format!("temp {}", file.path().display()),
        };
        f.debug_struct("UploadedFile")
            .field("original_name", &self.original_name)
            .field("mime_type", &self.mime_type)
            .field("body", &body)
            .finish()
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// One named part of a request.
#[derive(Debug)]
pub enum RequestField {
    File(UploadedFile),
    Text(String),
}

/// A framework-neutral request: named parts in arrival order.
#[derive(Debug, Default)]
pub struct FileRequest {
    fields: Vec<(String, RequestField)>,
}

pub(crate) enum RequestFiles {
    One(UploadedFile),
    Many(Vec<UploadedFile>),
}

impl FileRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, field: RequestField) -> &mut Self {
        self.fields.push((name.into(), field));
        self
    }

    pub fn with_file(mut self, name: impl Into<String>, file: UploadedFile) -> Self {
        self.push(name, RequestField::File(file));
        self
    }

    pub fn with_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, RequestField::Text(value.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Text value of the first part called `name`.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|(n, field)| match field {
            RequestField::Text(value) if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// Pull the uploads sent under `field` (or `field[]`).
    ///
    /// Several parts, or any part using the `[]` form, count as a
    /// collection even when only one arrived.
    pub(crate) fn take_files(self, field: &str) -> Result<RequestFiles, IngestError> {
        let list_name = format!("{field}[]");
        let mut as_list = false;
        let mut files = Vec::new();

        for (name, part) in self.fields {
            let listed = name == list_name;
            if name != field && !listed {
                continue;
            }
            as_list |= listed;
            match part {
                RequestField::File(file) => files.push(file),
                RequestField::Text(_) => {
                    return Err(invalid_field(field));
                }
            }
        }

        if files.is_empty() {
            return Err(invalid_field(field));
        }
        if as_list || files.len() > 1 {
            return Ok(RequestFiles::Many(files));
        }
        match files.pop() {
            Some(file) => Ok(RequestFiles::One(file)),
            None => Err(invalid_field(field)),
        }
    }
}

fn invalid_field(field: &str) -> IngestError {
    IngestError::InvalidInput(format!("invalid file in request field `{field}`"))
}

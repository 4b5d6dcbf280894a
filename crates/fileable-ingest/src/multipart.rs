use axum::extract::Multipart;

use crate::{FileRequest, IngestError, RequestField, UploadedFile};

impl FileRequest {
    /// Buffer an axum multipart body. Parts with a non-empty filename become
    /// files carrying the part's content type; everything else becomes text.
    /// A browser sends `filename=""` for a file input left empty, so those
    /// parts are not uploads.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, IngestError> {
        let mut request = FileRequest::new();

        while let Some(field) = multipart.next_field().await.map_err(malformed)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field
                .file_name()
                .filter(|f| !f.is_empty())
                .map(str::to_string)
            {
                Some(file_name) => {
                    let mime_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await.map_err(malformed)?;
                    request.push(
                        name,
                        RequestField::File(UploadedFile::from_bytes(file_name, mime_type, data)),
                    );
                }
                None => {
                    let value = field.text().await.map_err(malformed)?;
                    request.push(name, RequestField::Text(value));
                }
            }
        }

        Ok(request)
    }
}

fn malformed(e: axum::extract::multipart::MultipartError) -> IngestError {
    IngestError::InvalidInput(format!("malformed multipart body: {e}"))
}

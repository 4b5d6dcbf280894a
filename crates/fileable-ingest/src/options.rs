use std::time::Duration;

use fileable_core::OwnerRef;

/// Per-call settings for `Ingestor::ingest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    /// When set, every stored file gets an attachment row for this owner.
    pub owner: Option<OwnerRef>,
    pub description: Option<String>,
    pub status: bool,
    /// Request field that carries the upload(s).
    pub field_name: String,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            owner: None,
            description: None,
            status: true,
            field_name: "file".to_string(),
        }
    }
}

impl IngestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configure(owner: Option<OwnerRef>, description: Option<String>, status: bool) -> Self {
        Self {
            owner,
            description,
            status,
            ..Self::default()
        }
    }

    pub fn owned_by(owner: OwnerRef) -> Self {
        Self::new().with_owner(owner)
    }

    pub fn with_owner(mut self, owner: OwnerRef) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: bool) -> Self {
        self.status = status;
        self
    }

    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }
}

/// What happens to a freshly written blob when its attachment row cannot be
/// inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrphanPolicy {
    /// Delete the blob again before returning the database error.
    #[default]
    Compensate,
    /// Leave the blob in the store.
    Keep,
}

/// Long-lived ingestor settings.
#[derive(Debug, Clone, Default)]
pub struct IngestConfig {
    pub orphan_policy: OrphanPolicy,
    /// Whole-request timeout for URL downloads. `None` waits indefinitely.
    pub download_timeout: Option<Duration>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::OwnerRef;

/// One stored file plus the metadata captured when it was ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    /// Storage-relative key of the bytes.
    pub path: String,
    /// Original client-supplied filename.
    pub name: String,
    /// Extension of the original filename, as given by the client.
    #[serde(rename = "type")]
    pub file_type: String,
    pub size: i64,
    pub mime_type: String,
    pub description: Option<String>,
    pub status: bool,
    pub owner: Option<OwnerRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Attachment {
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn belongs_to(&self, owner: &OwnerRef) -> bool {
        self.owner.as_ref() == Some(owner)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAttachment {
    pub path: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub file_type: String,
    pub size: i64,
    pub mime_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_status")]
    pub status: bool,
    #[serde(default)]
    pub owner: Option<OwnerRef>,
}

fn default_status() -> bool {
    true
}

/// How soft-deleted rows are treated by a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trashed {
    #[default]
    Exclude,
    Include,
    Only,
}

impl Trashed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trashed::Exclude => "exclude",
            Trashed::Include => "include",
            Trashed::Only => "only",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "exclude" => Some(Trashed::Exclude),
            "include" => Some(Trashed::Include),
            "only" => Some(Trashed::Only),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttachmentFilter {
    pub owner: Option<OwnerRef>,
    pub status: Option<bool>,
    #[serde(default)]
    pub trashed: Trashed,
    pub limit: Option<i64>,
}

impl AttachmentFilter {
    pub fn for_owner(owner: &OwnerRef) -> Self {
        Self {
            owner: Some(owner.clone()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_field_serializes_as_type() {
        let new = NewAttachment {
            path: "posts/abc.png".into(),
            name: "cat.png".into(),
            file_type: "png".into(),
            size: 3,
            mime_type: "image/png".into(),
            description: None,
            status: true,
            owner: Some(OwnerRef::new("post", "1")),
        };
        let json = serde_json::to_value(&new).unwrap();
        assert_eq!(json["type"], "png");
        assert!(json.get("file_type").is_none());
        assert_eq!(json["owner"]["owner_type"], "post");
    }

    #[test]
    fn new_attachment_status_defaults_to_true() {
        let new: NewAttachment = serde_json::from_value(serde_json::json!({
            "path": "a/b.txt",
            "name": "b.txt",
            "size": 1,
            "mime_type": "text/plain"
        }))
        .unwrap();
        assert!(new.status);
        assert!(new.owner.is_none());
        assert_eq!(new.file_type, "");
    }

    #[test]
    fn trashed_roundtrips_through_str() {
        for t in [Trashed::Exclude, Trashed::Include, Trashed::Only] {
            assert_eq!(Trashed::parse_str(t.as_str()), Some(t));
        }
        assert_eq!(Trashed::parse_str("all"), None);
        assert_eq!(AttachmentFilter::default().trashed, Trashed::Exclude);
    }
}

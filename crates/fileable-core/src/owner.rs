use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::FileableError;

/// Polymorphic key of the record that owns an attachment: a type tag plus
/// the owner's id within that type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerRef {
    pub owner_type: String,
    pub owner_id: String,
}

impl OwnerRef {
    pub fn new(owner_type: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            owner_type: owner_type.into(),
            owner_id: owner_id.into(),
        }
    }

    /// Build from the nullable column pair. Anything other than both-set
    /// yields `None`.
    pub fn from_columns(owner_type: Option<String>, owner_id: Option<String>) -> Option<Self> {
        match (owner_type, owner_id) {
            (Some(owner_type), Some(owner_id)) => Some(Self { owner_type, owner_id }),
            _ => None,
        }
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.owner_type, self.owner_id)
    }
}

/// Implemented by host entities that may own attachments.
///
/// ```
/// use fileable_core::{Attachable, OwnerRef};
///
/// struct Post { id: i64 }
///
/// impl Attachable for Post {
///     const OWNER_TYPE: &'static str = "post";
///     fn owner_id(&self) -> String { self.id.to_string() }
/// }
///
/// assert_eq!(Post { id: 7 }.owner_ref(), OwnerRef::new("post", "7"));
/// ```
pub trait Attachable {
    /// Tag stored in `owner_type`. Must be stable across releases.
    const OWNER_TYPE: &'static str;

    fn owner_id(&self) -> String;

    fn owner_ref(&self) -> OwnerRef {
        OwnerRef::new(Self::OWNER_TYPE, self.owner_id())
    }
}

/// The set of owner-type tags a host application accepts.
#[derive(Debug, Clone, Default)]
pub struct OwnerRegistry {
    tags: BTreeSet<String>,
    open: bool,
}

impl OwnerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that accepts any well-formed tag, registered or not.
    pub fn open() -> Self {
        Self {
            tags: BTreeSet::new(),
            open: true,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn register<A: Attachable>(&mut self) -> &mut Self {
        self.tags.insert(A::OWNER_TYPE.to_string());
        self
    }

    pub fn register_tag(&mut self, tag: &str) -> Result<&mut Self, FileableError> {
        validate_tag(tag)?;
        self.tags.insert(tag.to_string());
        Ok(self)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Turn an externally supplied `(tag, id)` pair into an `OwnerRef`,
    /// rejecting tags that were never registered.
    pub fn resolve(&self, tag: &str, id: &str) -> Result<OwnerRef, FileableError> {
        if self.open {
            validate_tag(tag)?;
        } else if !self.contains(tag) {
            return Err(FileableError::InvalidInput(format!(
                "unknown owner type `{tag}`"
            )));
        }
        if id.trim().is_empty() {
            return Err(FileableError::InvalidInput("owner id must not be empty".into()));
        }
        Ok(OwnerRef::new(tag, id))
    }
}

fn validate_tag(tag: &str) -> Result<(), FileableError> {
    let ok = !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(FileableError::InvalidInput(format!(
            "owner type `{tag}` must be lowercase ascii, digits, '_' or '-'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct User {
        id: u32,
    }

    impl Attachable for User {
        const OWNER_TYPE: &'static str = "user";
        fn owner_id(&self) -> String {
            self.id.to_string()
        }
    }

    #[test]
    fn attachable_builds_owner_ref() {
        let user = User { id: 42 };
        let owner = user.owner_ref();
        assert_eq!(owner.owner_type, "user");
        assert_eq!(owner.owner_id, "42");
        assert_eq!(owner.to_string(), "user:42");
    }

    #[test]
    fn from_columns_requires_both_halves() {
        assert_eq!(
            OwnerRef::from_columns(Some("post".into()), Some("1".into())),
            Some(OwnerRef::new("post", "1"))
        );
        assert_eq!(OwnerRef::from_columns(Some("post".into()), None), None);
        assert_eq!(OwnerRef::from_columns(None, Some("1".into())), None);
        assert_eq!(OwnerRef::from_columns(None, None), None);
    }

    #[test]
    fn registry_resolves_registered_tags_only() {
        let mut registry = OwnerRegistry::new();
        registry.register::<User>();
        registry.register_tag("post").unwrap();

        assert_eq!(registry.tags().collect::<Vec<_>>(), vec!["post", "user"]);
        assert_eq!(
            registry.resolve("post", "9").unwrap(),
            OwnerRef::new("post", "9")
        );
        assert!(matches!(
            registry.resolve("invoice", "9"),
            Err(FileableError::InvalidInput(_))
        ));
        assert!(registry.resolve("post", "  ").is_err());
    }

    #[test]
    fn registry_rejects_malformed_tags() {
        let mut registry = OwnerRegistry::new();
        assert!(registry.register_tag("").is_err());
        assert!(registry.register_tag("App\\Models\\Post").is_err());
        assert!(registry.register_tag("Post").is_err());
        assert!(registry.register_tag("blog_post").is_ok());
        assert!(!registry.is_empty());
    }

    #[test]
    fn open_registry_accepts_well_formed_tags() {
        let registry = OwnerRegistry::open();
        assert!(registry.is_open());
        assert_eq!(
            registry.resolve("invoice", "3").unwrap(),
            OwnerRef::new("invoice", "3")
        );
        assert!(registry.resolve("Invoice", "3").is_err());
        assert!(registry.resolve("invoice", "").is_err());
    }
}

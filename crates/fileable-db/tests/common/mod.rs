// Backend-agnostic integration tests for the Database trait.
//
// Each public async function accepts `&dyn Database` so that the same logic
// can be exercised against both the SQLite and Postgres backends.

#![allow(dead_code)]

use fileable_core::attachment::{AttachmentFilter, NewAttachment, Trashed};
use fileable_core::owner::{Attachable, OwnerRef};
use fileable_db::{attachments_of, Database, DbError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Post {
    id: u64,
}

impl Attachable for Post {
    const OWNER_TYPE: &'static str = "post";
    fn owner_id(&self) -> String {
        self.id.to_string()
    }
}

fn make_attachment(path: &str, owner: Option<&OwnerRef>) -> NewAttachment {
    NewAttachment {
        path: path.to_string(),
        name: "photo.JPG".to_string(),
        file_type: "JPG".to_string(),
        size: 2048,
        mime_type: "image/jpeg".to_string(),
        description: None,
        status: true,
        owner: owner.cloned(),
    }
}

// ---------------------------------------------------------------------------
// Attachment tests
// ---------------------------------------------------------------------------

/// Create then read back every field.
pub async fn test_create_and_get(db: &dyn Database) {
    let owner = OwnerRef::new("post", "1");
    let mut input = make_attachment("posts/abc.jpg", Some(&owner));
    input.description = Some("cover".into());

    let created = db.create_attachment(&input).await.unwrap();
    assert!(!created.id.is_empty());
    assert_eq!(created.path, "posts/abc.jpg");
    assert_eq!(created.name, "photo.JPG");
    assert_eq!(created.file_type, "JPG");
    assert_eq!(created.size, 2048);
    assert_eq!(created.mime_type, "image/jpeg");
    assert_eq!(created.description.as_deref(), Some("cover"));
    assert!(created.status);
    assert_eq!(created.owner.as_ref(), Some(&owner));
    assert!(created.deleted_at.is_none());
    assert_eq!(created.created_at, created.updated_at);

    let fetched = db.get_attachment(&created.id).await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.path, created.path);
    assert_eq!(fetched.owner, created.owner);

    let missing = db.get_attachment("no-such-id").await.unwrap_err();
    assert!(matches!(missing, DbError::NotFound(_)));
}

/// Rows without an owner round-trip with `owner == None`.
pub async fn test_unattached_row(db: &dyn Database) {
    let created = db
        .create_attachment(&make_attachment("loose/file.bin", None))
        .await
        .unwrap();
    assert!(created.owner.is_none());

    let listed = db
        .list_attachments(&AttachmentFilter::default())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].owner.is_none());
}

/// Listing by owner only returns that owner's rows, in creation order.
pub async fn test_list_by_owner(db: &dyn Database) {
    let post = Post { id: 10 };
    let other = OwnerRef::new("user", "10");

    for path in ["posts/10/a", "posts/10/b", "posts/10/c"] {
        db.create_attachment(&make_attachment(path, Some(&post.owner_ref())))
            .await
            .unwrap();
    }
    db.create_attachment(&make_attachment("users/10/a", Some(&other)))
        .await
        .unwrap();

    let mine = attachments_of(db, &post).await.unwrap();
    assert_eq!(
        mine.iter().map(|a| a.path.as_str()).collect::<Vec<_>>(),
        vec!["posts/10/a", "posts/10/b", "posts/10/c"]
    );
    assert!(mine.iter().all(|a| a.belongs_to(&post.owner_ref())));

    // Same id, different type: separate owner
    let theirs = db.list_attachments_for_owner(&other).await.unwrap();
    assert_eq!(theirs.len(), 1);
    assert_eq!(theirs[0].path, "users/10/a");
}

/// Soft delete hides the row by default; trashed modes still see it.
pub async fn test_soft_delete_and_restore(db: &dyn Database) {
    let owner = OwnerRef::new("post", "2");
    let keep = db
        .create_attachment(&make_attachment("posts/2/keep", Some(&owner)))
        .await
        .unwrap();
    let gone = db
        .create_attachment(&make_attachment("posts/2/gone", Some(&owner)))
        .await
        .unwrap();

    let trashed = db.soft_delete_attachment(&gone.id).await.unwrap();
    assert!(trashed.is_trashed());

    // default listing
    let live = db.list_attachments_for_owner(&owner).await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].id, keep.id);

    // get excludes trashed, with_trashed finds it
    assert!(matches!(
        db.get_attachment(&gone.id).await.unwrap_err(),
        DbError::NotFound(_)
    ));
    let found = db.get_attachment_with_trashed(&gone.id).await.unwrap();
    assert!(found.deleted_at.is_some());

    let only = db
        .list_attachments(&AttachmentFilter {
            owner: Some(owner.clone()),
            trashed: Trashed::Only,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(only.len(), 1);
    assert_eq!(only[0].id, gone.id);

    let all = db
        .list_attachments(&AttachmentFilter {
            owner: Some(owner.clone()),
            trashed: Trashed::Include,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    // second soft delete is NotFound
    assert!(db.soft_delete_attachment(&gone.id).await.is_err());

    // restore
    let restored = db.restore_attachment(&gone.id).await.unwrap();
    assert!(!restored.is_trashed());
    assert_eq!(db.list_attachments_for_owner(&owner).await.unwrap().len(), 2);

    // restoring a live row is NotFound
    assert!(matches!(
        db.restore_attachment(&keep.id).await.unwrap_err(),
        DbError::NotFound(_)
    ));
}

/// Force delete removes the row even when trashed.
pub async fn test_force_delete(db: &dyn Database) {
    let a = db
        .create_attachment(&make_attachment("force/a", None))
        .await
        .unwrap();
    db.soft_delete_attachment(&a.id).await.unwrap();

    let removed = db.force_delete_attachment(&a.id).await.unwrap();
    assert_eq!(removed.id, a.id);
    assert!(db.get_attachment_with_trashed(&a.id).await.is_err());
    assert!(db.force_delete_attachment(&a.id).await.is_err());
}

/// Identical metadata on two different paths produces two rows.
pub async fn test_no_dedup(db: &dyn Database) {
    let owner = OwnerRef::new("post", "3");
    let first = db
        .create_attachment(&make_attachment("posts/3/one", Some(&owner)))
        .await
        .unwrap();
    let second = db
        .create_attachment(&make_attachment("posts/3/two", Some(&owner)))
        .await
        .unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(db.list_attachments_for_owner(&owner).await.unwrap().len(), 2);
}

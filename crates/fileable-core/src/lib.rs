pub mod attachment;
pub mod error;
pub mod owner;

pub use attachment::{Attachment, AttachmentFilter, NewAttachment, Trashed};
pub use error::FileableError;
pub use owner::{Attachable, OwnerRef, OwnerRegistry};

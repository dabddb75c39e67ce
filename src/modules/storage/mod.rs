//! Storage module for attachment payloads
//!
//! Photos attached to bucket list items are opaque blobs. Each backend
//! persists a payload under a generated name and hands back an
//! [`AttachmentRef`] that the item repository keeps.

mod attachment_store;
mod local_store;
mod minio_store;

pub use attachment_store::{
    content_type_for_reference, extension_for_content_type, AttachmentPayload, AttachmentRef,
    AttachmentStore,
};
pub use local_store::LocalAttachmentStore;
pub use minio_store::MinIOAttachmentStore;

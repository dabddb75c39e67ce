//! Photo attachments: upload, locate and download stored payloads.
//!
//! Which item owns a payload is tracked by the items feature; these
//! endpoints only talk to the [`crate::modules::storage::AttachmentStore`].

pub mod dtos;
pub mod handlers;
pub mod routes;

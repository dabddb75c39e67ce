use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::error::{AppError, Result};

/// Stable handle to a stored attachment payload
///
/// A reference is a single path segment (`<uuid>.<ext>`), so it can never
/// point outside the backend's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct AttachmentRef(String);

impl AttachmentRef {
    /// Validate a reference received from a caller or read back from storage
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "Attachment reference must not be empty".to_string(),
            ));
        }
        if trimmed != value
            || value.starts_with('.')
            || value.contains(['/', '\\'])
            || value.chars().any(char::is_control)
        {
            return Err(AppError::Validation(format!(
                "Malformed attachment reference: {:?}",
                value
            )));
        }

        Ok(Self(value))
    }

    /// Allocate a fresh collision-free reference
    pub fn generate(extension: &str) -> Self {
        Self(format!("{}.{}", Uuid::new_v4(), extension))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttachmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AttachmentRef {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<AttachmentRef> for String {
    fn from(reference: AttachmentRef) -> Self {
        reference.0
    }
}

/// A payload waiting to be stored, as received from the photo picker
#[derive(Debug, Clone)]
pub struct AttachmentPayload {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Durable store for opaque attachment payloads
///
/// The store never inspects payload content and does no ownership
/// tracking; which item owns a reference is the repository's business.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Persist a payload under a newly generated name.
    ///
    /// On failure no partially written payload is visible.
    async fn store(&self, payload: Vec<u8>, content_type: &str) -> Result<AttachmentRef>;

    /// Locator usable for read access (file path or URL)
    async fn resolve(&self, reference: &AttachmentRef) -> Result<String>;

    /// Read the payload back
    async fn load(&self, reference: &AttachmentRef) -> Result<Vec<u8>>;

    /// Best-effort deletion; a missing payload is not an error
    async fn release(&self, reference: &AttachmentRef) -> Result<()>;
}

/// File extension used for a stored payload of the given content type
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/heic" => "heic",
        _ => "bin",
    }
}

/// Content type served back for a stored reference, derived from its extension
pub fn content_type_for_reference(reference: &AttachmentRef) -> &'static str {
    match reference.as_str().rsplit('.').next() {
        Some("jpg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_path_like_references() {
        assert!(AttachmentRef::parse("photo.jpg").is_ok());
        assert!(AttachmentRef::parse("").is_err());
        assert!(AttachmentRef::parse("   ").is_err());
        assert!(AttachmentRef::parse("../etc/passwd").is_err());
        assert!(AttachmentRef::parse("a/b.jpg").is_err());
        assert!(AttachmentRef::parse("a\\b.jpg").is_err());
        assert!(AttachmentRef::parse(".hidden").is_err());
        assert!(AttachmentRef::parse(" padded.jpg").is_err());
    }

    #[test]
    fn test_generated_references_are_unique_and_valid() {
        let a = AttachmentRef::generate("jpg");
        let b = AttachmentRef::generate("jpg");
        assert_ne!(a, b);
        assert!(a.as_str().ends_with(".jpg"));
        assert_eq!(AttachmentRef::parse(a.as_str()).unwrap(), a);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: std::result::Result<AttachmentRef, _> = serde_json::from_str("\"x.png\"");
        assert!(ok.is_ok());
        let bad: std::result::Result<AttachmentRef, _> = serde_json::from_str("\"../x.png\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_content_type_mapping() {
        assert_eq!(extension_for_content_type("image/jpeg"), "jpg");
        assert_eq!(extension_for_content_type("application/zip"), "bin");

        let reference = AttachmentRef::generate("png");
        assert_eq!(content_type_for_reference(&reference), "image/png");
        let unknown = AttachmentRef::generate("bin");
        assert_eq!(
            content_type_for_reference(&unknown),
            "application/octet-stream"
        );
    }
}

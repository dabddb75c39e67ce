use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::modules::storage::{content_type_for_reference, AttachmentRef};

/// A stored photo and where to read it
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentResponseDto {
    #[schema(value_type = String, example = "3f0c8a9e-5a7b-4d1e-9a4c-2b7f6d1e8c90.jpg")]
    pub reference: AttachmentRef,
    /// File path or (presigned) URL
    pub locator: String,
    #[schema(example = "image/jpeg")]
    pub content_type: String,
}

impl AttachmentResponseDto {
    pub fn new(reference: AttachmentRef, locator: String) -> Self {
        let content_type = content_type_for_reference(&reference).to_string();
        Self {
            reference,
            locator,
            content_type,
        }
    }
}

/// Multipart form for standalone photo uploads
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadAttachmentFormDto {
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub files: Vec<String>,
}

//! Reading photo uploads out of `multipart/form-data` bodies

use axum::extract::Multipart;
use std::collections::HashMap;
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::modules::storage::AttachmentPayload;
use crate::shared::constants::{
    ALLOWED_ATTACHMENT_TYPES, MAX_ATTACHMENTS_PER_UPLOAD, MAX_ATTACHMENT_SIZE,
};

/// Name of the multipart field carrying photos (repeatable)
pub const FILE_FIELD: &str = "files";

/// Parsed upload: every `files` part as a payload, other parts as text
#[derive(Debug, Default)]
pub struct UploadForm {
    pub files: Vec<AttachmentPayload>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// Non-blank text field, trimmed
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Optional numeric field
    pub fn number(&self, name: &str) -> Result<Option<f64>> {
        self.text(name)
            .map(|v| {
                v.parse::<f64>()
                    .map_err(|_| AppError::BadRequest(format!("Field '{}' must be a number", name)))
            })
            .transpose()
    }
}

pub fn is_attachment_type_allowed(content_type: &str) -> bool {
    ALLOWED_ATTACHMENT_TYPES.contains(&content_type)
}

/// Drain a multipart body, checking count, size and type of every photo
pub async fn read_upload(mut multipart: Multipart) -> Result<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name == FILE_FIELD {
            if form.files.len() == MAX_ATTACHMENTS_PER_UPLOAD {
                return Err(AppError::BadRequest(format!(
                    "At most {} photos can be uploaded at once",
                    MAX_ATTACHMENTS_PER_UPLOAD
                )));
            }

            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());

            if !is_attachment_type_allowed(&content_type) {
                return Err(AppError::BadRequest(format!(
                    "File type '{}' is not allowed. Allowed types: {}",
                    content_type,
                    ALLOWED_ATTACHMENT_TYPES.join(", ")
                )));
            }

            let data = field.bytes().await.map_err(|e| {
                debug!("Failed to read file bytes: {}", e);
                AppError::BadRequest(format!("Failed to read file data: {}", e))
            })?;

            if data.is_empty() {
                return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
            }
            if data.len() > MAX_ATTACHMENT_SIZE {
                return Err(AppError::BadRequest(format!(
                    "File too large. Maximum size is {} bytes ({} MB)",
                    MAX_ATTACHMENT_SIZE,
                    MAX_ATTACHMENT_SIZE / 1024 / 1024
                )));
            }

            form.files.push(AttachmentPayload {
                data: data.to_vec(),
                content_type,
            });
        } else {
            let text = field.text().await.map_err(|e| {
                AppError::BadRequest(format!("Failed to read field '{}': {}", field_name, e))
            })?;
            form.fields.insert(field_name, text);
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_types() {
        assert!(is_attachment_type_allowed("image/jpeg"));
        assert!(is_attachment_type_allowed("image/heic"));
        assert!(!is_attachment_type_allowed("application/pdf"));
    }

    #[test]
    fn test_form_field_helpers() {
        let mut form = UploadForm::default();
        form.fields.insert("activity".into(), "  Visit Kyoto ".into());
        form.fields.insert("location".into(), "   ".into());
        form.fields.insert("latitude".into(), "35.0".into());
        form.fields.insert("longitude".into(), "east".into());

        assert_eq!(form.text("activity").as_deref(), Some("Visit Kyoto"));
        assert_eq!(form.text("location"), None);
        assert_eq!(form.number("latitude").unwrap(), Some(35.0));
        assert!(form.number("longitude").is_err());
        assert_eq!(form.number("missing").unwrap(), None);
    }
}

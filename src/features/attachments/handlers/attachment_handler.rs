use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::warn;

use crate::core::error::{AppError, Result};
use crate::features::attachments::dtos::{AttachmentResponseDto, UploadAttachmentFormDto};
use crate::modules::storage::{content_type_for_reference, AttachmentRef, AttachmentStore};
use crate::shared::multipart::read_upload;
use crate::shared::types::ApiResponse;

/// Upload photos ahead of creating an item
///
/// Returns one reference per `files` part, in upload order. Pass them in
/// `attachments` when creating or updating an item.
#[utoipa::path(
    post,
    path = "/api/attachments",
    request_body(
        content = UploadAttachmentFormDto,
        content_type = "multipart/form-data",
        description = "One or more `files` parts",
    ),
    responses(
        (status = 201, description = "Photos stored", body = ApiResponse<Vec<AttachmentResponseDto>>),
        (status = 400, description = "Invalid file"),
        (status = 413, description = "Upload too large")
    ),
    tag = "attachments"
)]
pub async fn upload_attachments(
    State(store): State<Arc<dyn AttachmentStore>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Vec<AttachmentResponseDto>>>)> {
    let form = read_upload(multipart).await?;
    if form.files.is_empty() {
        return Err(AppError::BadRequest("At least one file is required".to_string()));
    }

    let mut stored: Vec<AttachmentResponseDto> = Vec::with_capacity(form.files.len());
    for payload in form.files {
        let result = match store.store(payload.data, &payload.content_type).await {
            Ok(reference) => store
                .resolve(&reference)
                .await
                .map(|locator| AttachmentResponseDto::new(reference, locator)),
            Err(e) => Err(e),
        };

        match result {
            Ok(dto) => stored.push(dto),
            Err(e) => {
                // All or nothing: drop what this request already stored
                for dto in &stored {
                    if let Err(release_err) = store.release(&dto.reference).await {
                        warn!("Failed to release attachment '{}': {}", dto.reference, release_err);
                    }
                }
                return Err(e);
            }
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(stored), None, None)),
    ))
}

/// Resolve a reference to a read locator
#[utoipa::path(
    get,
    path = "/api/attachments/{reference}",
    params(
        ("reference" = String, Path, description = "Attachment reference")
    ),
    responses(
        (status = 200, description = "Attachment locator", body = ApiResponse<AttachmentResponseDto>),
        (status = 400, description = "Malformed reference"),
        (status = 404, description = "Unknown reference")
    ),
    tag = "attachments"
)]
pub async fn get_attachment(
    State(store): State<Arc<dyn AttachmentStore>>,
    Path(reference): Path<String>,
) -> Result<Json<ApiResponse<AttachmentResponseDto>>> {
    let reference = AttachmentRef::parse(reference)?;
    let locator = store.resolve(&reference).await?;
    Ok(Json(ApiResponse::success(
        Some(AttachmentResponseDto::new(reference, locator)),
        None,
        None,
    )))
}

/// Download the raw payload
#[utoipa::path(
    get,
    path = "/api/attachments/{reference}/content",
    params(
        ("reference" = String, Path, description = "Attachment reference")
    ),
    responses(
        (status = 200, description = "Payload bytes", content_type = "application/octet-stream"),
        (status = 400, description = "Malformed reference"),
        (status = 404, description = "Unknown reference")
    ),
    tag = "attachments"
)]
pub async fn get_attachment_content(
    State(store): State<Arc<dyn AttachmentStore>>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse> {
    let reference = AttachmentRef::parse(reference)?;
    let data = store.load(&reference).await?;
    Ok((
        [(header::CONTENT_TYPE, content_type_for_reference(&reference))],
        data,
    ))
}

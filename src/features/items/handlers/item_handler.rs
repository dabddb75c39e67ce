use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::items::dtos::{
    CreateItemDto, ItemResponseDto, ListItemsQuery, SetCompletedDto, UpdateItemDto,
    UploadAttachmentsDto, UploadItemDto,
};
use crate::features::items::models::{BucketListItem, CreateBucketListItem, ItemPatch};
use crate::features::items::services::ItemRepository;
use crate::modules::storage::AttachmentRef;
use crate::shared::multipart::read_upload;
use crate::shared::types::{ApiResponse, Meta};
use crate::shared::Coordinate;

/// List bucket list items in insertion order
#[utoipa::path(
    get,
    path = "/api/items",
    params(ListItemsQuery),
    responses(
        (status = 200, description = "List of items", body = ApiResponse<Vec<ItemResponseDto>>)
    ),
    tag = "items"
)]
pub async fn list_items(
    State(repository): State<Arc<ItemRepository>>,
    Query(query): Query<ListItemsQuery>,
) -> Result<Json<ApiResponse<Vec<ItemResponseDto>>>> {
    let items = if query.located.unwrap_or(false) {
        repository.list_located().await?
    } else {
        repository.list().await?
    };

    let total = items.len() as i64;
    let dtos: Vec<ItemResponseDto> = items.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta { total }),
    )))
}

/// Create an item
#[utoipa::path(
    post,
    path = "/api/items",
    request_body = CreateItemDto,
    responses(
        (status = 201, description = "Item created", body = ApiResponse<ItemResponseDto>),
        (status = 400, description = "Invalid input")
    ),
    tag = "items"
)]
pub async fn create_item(
    State(repository): State<Arc<ItemRepository>>,
    AppJson(dto): AppJson<CreateItemDto>,
) -> Result<(StatusCode, Json<ApiResponse<ItemResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let item = repository.create(dto.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(item.into()),
            Some("Item created".to_string()),
            None,
        )),
    ))
}

/// Create an item together with its photos
///
/// Accepts multipart/form-data with `activity` (required), `location`,
/// `latitude`, `longitude` and any number of `files` parts.
#[utoipa::path(
    post,
    path = "/api/items/upload",
    request_body(
        content = UploadItemDto,
        content_type = "multipart/form-data",
        description = "Item fields plus photos",
    ),
    responses(
        (status = 201, description = "Item created", body = ApiResponse<ItemResponseDto>),
        (status = 400, description = "Invalid input or file"),
        (status = 413, description = "Upload too large")
    ),
    tag = "items"
)]
pub async fn upload_item(
    State(repository): State<Arc<ItemRepository>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ItemResponseDto>>)> {
    let mut form = read_upload(multipart).await?;

    let input = CreateBucketListItem {
        activity: form.text("activity").unwrap_or_default(),
        attachments: Vec::new(),
        location: form.text("location"),
        latitude: form.number("latitude")?,
        longitude: form.number("longitude")?,
    };
    let payloads = std::mem::take(&mut form.files);

    let item = repository.create_with_payloads(input, payloads).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(item.into()),
            Some("Item created".to_string()),
            None,
        )),
    ))
}

/// Get an item by id
#[utoipa::path(
    get,
    path = "/api/items/{id}",
    params(
        ("id" = Uuid, Path, description = "Item id")
    ),
    responses(
        (status = 200, description = "Item details", body = ApiResponse<ItemResponseDto>),
        (status = 404, description = "Item not found")
    ),
    tag = "items"
)]
pub async fn get_item(
    State(repository): State<Arc<ItemRepository>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ItemResponseDto>>> {
    let item = repository.get(id).await?;
    Ok(Json(ApiResponse::success(Some(item.into()), None, None)))
}

/// Apply a partial update
#[utoipa::path(
    patch,
    path = "/api/items/{id}",
    params(
        ("id" = Uuid, Path, description = "Item id")
    ),
    request_body = UpdateItemDto,
    responses(
        (status = 200, description = "Item updated", body = ApiResponse<ItemResponseDto>),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Item not found")
    ),
    tag = "items"
)]
pub async fn update_item(
    State(repository): State<Arc<ItemRepository>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateItemDto>,
) -> Result<Json<ApiResponse<ItemResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let patch = ItemPatch::from(dto);
    if patch.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    let item = apply_patch(&repository, id, patch).await?;
    Ok(Json(ApiResponse::success(
        Some(item.into()),
        Some("Item updated".to_string()),
        None,
    )))
}

/// Send single-purpose patches through the matching repository operation
async fn apply_patch(
    repository: &ItemRepository,
    id: Uuid,
    patch: ItemPatch,
) -> Result<BucketListItem> {
    match patch {
        ItemPatch {
            activity: Some(activity),
            location: None,
            latitude: None,
            longitude: None,
            completed: None,
            attachments: None,
        } => repository.rename(id, activity).await,
        ItemPatch {
            activity: None,
            location: Some(location),
            latitude: Some(latitude),
            longitude: Some(longitude),
            completed: None,
            attachments: None,
        } => {
            let coordinate = Coordinate::from_parts(latitude, longitude)?;
            repository.set_location(id, location, coordinate).await
        }
        ItemPatch {
            activity: None,
            location: None,
            latitude: None,
            longitude: None,
            completed: Some(completed),
            attachments: None,
        } => repository.set_completed(id, completed).await,
        patch => repository.update(id, patch).await,
    }
}

/// Mark an item completed or not completed
#[utoipa::path(
    put,
    path = "/api/items/{id}/completed",
    params(
        ("id" = Uuid, Path, description = "Item id")
    ),
    request_body = SetCompletedDto,
    responses(
        (status = 200, description = "Completion updated", body = ApiResponse<ItemResponseDto>),
        (status = 404, description = "Item not found")
    ),
    tag = "items"
)]
pub async fn set_completed(
    State(repository): State<Arc<ItemRepository>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<SetCompletedDto>,
) -> Result<Json<ApiResponse<ItemResponseDto>>> {
    let item = repository.set_completed(id, dto.completed).await?;
    Ok(Json(ApiResponse::success(Some(item.into()), None, None)))
}

/// Delete an item and release its photos
#[utoipa::path(
    delete,
    path = "/api/items/{id}",
    params(
        ("id" = Uuid, Path, description = "Item id")
    ),
    responses(
        (status = 200, description = "Item deleted"),
        (status = 404, description = "Item not found")
    ),
    tag = "items"
)]
pub async fn delete_item(
    State(repository): State<Arc<ItemRepository>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    repository.delete(id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Item deleted".to_string()),
        None,
    )))
}

/// Upload photos and append them to an item
#[utoipa::path(
    post,
    path = "/api/items/{id}/attachments",
    params(
        ("id" = Uuid, Path, description = "Item id")
    ),
    request_body(
        content = UploadAttachmentsDto,
        content_type = "multipart/form-data",
        description = "One or more `files` parts",
    ),
    responses(
        (status = 200, description = "Photos attached", body = ApiResponse<ItemResponseDto>),
        (status = 400, description = "Invalid file"),
        (status = 404, description = "Item not found")
    ),
    tag = "items"
)]
pub async fn add_attachments(
    State(repository): State<Arc<ItemRepository>>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ItemResponseDto>>> {
    let form = read_upload(multipart).await?;
    if form.files.is_empty() {
        return Err(AppError::BadRequest("At least one file is required".to_string()));
    }

    let item = repository.add_attachment_payloads(id, form.files).await?;
    Ok(Json(ApiResponse::success(Some(item.into()), None, None)))
}

/// Detach a photo from an item and release it
#[utoipa::path(
    delete,
    path = "/api/items/{id}/attachments/{reference}",
    params(
        ("id" = Uuid, Path, description = "Item id"),
        ("reference" = String, Path, description = "Attachment reference")
    ),
    responses(
        (status = 200, description = "Photo removed", body = ApiResponse<ItemResponseDto>),
        (status = 400, description = "Malformed reference"),
        (status = 404, description = "Item not found or photo not attached")
    ),
    tag = "items"
)]
pub async fn remove_attachment(
    State(repository): State<Arc<ItemRepository>>,
    Path((id, reference)): Path<(Uuid, String)>,
) -> Result<Json<ApiResponse<ItemResponseDto>>> {
    let reference = AttachmentRef::parse(reference)?;
    let item = repository.remove_attachment(id, &reference).await?;
    Ok(Json(ApiResponse::success(Some(item.into()), None, None)))
}

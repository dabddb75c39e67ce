use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::items::models::{BucketListItem, CreateBucketListItem, ItemPatch};
use crate::modules::storage::AttachmentRef;

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`)
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Query parameters for listing items
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListItemsQuery {
    /// Only items pinned on the map
    #[param(example = true)]
    pub located: Option<bool>,
}

/// Response DTO for a bucket list item
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponseDto {
    pub id: Uuid,
    #[schema(example = "Visit Kyoto")]
    pub activity: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub completed: bool,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[schema(value_type = Vec<String>)]
    pub attachments: Vec<AttachmentRef>,
}

impl From<BucketListItem> for ItemResponseDto {
    fn from(item: BucketListItem) -> Self {
        let coordinate = item.coordinate();
        Self {
            id: item.id(),
            activity: item.activity().to_string(),
            created: item.created(),
            updated: item.updated(),
            completed: item.completed(),
            location: item.location().map(str::to_string),
            latitude: coordinate.map(|c| c.latitude),
            longitude: coordinate.map(|c| c.longitude),
            attachments: item.attachments().to_vec(),
        }
    }
}

/// Request DTO for creating an item
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemDto {
    #[validate(length(min = 1, max = 500, message = "Activity must be 1-500 characters"))]
    #[schema(example = "Visit Kyoto")]
    pub activity: String,
    #[validate(length(max = 500, message = "Location must be at most 500 characters"))]
    pub location: Option<String>,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be within [-90, 90]"))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be within [-180, 180]"))]
    pub longitude: Option<f64>,
    /// References previously returned by `POST /api/attachments`
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub attachments: Vec<AttachmentRef>,
}

impl From<CreateItemDto> for CreateBucketListItem {
    fn from(dto: CreateItemDto) -> Self {
        Self {
            activity: dto.activity,
            attachments: dto.attachments,
            location: dto.location,
            latitude: dto.latitude,
            longitude: dto.longitude,
        }
    }
}

/// Request DTO for a partial update
///
/// Omitted fields are left alone; `null` clears a nullable field.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemDto {
    #[validate(length(min = 1, max = 500, message = "Activity must be 1-500 characters"))]
    pub activity: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub latitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub longitude: Option<Option<f64>>,
    pub completed: Option<bool>,
    /// Replaces the whole list; payloads no longer referenced are released
    #[schema(value_type = Option<Vec<String>>)]
    pub attachments: Option<Vec<AttachmentRef>>,
}

impl From<UpdateItemDto> for ItemPatch {
    fn from(dto: UpdateItemDto) -> Self {
        Self {
            activity: dto.activity,
            location: dto.location,
            latitude: dto.latitude,
            longitude: dto.longitude,
            completed: dto.completed,
            attachments: dto.attachments,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetCompletedDto {
    pub completed: bool,
}

/// Multipart form for creating an item with photos
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadItemDto {
    #[schema(example = "Visit Kyoto")]
    pub activity: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Photos (repeat the field for several)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub files: Vec<String>,
}

/// Multipart form carrying only photos
/// Note: This struct is for Swagger UI documentation only.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadAttachmentsDto {
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub files: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_dto_distinguishes_null_from_missing() {
        let dto: UpdateItemDto =
            serde_json::from_str(r#"{"location": null, "completed": true}"#).unwrap();
        assert_eq!(dto.location, Some(None));
        assert_eq!(dto.latitude, None);
        assert_eq!(dto.completed, Some(true));

        let dto: UpdateItemDto = serde_json::from_str(r#"{"location": "Kyoto"}"#).unwrap();
        assert_eq!(dto.location, Some(Some("Kyoto".to_string())));
    }

    #[test]
    fn test_create_dto_validation() {
        let dto: CreateItemDto =
            serde_json::from_str(r#"{"activity": "Visit Kyoto", "latitude": 95.0}"#).unwrap();
        assert!(dto.validate().is_err());

        let dto: CreateItemDto = serde_json::from_str(r#"{"activity": "Visit Kyoto"}"#).unwrap();
        assert!(dto.validate().is_ok());
        assert!(dto.attachments.is_empty());
    }

    #[test]
    fn test_create_dto_rejects_malformed_reference() {
        let result: Result<CreateItemDto, _> =
            serde_json::from_str(r#"{"activity": "x", "attachments": ["../secret"]}"#);
        assert!(result.is_err());
    }
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::location_sessions::models::SessionState;
use crate::modules::storage::AttachmentRef;
use crate::shared::Coordinate;

/// Current state of a location session
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationSessionDto {
    pub id: Uuid,
    /// `empty`, `pending` or `named`
    #[schema(example = "named")]
    pub state: String,
    pub coordinate: Option<Coordinate>,
    #[schema(example = "Kyoto")]
    pub name: Option<String>,
}

impl LocationSessionDto {
    pub fn new(id: Uuid, state: &SessionState) -> Self {
        Self {
            id,
            state: state.label().to_string(),
            coordinate: state.coordinate(),
            name: state.name().map(str::to_string),
        }
    }
}

/// Request DTO for placing a pin
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlacePinDto {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be within [-90, 90]"))]
    #[schema(example = 35.0)]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be within [-180, 180]"))]
    #[schema(example = 135.8)]
    pub longitude: f64,
}

impl PlacePinDto {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Request DTO for confirming a session into a new item
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmLocationDto {
    #[validate(length(min = 1, max = 500, message = "Activity must be 1-500 characters"))]
    #[schema(example = "Visit Kyoto")]
    pub activity: String,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub attachments: Vec<AttachmentRef>,
}

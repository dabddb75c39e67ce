use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::shared::Coordinate;

/// Query parameters for a reverse lookup
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ReverseGeocodeQuery {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be within [-90, 90]"))]
    #[param(example = 35.0)]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be within [-180, 180]"))]
    #[param(example = 135.8)]
    pub longitude: f64,
}

impl ReverseGeocodeQuery {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReverseGeocodeResponseDto {
    pub coordinate: Coordinate,
    /// Display name; "Unknown Location" when the lookup failed
    #[schema(example = "Kyoto")]
    pub name: String,
}

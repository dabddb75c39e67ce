use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::geocoding::dtos::{ReverseGeocodeQuery, ReverseGeocodeResponseDto};
use crate::features::geocoding::services::GeoPlaceResolver;
use crate::shared::types::ApiResponse;

/// Resolve a coordinate to a display name
///
/// Lookup failures are not errors; they yield "Unknown Location".
#[utoipa::path(
    get,
    path = "/api/geocoding/reverse",
    params(ReverseGeocodeQuery),
    responses(
        (status = 200, description = "Resolved place name", body = ApiResponse<ReverseGeocodeResponseDto>),
        (status = 400, description = "Coordinate out of range")
    ),
    tag = "geocoding"
)]
pub async fn reverse_geocode(
    State(resolver): State<Arc<GeoPlaceResolver>>,
    Query(query): Query<ReverseGeocodeQuery>,
) -> Result<Json<ApiResponse<ReverseGeocodeResponseDto>>> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let coordinate = query.coordinate();
    let name = resolver.resolve(coordinate).await;

    Ok(Json(ApiResponse::success(
        Some(ReverseGeocodeResponseDto { coordinate, name }),
        None,
        None,
    )))
}

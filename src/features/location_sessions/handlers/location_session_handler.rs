use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::items::dtos::ItemResponseDto;
use crate::features::location_sessions::dtos::{
    ConfirmLocationDto, LocationSessionDto, PlacePinDto,
};
use crate::features::location_sessions::models::SessionState;
use crate::features::location_sessions::services::LocationSessionService;
use crate::shared::types::ApiResponse;

/// Open a new location selection
#[utoipa::path(
    post,
    path = "/api/location-sessions",
    responses(
        (status = 201, description = "Session opened", body = ApiResponse<LocationSessionDto>)
    ),
    tag = "location-sessions"
)]
pub async fn open_session(
    State(service): State<Arc<LocationSessionService>>,
) -> Result<(StatusCode, Json<ApiResponse<LocationSessionDto>>)> {
    let id = service.open().await;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(LocationSessionDto::new(id, &SessionState::Empty)),
            None,
            None,
        )),
    ))
}

/// Get the current pin and name
#[utoipa::path(
    get,
    path = "/api/location-sessions/{id}",
    params(
        ("id" = Uuid, Path, description = "Session id")
    ),
    responses(
        (status = 200, description = "Session state", body = ApiResponse<LocationSessionDto>),
        (status = 404, description = "Unknown or expired session")
    ),
    tag = "location-sessions"
)]
pub async fn get_session(
    State(service): State<Arc<LocationSessionService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<LocationSessionDto>>> {
    let state = service.state(id).await?;
    Ok(Json(ApiResponse::success(
        Some(LocationSessionDto::new(id, &state)),
        None,
        None,
    )))
}

/// Close a session without creating anything
#[utoipa::path(
    delete,
    path = "/api/location-sessions/{id}",
    params(
        ("id" = Uuid, Path, description = "Session id")
    ),
    responses(
        (status = 200, description = "Session closed"),
        (status = 404, description = "Unknown or expired session")
    ),
    tag = "location-sessions"
)]
pub async fn close_session(
    State(service): State<Arc<LocationSessionService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.close(id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Session closed".to_string()),
        None,
    )))
}

/// Place or move the pin
///
/// Returns immediately in the `pending` state; poll the session to see the
/// resolved name.
#[utoipa::path(
    put,
    path = "/api/location-sessions/{id}/pin",
    params(
        ("id" = Uuid, Path, description = "Session id")
    ),
    request_body = PlacePinDto,
    responses(
        (status = 202, description = "Pin placed, name lookup started", body = ApiResponse<LocationSessionDto>),
        (status = 400, description = "Coordinate out of range"),
        (status = 404, description = "Unknown or expired session")
    ),
    tag = "location-sessions"
)]
pub async fn place_pin(
    State(service): State<Arc<LocationSessionService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<PlacePinDto>,
) -> Result<(StatusCode, Json<ApiResponse<LocationSessionDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let state = service.place_pin(id, dto.coordinate()).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::success(
            Some(LocationSessionDto::new(id, &state)),
            None,
            None,
        )),
    ))
}

/// Remove the pin
#[utoipa::path(
    delete,
    path = "/api/location-sessions/{id}/pin",
    params(
        ("id" = Uuid, Path, description = "Session id")
    ),
    responses(
        (status = 200, description = "Pin cleared", body = ApiResponse<LocationSessionDto>),
        (status = 404, description = "Unknown or expired session")
    ),
    tag = "location-sessions"
)]
pub async fn clear_pin(
    State(service): State<Arc<LocationSessionService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<LocationSessionDto>>> {
    service.clear_pin(id).await?;
    Ok(Json(ApiResponse::success(
        Some(LocationSessionDto::new(id, &SessionState::Empty)),
        None,
        None,
    )))
}

/// Confirm the pin and create an item at it
#[utoipa::path(
    post,
    path = "/api/location-sessions/{id}/confirm",
    params(
        ("id" = Uuid, Path, description = "Session id")
    ),
    request_body = ConfirmLocationDto,
    responses(
        (status = 201, description = "Item created at the selected location", body = ApiResponse<ItemResponseDto>),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Unknown or expired session"),
        (status = 409, description = "No pin has been placed")
    ),
    tag = "location-sessions"
)]
pub async fn confirm_session(
    State(service): State<Arc<LocationSessionService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<ConfirmLocationDto>,
) -> Result<(StatusCode, Json<ApiResponse<ItemResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let item = service.confirm(id, dto.activity, dto.attachments).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(item.into()),
            Some("Item created".to_string()),
            None,
        )),
    ))
}

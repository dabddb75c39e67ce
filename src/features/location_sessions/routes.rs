use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::features::location_sessions::handlers;
use crate::features::location_sessions::services::LocationSessionService;

/// Create routes for the location sessions feature
pub fn routes(service: Arc<LocationSessionService>) -> Router {
    Router::new()
        .route("/api/location-sessions", post(handlers::open_session))
        .route(
            "/api/location-sessions/{id}",
            get(handlers::get_session).delete(handlers::close_session),
        )
        .route(
            "/api/location-sessions/{id}/pin",
            put(handlers::place_pin).delete(handlers::clear_pin),
        )
        .route(
            "/api/location-sessions/{id}/confirm",
            post(handlers::confirm_session),
        )
        .with_state(service)
}

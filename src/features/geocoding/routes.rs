use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::geocoding::handlers;
use crate::features::geocoding::services::GeoPlaceResolver;

/// Create routes for the geocoding feature
pub fn routes(resolver: Arc<GeoPlaceResolver>) -> Router {
    Router::new()
        .route("/api/geocoding/reverse", get(handlers::reverse_geocode))
        .with_state(resolver)
}

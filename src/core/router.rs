use std::sync::Arc;

use axum::{http::StatusCode, routing::get, Router};

use crate::features::attachments::routes as attachments_routes;
use crate::features::geocoding::{routes as geocoding_routes, GeoPlaceResolver};
use crate::features::items::{routes as items_routes, ItemRepository};
use crate::features::location_sessions::{routes as location_sessions_routes, LocationSessionService};
use crate::modules::storage::AttachmentStore;

/// Shared services behind the HTTP routes
#[derive(Clone)]
pub struct AppServices {
    pub items: Arc<ItemRepository>,
    pub attachments: Arc<dyn AttachmentStore>,
    pub resolver: Arc<GeoPlaceResolver>,
    pub sessions: Arc<LocationSessionService>,
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// All API routes plus `/health`, without middleware layers
pub fn api_routes(services: AppServices) -> Router {
    Router::new()
        .merge(items_routes::routes(services.items))
        .merge(attachments_routes::routes(services.attachments))
        .merge(geocoding_routes::routes(services.resolver))
        .merge(location_sessions_routes::routes(services.sessions))
        .route("/health", get(health_check))
}

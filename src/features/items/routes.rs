use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::features::items::handlers;
use crate::features::items::services::ItemRepository;

/// Create routes for the items feature
pub fn routes(repository: Arc<ItemRepository>) -> Router {
    Router::new()
        .route(
            "/api/items",
            get(handlers::list_items).post(handlers::create_item),
        )
        // Literal segment must come before {id}
        .route("/api/items/upload", post(handlers::upload_item))
        .route(
            "/api/items/{id}",
            get(handlers::get_item)
                .patch(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route("/api/items/{id}/completed", put(handlers::set_completed))
        .route(
            "/api/items/{id}/attachments",
            post(handlers::add_attachments),
        )
        .route(
            "/api/items/{id}/attachments/{reference}",
            delete(handlers::remove_attachment),
        )
        .with_state(repository)
}

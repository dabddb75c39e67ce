use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::attachments::handlers;
use crate::modules::storage::AttachmentStore;

/// Create routes for the attachments feature
pub fn routes(store: Arc<dyn AttachmentStore>) -> Router {
    Router::new()
        .route("/api/attachments", post(handlers::upload_attachments))
        .route("/api/attachments/{reference}", get(handlers::get_attachment))
        .route(
            "/api/attachments/{reference}/content",
            get(handlers::get_attachment_content),
        )
        .with_state(store)
}

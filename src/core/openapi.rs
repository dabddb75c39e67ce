use utoipa::{Modify, OpenApi};

use crate::features::attachments::{dtos as attachments_dtos, handlers as attachments_handlers};
use crate::features::geocoding::{dtos as geocoding_dtos, handlers as geocoding_handlers};
use crate::features::items::{dtos as items_dtos, handlers as items_handlers};
use crate::features::location_sessions::{
    dtos as location_sessions_dtos, handlers as location_sessions_handlers,
};
use crate::shared::types::{ApiResponse, Meta};
use crate::shared::Coordinate;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Items
        items_handlers::list_items,
        items_handlers::create_item,
        items_handlers::upload_item,
        items_handlers::get_item,
        items_handlers::update_item,
        items_handlers::set_completed,
        items_handlers::delete_item,
        items_handlers::add_attachments,
        items_handlers::remove_attachment,
        // Attachments
        attachments_handlers::upload_attachments,
        attachments_handlers::get_attachment,
        attachments_handlers::get_attachment_content,
        // Geocoding
        geocoding_handlers::reverse_geocode,
        // Location sessions
        location_sessions_handlers::open_session,
        location_sessions_handlers::get_session,
        location_sessions_handlers::close_session,
        location_sessions_handlers::place_pin,
        location_sessions_handlers::clear_pin,
        location_sessions_handlers::confirm_session,
    ),
    components(
        schemas(
            // Shared
            Meta,
            Coordinate,
            // Items
            items_dtos::ItemResponseDto,
            items_dtos::CreateItemDto,
            items_dtos::UpdateItemDto,
            items_dtos::SetCompletedDto,
            items_dtos::UploadItemDto,
            items_dtos::UploadAttachmentsDto,
            ApiResponse<items_dtos::ItemResponseDto>,
            ApiResponse<Vec<items_dtos::ItemResponseDto>>,
            // Attachments
            attachments_dtos::AttachmentResponseDto,
            attachments_dtos::UploadAttachmentFormDto,
            ApiResponse<attachments_dtos::AttachmentResponseDto>,
            ApiResponse<Vec<attachments_dtos::AttachmentResponseDto>>,
            // Geocoding
            geocoding_dtos::ReverseGeocodeResponseDto,
            ApiResponse<geocoding_dtos::ReverseGeocodeResponseDto>,
            // Location sessions
            location_sessions_dtos::LocationSessionDto,
            location_sessions_dtos::PlacePinDto,
            location_sessions_dtos::ConfirmLocationDto,
            ApiResponse<location_sessions_dtos::LocationSessionDto>,
        )
    ),
    tags(
        (name = "items", description = "Bucket list items"),
        (name = "attachments", description = "Photo upload and retrieval"),
        (name = "geocoding", description = "Reverse geocoding of map coordinates"),
        (name = "location-sessions", description = "Map pin selection that ends in a new item"),
    ),
    info(
        title = "Bucket List API",
        version = "0.1.0",
        description = "API documentation for the bucket list service",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/api/items",
            "/api/items/{id}",
            "/api/attachments/{reference}/content",
            "/api/geocoding/reverse",
            "/api/location-sessions/{id}/confirm",
        ] {
            assert!(paths.contains(&expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_swagger_info_modifier() {
        let mut doc = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Custom".to_string(),
            version: "9.9.9".to_string(),
            description: "Overridden".to_string(),
        }
        .modify(&mut doc);

        assert_eq!(doc.info.title, "Custom");
        assert_eq!(doc.info.version, "9.9.9");
        assert_eq!(doc.info.description.as_deref(), Some("Overridden"));
    }
}

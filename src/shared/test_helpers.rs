//! In-process doubles shared by unit and router tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::core::error::{AppError, Result};
use crate::features::geocoding::models::PlaceCandidate;
use crate::features::geocoding::{GeoPlaceResolver, ReverseGeocoder};
use crate::features::items::services::{ItemRepository, MemoryItemStore};
use crate::modules::storage::{extension_for_content_type, AttachmentRef, AttachmentStore};
use crate::shared::Coordinate;

/// Attachment store keeping payloads in a map
#[derive(Default)]
pub struct MemoryAttachmentStore {
    payloads: RwLock<HashMap<AttachmentRef, Vec<u8>>>,
}

impl MemoryAttachmentStore {
    pub async fn len(&self) -> usize {
        self.payloads.read().await.len()
    }
}

#[async_trait]
impl AttachmentStore for MemoryAttachmentStore {
    async fn store(&self, payload: Vec<u8>, content_type: &str) -> Result<AttachmentRef> {
        if payload.is_empty() {
            return Err(AppError::Validation(
                "Attachment payload must not be empty".to_string(),
            ));
        }
        let reference = AttachmentRef::generate(extension_for_content_type(content_type));
        self.payloads
            .write()
            .await
            .insert(reference.clone(), payload);
        Ok(reference)
    }

    async fn resolve(&self, reference: &AttachmentRef) -> Result<String> {
        if self.payloads.read().await.contains_key(reference) {
            Ok(format!("memory://{}", reference))
        } else {
            Err(AppError::NotFound(format!(
                "Attachment '{}' not found",
                reference
            )))
        }
    }

    async fn load(&self, reference: &AttachmentRef) -> Result<Vec<u8>> {
        self.payloads
            .read()
            .await
            .get(reference)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Attachment '{}' not found", reference)))
    }

    async fn release(&self, reference: &AttachmentRef) -> Result<()> {
        self.payloads.write().await.remove(reference);
        Ok(())
    }
}

/// Attachment store whose writes always fail, like a full disk
pub struct FailingAttachmentStore;

#[async_trait]
impl AttachmentStore for FailingAttachmentStore {
    async fn store(&self, _payload: Vec<u8>, _content_type: &str) -> Result<AttachmentRef> {
        Err(AppError::Storage("No space left on device".to_string()))
    }

    async fn resolve(&self, reference: &AttachmentRef) -> Result<String> {
        Err(AppError::NotFound(format!(
            "Attachment '{}' not found",
            reference
        )))
    }

    async fn load(&self, reference: &AttachmentRef) -> Result<Vec<u8>> {
        Err(AppError::NotFound(format!(
            "Attachment '{}' not found",
            reference
        )))
    }

    async fn release(&self, _reference: &AttachmentRef) -> Result<()> {
        Ok(())
    }
}

/// Repository over in-memory item and attachment stores
pub fn memory_repository() -> (Arc<ItemRepository>, Arc<MemoryAttachmentStore>) {
    let attachments = Arc::new(MemoryAttachmentStore::default());
    let repository = Arc::new(ItemRepository::new(
        Arc::new(MemoryItemStore::new()),
        Arc::clone(&attachments) as Arc<dyn AttachmentStore>,
    ));
    (repository, attachments)
}

/// Geocoder answering every lookup with the same common name, or nothing
pub struct StaticGeocoder(pub Option<String>);

#[async_trait]
impl ReverseGeocoder for StaticGeocoder {
    async fn reverse_geocode(&self, _coordinate: Coordinate) -> Result<Option<PlaceCandidate>> {
        Ok(self.0.clone().map(|name| PlaceCandidate {
            common_name: Some(name),
            ..Default::default()
        }))
    }
}

pub fn static_resolver(name: Option<&str>) -> Arc<GeoPlaceResolver> {
    Arc::new(GeoPlaceResolver::new(
        Arc::new(StaticGeocoder(name.map(str::to_string))),
        Duration::from_secs(5),
    ))
}

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::items::models::{BucketListItem, CreateBucketListItem, ItemEvent, ItemPatch};
use crate::features::items::services::ItemStore;
use crate::modules::storage::{AttachmentPayload, AttachmentRef, AttachmentStore};
use crate::shared::constants::ITEM_EVENT_CHANNEL_CAPACITY;
use crate::shared::Coordinate;

/// Authoritative owner of the bucket list
///
/// All writes are serialized through one lock so a read-modify-write on an
/// item never interleaves with another write. Reads go straight to the
/// store and return owned snapshots.
pub struct ItemRepository {
    store: Arc<dyn ItemStore>,
    attachments: Arc<dyn AttachmentStore>,
    write_lock: Mutex<()>,
    events: broadcast::Sender<ItemEvent>,
}

impl ItemRepository {
    pub fn new(store: Arc<dyn ItemStore>, attachments: Arc<dyn AttachmentStore>) -> Self {
        let (events, _) = broadcast::channel(ITEM_EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            attachments,
            write_lock: Mutex::new(()),
            events,
        }
    }

    /// Receive a notification after every successful write
    pub fn subscribe(&self) -> broadcast::Receiver<ItemEvent> {
        self.events.subscribe()
    }

    pub fn attachment_store(&self) -> &Arc<dyn AttachmentStore> {
        &self.attachments
    }

    fn publish(&self, event: ItemEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Create and persist a new item
    pub async fn create(&self, input: CreateBucketListItem) -> Result<BucketListItem> {
        let item = BucketListItem::create(input)?;

        let guard = self.write_lock.lock().await;
        self.ensure_unowned(item.id(), item.attachments()).await?;
        self.store.insert(&item).await?;
        drop(guard);

        info!(
            "Created bucket list item: {} ({} attachments)",
            item.id(),
            item.attachments().len()
        );
        self.publish(ItemEvent::Created(item.id()));
        Ok(item)
    }

    /// Store raw payloads first, then create the item owning them.
    ///
    /// Payloads stored by this call are released again if any later step
    /// fails, so nothing is left orphaned in the attachment store.
    pub async fn create_with_payloads(
        &self,
        mut input: CreateBucketListItem,
        payloads: Vec<AttachmentPayload>,
    ) -> Result<BucketListItem> {
        let stored = self.store_payloads(payloads).await?;
        input.attachments.extend(stored.iter().cloned());

        match self.create(input).await {
            Ok(item) => Ok(item),
            Err(e) => {
                self.release_all(&stored).await;
                Err(e)
            }
        }
    }

    /// Fetch one item
    pub async fn get(&self, id: Uuid) -> Result<BucketListItem> {
        self.store
            .fetch(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Bucket list item {} not found", id)))
    }

    /// All items in insertion order
    pub async fn list(&self) -> Result<Vec<BucketListItem>> {
        self.store.fetch_all().await
    }

    /// Items that carry a coordinate, in insertion order
    pub async fn list_located(&self) -> Result<Vec<BucketListItem>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|item| item.coordinate().is_some())
            .collect())
    }

    /// Apply a partial change set, all-or-nothing
    pub async fn update(&self, id: Uuid, patch: ItemPatch) -> Result<BucketListItem> {
        self.modify(id, |_| Ok(patch)).await
    }

    pub async fn set_completed(&self, id: Uuid, completed: bool) -> Result<BucketListItem> {
        self.update(
            id,
            ItemPatch {
                completed: Some(completed),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn rename(&self, id: Uuid, activity: String) -> Result<BucketListItem> {
        self.update(
            id,
            ItemPatch {
                activity: Some(activity),
                ..Default::default()
            },
        )
        .await
    }

    /// Bind (or clear) the place name and coordinate together
    pub async fn set_location(
        &self,
        id: Uuid,
        location: Option<String>,
        coordinate: Option<Coordinate>,
    ) -> Result<BucketListItem> {
        let patch = ItemPatch {
            location: Some(location),
            ..ItemPatch::coordinate(coordinate)
        };
        self.update(id, patch).await
    }

    /// Append already stored references to the item's attachment list
    pub async fn add_attachments(
        &self,
        id: Uuid,
        references: Vec<AttachmentRef>,
    ) -> Result<BucketListItem> {
        self.modify(id, move |existing| {
            let mut attachments = existing.attachments().to_vec();
            attachments.extend(references);
            Ok(ItemPatch {
                attachments: Some(attachments),
                ..Default::default()
            })
        })
        .await
    }

    /// Store payloads and append them to the item; stored payloads are
    /// released again if the item can't be updated
    pub async fn add_attachment_payloads(
        &self,
        id: Uuid,
        payloads: Vec<AttachmentPayload>,
    ) -> Result<BucketListItem> {
        let stored = self.store_payloads(payloads).await?;

        match self.add_attachments(id, stored.clone()).await {
            Ok(item) => Ok(item),
            Err(e) => {
                self.release_all(&stored).await;
                Err(e)
            }
        }
    }

    /// Detach every occurrence of a reference and release its payload
    pub async fn remove_attachment(
        &self,
        id: Uuid,
        reference: &AttachmentRef,
    ) -> Result<BucketListItem> {
        self.modify(id, |existing| {
            if !existing.attachments().contains(reference) {
                return Err(AppError::NotFound(format!(
                    "Attachment '{}' is not attached to item {}",
                    reference,
                    existing.id()
                )));
            }
            let attachments = existing
                .attachments()
                .iter()
                .filter(|a| *a != reference)
                .cloned()
                .collect();
            Ok(ItemPatch {
                attachments: Some(attachments),
                ..Default::default()
            })
        })
        .await
    }

    /// Remove an item and release the attachments it owned
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let guard = self.write_lock.lock().await;
        let existing = self.get(id).await?;
        if !self.store.remove(id).await? {
            return Err(AppError::NotFound(format!(
                "Bucket list item {} not found",
                id
            )));
        }
        self.release_all(existing.attachments()).await;
        drop(guard);

        info!("Deleted bucket list item: {}", id);
        self.publish(ItemEvent::Deleted(id));
        Ok(())
    }

    /// Read-modify-write under the write lock.
    ///
    /// The patch is built from the current state, merged and validated
    /// before anything is written. Attachments dropped by the write are
    /// released before the lock is given up.
    async fn modify<F>(&self, id: Uuid, build_patch: F) -> Result<BucketListItem>
    where
        F: FnOnce(&BucketListItem) -> Result<ItemPatch>,
    {
        let guard = self.write_lock.lock().await;

        let existing = self.get(id).await?;
        let patch = build_patch(&existing)?;
        let updated = existing.apply(patch)?;

        let before: HashSet<&AttachmentRef> = existing.attachments().iter().collect();
        let added: Vec<AttachmentRef> = updated
            .attachments()
            .iter()
            .filter(|a| !before.contains(a))
            .cloned()
            .collect();
        self.ensure_unowned(id, &added).await?;

        if !self.store.replace(&updated).await? {
            return Err(AppError::NotFound(format!(
                "Bucket list item {} not found",
                id
            )));
        }

        let kept: HashSet<&AttachmentRef> = updated.attachments().iter().collect();
        let dropped: Vec<AttachmentRef> = existing
            .attachments()
            .iter()
            .filter(|a| !kept.contains(a))
            .cloned()
            .collect();
        self.release_all(&dropped).await;
        drop(guard);

        info!("Updated bucket list item: {}", id);
        self.publish(ItemEvent::Updated(id));
        Ok(updated)
    }

    /// An attachment belongs to exactly one item; references already
    /// carried by a different item are rejected. Call with the write lock held.
    async fn ensure_unowned(&self, owner: Uuid, references: &[AttachmentRef]) -> Result<()> {
        if references.is_empty() {
            return Ok(());
        }

        let claimed = self.store.attachment_owners(references).await?;
        if let Some((reference, other)) = claimed.into_iter().find(|(_, id)| *id != owner) {
            warn!(
                "Rejected attachment '{}' for item {}: already owned by item {}",
                reference, owner, other
            );
            return Err(AppError::Validation(format!(
                "Attachment '{}' already belongs to another item",
                reference
            )));
        }
        Ok(())
    }

    async fn store_payloads(&self, payloads: Vec<AttachmentPayload>) -> Result<Vec<AttachmentRef>> {
        let mut stored = Vec::with_capacity(payloads.len());

        for payload in payloads {
            match self
                .attachments
                .store(payload.data, &payload.content_type)
                .await
            {
                Ok(reference) => stored.push(reference),
                Err(e) => {
                    self.release_all(&stored).await;
                    return Err(e);
                }
            }
        }

        Ok(stored)
    }

    /// Best-effort release; failures are logged, never returned
    async fn release_all(&self, references: &[AttachmentRef]) {
        let mut seen = HashSet::new();
        for reference in references {
            if !seen.insert(reference) {
                continue;
            }
            if let Err(e) = self.attachments.release(reference).await {
                warn!("Failed to release attachment '{}': {}", reference, e);
            }
        }
    }
}

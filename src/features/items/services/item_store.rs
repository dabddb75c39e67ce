use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::items::models::BucketListItem;
use crate::modules::storage::AttachmentRef;

/// Durable backing collection for bucket list items
///
/// Stores only persist and fetch; invariants are checked before an item
/// reaches them. `fetch_all` returns items in insertion order.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn insert(&self, item: &BucketListItem) -> Result<()>;

    async fn fetch(&self, id: Uuid) -> Result<Option<BucketListItem>>;

    async fn fetch_all(&self) -> Result<Vec<BucketListItem>>;

    /// Overwrite a stored item; `false` when the id is unknown
    async fn replace(&self, item: &BucketListItem) -> Result<bool>;

    /// `false` when the id is unknown
    async fn remove(&self, id: Uuid) -> Result<bool>;

    /// Items carrying any of the given references, as (reference, item id)
    async fn attachment_owners(
        &self,
        references: &[AttachmentRef],
    ) -> Result<Vec<(AttachmentRef, Uuid)>>;
}

/// Process-local store, used when no database is configured and in tests
#[derive(Default)]
pub struct MemoryItemStore {
    items: RwLock<Vec<BucketListItem>>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn insert(&self, item: &BucketListItem) -> Result<()> {
        self.items.write().await.push(item.clone());
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<BucketListItem>> {
        Ok(self
            .items
            .read()
            .await
            .iter()
            .find(|item| item.id() == id)
            .cloned())
    }

    async fn fetch_all(&self) -> Result<Vec<BucketListItem>> {
        Ok(self.items.read().await.clone())
    }

    async fn replace(&self, item: &BucketListItem) -> Result<bool> {
        let mut items = self.items.write().await;
        match items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) => {
                *existing = item.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, id: Uuid) -> Result<bool> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|item| item.id() != id);
        Ok(items.len() != before)
    }

    async fn attachment_owners(
        &self,
        references: &[AttachmentRef],
    ) -> Result<Vec<(AttachmentRef, Uuid)>> {
        let items = self.items.read().await;
        let mut owners = Vec::new();
        for item in items.iter() {
            for reference in item.attachments() {
                if references.contains(reference) {
                    owners.push((reference.clone(), item.id()));
                }
            }
        }
        Ok(owners)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::items::models::CreateBucketListItem;

    #[tokio::test]
    async fn test_attachment_owners_reports_each_holder() {
        let store = MemoryItemStore::new();
        let photo = AttachmentRef::generate("jpg");
        let other = AttachmentRef::generate("png");

        let item = BucketListItem::create(CreateBucketListItem {
            activity: "Visit Kyoto".to_string(),
            attachments: vec![photo.clone()],
            ..Default::default()
        })
        .unwrap();
        store.insert(&item).await.unwrap();

        let owners = store
            .attachment_owners(&[photo.clone(), other.clone()])
            .await
            .unwrap();
        assert_eq!(owners, vec![(photo, item.id())]);
        assert!(store.attachment_owners(&[other]).await.unwrap().is_empty());
    }
}

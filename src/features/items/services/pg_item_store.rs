use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::items::models::BucketListItem;
use crate::features::items::services::ItemStore;
use crate::modules::storage::AttachmentRef;

/// Row shape of `bucket_list_items`
#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    activity: String,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    completed: bool,
    location: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    attachments: Vec<String>,
}

impl TryFrom<ItemRow> for BucketListItem {
    type Error = AppError;

    fn try_from(row: ItemRow) -> Result<Self> {
        let id = row.id;
        let attachments = row
            .attachments
            .into_iter()
            .map(AttachmentRef::parse)
            .collect::<Result<Vec<_>>>()
            .map_err(|e| AppError::Storage(format!("Stored item {} is corrupt: {}", id, e)))?;

        BucketListItem::restore(
            id,
            row.activity,
            row.created,
            row.updated,
            row.completed,
            row.location,
            row.latitude,
            row.longitude,
            attachments,
        )
        .map_err(|e| {
            tracing::error!("Corrupt bucket list row {}: {}", id, e);
            AppError::Storage(format!("Stored item {} is corrupt: {}", id, e))
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, activity, created, updated, completed, location, latitude, longitude, attachments
    FROM bucket_list_items
"#;

fn attachment_strings(item: &BucketListItem) -> Vec<String> {
    item.attachments()
        .iter()
        .map(|a| a.as_str().to_string())
        .collect()
}

/// Postgres-backed item store
pub struct PgItemStore {
    pool: PgPool,
}

impl PgItemStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemStore for PgItemStore {
    async fn insert(&self, item: &BucketListItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO bucket_list_items
                (id, activity, created, updated, completed, location, latitude, longitude, attachments)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(item.id())
        .bind(item.activity())
        .bind(item.created())
        .bind(item.updated())
        .bind(item.completed())
        .bind(item.location())
        .bind(item.coordinate().map(|c| c.latitude))
        .bind(item.coordinate().map(|c| c.longitude))
        .bind(attachment_strings(item))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert bucket list item: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<BucketListItem>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!("{} WHERE id = $1", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(BucketListItem::try_from).transpose()
    }

    async fn fetch_all(&self) -> Result<Vec<BucketListItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!("{} ORDER BY seq ASC", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(BucketListItem::try_from).collect()
    }

    async fn replace(&self, item: &BucketListItem) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bucket_list_items
            SET activity = $2, updated = $3, completed = $4, location = $5,
                latitude = $6, longitude = $7, attachments = $8
            WHERE id = $1
            "#,
        )
        .bind(item.id())
        .bind(item.activity())
        .bind(item.updated())
        .bind(item.completed())
        .bind(item.location())
        .bind(item.coordinate().map(|c| c.latitude))
        .bind(item.coordinate().map(|c| c.longitude))
        .bind(attachment_strings(item))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update bucket list item {}: {:?}", item.id(), e);
            AppError::Database(e)
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM bucket_list_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn attachment_owners(
        &self,
        references: &[AttachmentRef],
    ) -> Result<Vec<(AttachmentRef, Uuid)>> {
        let wanted: Vec<String> = references.iter().map(|r| r.as_str().to_string()).collect();

        let rows = sqlx::query_as::<_, (String, Uuid)>(
            r#"
            SELECT DISTINCT owned.reference, i.id
            FROM bucket_list_items i
            CROSS JOIN LATERAL unnest(i.attachments) AS owned(reference)
            WHERE i.attachments && $1 AND owned.reference = ANY($1)
            "#,
        )
        .bind(wanted)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(reference, id)| Ok((AttachmentRef::parse(reference)?, id)))
            .collect()
    }
}

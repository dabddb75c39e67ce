use chrono::{DateTime, Duration, SubsecRound, Utc};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::modules::storage::AttachmentRef;
use crate::shared::Coordinate;

/// One entry on the bucket list
///
/// Fields are private: an item only comes into existence through
/// [`BucketListItem::create`] (or is restored from storage) and only
/// changes through [`BucketListItem::apply`], both of which enforce the
/// invariants below.
/// - `activity` is trimmed and non-empty
/// - `coordinate` is a whole pair or absent
/// - `updated >= created`
#[derive(Debug, Clone, PartialEq)]
pub struct BucketListItem {
    id: Uuid,
    activity: String,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    completed: bool,
    location: Option<String>,
    coordinate: Option<Coordinate>,
    attachments: Vec<AttachmentRef>,
}

/// Input for creating a new item
#[derive(Debug, Clone, Default)]
pub struct CreateBucketListItem {
    pub activity: String,
    pub attachments: Vec<AttachmentRef>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl CreateBucketListItem {
    pub fn new(activity: impl Into<String>) -> Self {
        Self {
            activity: activity.into(),
            ..Default::default()
        }
    }
}

/// Partial change set for an existing item
///
/// `None` leaves a field alone. For nullable fields `Some(None)` clears
/// the value. Latitude and longitude are patched independently and the
/// merged pair is validated, so clearing only one half is rejected.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub activity: Option<String>,
    pub location: Option<Option<String>>,
    pub latitude: Option<Option<f64>>,
    pub longitude: Option<Option<f64>>,
    pub completed: Option<bool>,
    pub attachments: Option<Vec<AttachmentRef>>,
}

impl ItemPatch {
    /// Patch that sets or clears the coordinate as a whole
    pub fn coordinate(coordinate: Option<Coordinate>) -> Self {
        Self {
            latitude: Some(coordinate.map(|c| c.latitude)),
            longitude: Some(coordinate.map(|c| c.longitude)),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.activity.is_none()
            && self.location.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.completed.is_none()
            && self.attachments.is_none()
    }
}

/// Current time at the precision the database keeps (microseconds)
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn normalize_activity(activity: &str) -> Result<String> {
    let trimmed = activity.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(
            "activity must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn normalize_location(location: Option<String>) -> Option<String> {
    location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}

impl BucketListItem {
    /// Build a brand new item; `created == updated == now`
    pub(crate) fn create(input: CreateBucketListItem) -> Result<Self> {
        let activity = normalize_activity(&input.activity)?;
        let coordinate = Coordinate::from_parts(input.latitude, input.longitude)?;
        let timestamp = now();

        Ok(Self {
            id: Uuid::new_v4(),
            activity,
            created: timestamp,
            updated: timestamp,
            completed: false,
            location: normalize_location(input.location),
            coordinate,
            attachments: input.attachments,
        })
    }

    /// Rebuild an item read back from a store, re-checking every invariant
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        id: Uuid,
        activity: String,
        created: DateTime<Utc>,
        updated: DateTime<Utc>,
        completed: bool,
        location: Option<String>,
        latitude: Option<f64>,
        longitude: Option<f64>,
        attachments: Vec<AttachmentRef>,
    ) -> Result<Self> {
        if activity.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "stored item {} has an empty activity",
                id
            )));
        }
        if updated < created {
            return Err(AppError::Validation(format!(
                "stored item {} was updated before it was created",
                id
            )));
        }
        let coordinate = Coordinate::from_parts(latitude, longitude)?;

        Ok(Self {
            id,
            activity,
            created,
            updated,
            completed,
            location,
            coordinate,
            attachments,
        })
    }

    /// Merge a patch into a copy of this item.
    ///
    /// Validation runs on the merged state and nothing is written to
    /// `self`, so a rejected patch leaves the item untouched.
    pub(crate) fn apply(&self, patch: ItemPatch) -> Result<Self> {
        let activity = match patch.activity {
            Some(activity) => normalize_activity(&activity)?,
            None => self.activity.clone(),
        };

        let latitude = patch
            .latitude
            .unwrap_or_else(|| self.coordinate.map(|c| c.latitude));
        let longitude = patch
            .longitude
            .unwrap_or_else(|| self.coordinate.map(|c| c.longitude));
        let coordinate = Coordinate::from_parts(latitude, longitude)?;

        let location = match patch.location {
            Some(location) => normalize_location(location),
            None => self.location.clone(),
        };

        Ok(Self {
            id: self.id,
            activity,
            created: self.created,
            updated: self.next_updated(),
            completed: patch.completed.unwrap_or(self.completed),
            location,
            coordinate,
            attachments: patch
                .attachments
                .unwrap_or_else(|| self.attachments.clone()),
        })
    }

    /// A timestamp strictly after the current `updated`
    fn next_updated(&self) -> DateTime<Utc> {
        let current = now();
        if current > self.updated {
            current
        } else {
            self.updated + Duration::microseconds(1)
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn activity(&self) -> &str {
        &self.activity
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn updated(&self) -> DateTime<Utc> {
        self.updated
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.coordinate
    }

    pub fn attachments(&self) -> &[AttachmentRef] {
        &self.attachments
    }
}

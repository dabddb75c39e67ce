use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::geocoding::GeoPlaceResolver;
use crate::features::items::models::{BucketListItem, CreateBucketListItem};
use crate::features::items::services::ItemRepository;
use crate::features::location_sessions::models::SessionState;
use crate::features::location_sessions::services::LocationSelectionSession;
use crate::modules::storage::AttachmentRef;
use crate::shared::Coordinate;

struct SessionEntry {
    session: Arc<LocationSelectionSession>,
    last_used: Instant,
}

/// Registry of open location selections, keyed by id
///
/// Sessions untouched for longer than the idle TTL are dropped.
pub struct LocationSessionService {
    resolver: Arc<GeoPlaceResolver>,
    repository: Arc<ItemRepository>,
    idle_ttl: Duration,
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
}

impl LocationSessionService {
    pub fn new(
        resolver: Arc<GeoPlaceResolver>,
        repository: Arc<ItemRepository>,
        idle_ttl: Duration,
    ) -> Self {
        Self {
            resolver,
            repository,
            idle_ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a new, empty session
    pub async fn open(&self) -> Uuid {
        self.purge_expired().await;

        let id = Uuid::now_v7();
        let session = Arc::new(LocationSelectionSession::new(Arc::clone(&self.resolver)));
        self.sessions.write().await.insert(
            id,
            SessionEntry {
                session,
                last_used: Instant::now(),
            },
        );

        debug!("Opened location session {}", id);
        id
    }

    async fn session(&self, id: Uuid) -> Result<Arc<LocationSelectionSession>> {
        let mut sessions = self.sessions.write().await;

        if let Some(entry) = sessions.get_mut(&id) {
            if entry.last_used.elapsed() < self.idle_ttl {
                entry.last_used = Instant::now();
                return Ok(Arc::clone(&entry.session));
            }
        }

        sessions.remove(&id);
        Err(AppError::NotFound(format!(
            "Location session {} not found",
            id
        )))
    }

    pub async fn state(&self, id: Uuid) -> Result<SessionState> {
        Ok(self.session(id).await?.state().await)
    }

    pub async fn close(&self, id: Uuid) -> Result<()> {
        match self.sessions.write().await.remove(&id) {
            Some(_) => {
                debug!("Closed location session {}", id);
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Location session {} not found",
                id
            ))),
        }
    }

    /// Place (or move) the pin; naming continues in the background
    pub async fn place_pin(&self, id: Uuid, coordinate: Coordinate) -> Result<SessionState> {
        let session = self.session(id).await?;
        session.place_pin(coordinate).await?;
        Ok(session.state().await)
    }

    pub async fn clear_pin(&self, id: Uuid) -> Result<()> {
        self.session(id).await?.clear().await;
        Ok(())
    }

    /// Confirm the selection and create an item at it.
    ///
    /// The session is left untouched when the activity is blank, and gets
    /// its selection back if the item cannot be stored.
    pub async fn confirm(
        &self,
        id: Uuid,
        activity: String,
        attachments: Vec<AttachmentRef>,
    ) -> Result<BucketListItem> {
        let session = self.session(id).await?;

        if activity.trim().is_empty() {
            return Err(AppError::Validation(
                "activity must not be empty".to_string(),
            ));
        }

        let selected = session.confirm().await?;
        let input = CreateBucketListItem {
            activity,
            attachments,
            location: Some(selected.name.clone()),
            latitude: Some(selected.coordinate.latitude),
            longitude: Some(selected.coordinate.longitude),
        };

        match self.repository.create(input).await {
            Ok(item) => {
                info!("Location session {} confirmed as item {}", id, item.id());
                Ok(item)
            }
            Err(e) => {
                session.restore(selected).await;
                Err(e)
            }
        }
    }

    /// Drop idle sessions, returning how many went
    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_used.elapsed() < self.idle_ttl);

        let purged = before - sessions.len();
        if purged > 0 {
            debug!("Purged {} idle location sessions", purged);
        }
        purged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{memory_repository, static_resolver};

    const KYOTO: Coordinate = Coordinate {
        latitude: 35.0,
        longitude: 135.8,
    };

    fn service(name: Option<&str>, idle_ttl: Duration) -> (LocationSessionService, Arc<ItemRepository>) {
        let (repository, _) = memory_repository();
        let service =
            LocationSessionService::new(static_resolver(name), Arc::clone(&repository), idle_ttl);
        (service, repository)
    }

    async fn wait_until_named(service: &LocationSessionService, id: Uuid) -> SessionState {
        for _ in 0..100 {
            let state = service.state(id).await.unwrap();
            if matches!(state, SessionState::Named { .. }) {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("session {} never got a name", id);
    }

    #[tokio::test]
    async fn test_confirm_creates_located_item() {
        let (service, repository) = service(Some("Kyoto"), Duration::from_secs(60));
        let id = service.open().await;

        let state = service.place_pin(id, KYOTO).await.unwrap();
        assert_eq!(state.coordinate(), Some(KYOTO));
        wait_until_named(&service, id).await;

        let item = service
            .confirm(id, "Visit Kyoto".to_string(), Vec::new())
            .await
            .unwrap();

        assert_eq!(item.activity(), "Visit Kyoto");
        assert_eq!(item.location(), Some("Kyoto"));
        assert_eq!(item.coordinate(), Some(KYOTO));
        assert_eq!(repository.list().await.unwrap().len(), 1);
        assert_eq!(service.state(id).await.unwrap(), SessionState::Empty);
    }

    #[tokio::test]
    async fn test_unknown_place_is_named_unknown_location() {
        let (service, _) = service(None, Duration::from_secs(60));
        let id = service.open().await;

        service.place_pin(id, KYOTO).await.unwrap();
        let state = wait_until_named(&service, id).await;
        assert_eq!(state.name(), Some("Unknown Location"));
    }

    #[tokio::test]
    async fn test_blank_activity_keeps_selection() {
        let (service, repository) = service(Some("Kyoto"), Duration::from_secs(60));
        let id = service.open().await;
        service.place_pin(id, KYOTO).await.unwrap();

        let result = service.confirm(id, "   ".to_string(), Vec::new()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(service.state(id).await.unwrap().coordinate(), Some(KYOTO));
        assert!(repository.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_confirm_empty_session_is_invalid_state() {
        let (service, _) = service(Some("Kyoto"), Duration::from_secs(60));
        let id = service.open().await;

        let result = service.confirm(id, "Visit Kyoto".to_string(), Vec::new()).await;
        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_close_and_unknown_session() {
        let (service, _) = service(Some("Kyoto"), Duration::from_secs(60));
        let id = service.open().await;

        service.close(id).await.unwrap();
        assert!(matches!(service.state(id).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.close(id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let (service, _) = service(Some("Kyoto"), Duration::ZERO);
        let first = service.open().await;
        let second = service.open().await;

        assert!(matches!(service.state(second).await, Err(AppError::NotFound(_))));
        assert_eq!(service.purge_expired().await, 0);
        assert!(matches!(service.state(first).await, Err(AppError::NotFound(_))));
    }
}

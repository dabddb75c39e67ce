use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::features::geocoding::GeoPlaceResolver;
use crate::features::location_sessions::models::{SelectedLocation, SessionState};
use crate::shared::Coordinate;

struct Inner {
    state: SessionState,
    /// Bumped on every pin, clear and confirm; a lookup only lands if the
    /// generation it started under is still current.
    generation: u64,
}

/// State machine for picking one spot on a map
///
/// `Empty -> Pending -> Named`, back to `Empty` on clear or confirm.
/// Placing a new pin always wins over an older lookup still in flight.
pub struct LocationSelectionSession {
    resolver: Arc<GeoPlaceResolver>,
    inner: Arc<Mutex<Inner>>,
}

impl LocationSelectionSession {
    pub fn new(resolver: Arc<GeoPlaceResolver>) -> Self {
        Self {
            resolver,
            inner: Arc::new(Mutex::new(Inner {
                state: SessionState::Empty,
                generation: 0,
            })),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state.clone()
    }

    /// Move to `Pending` at `coordinate` and start naming it.
    ///
    /// The returned handle finishes once the lookup has been applied or
    /// discarded; callers may simply drop it.
    pub async fn place_pin(&self, coordinate: Coordinate) -> Result<JoinHandle<()>> {
        if !coordinate.is_valid() {
            return Err(AppError::Validation(format!(
                "Coordinate {} is out of range",
                coordinate
            )));
        }

        let generation = {
            let mut inner = self.inner.lock().await;
            inner.generation += 1;
            inner.state = SessionState::Pending { coordinate };
            inner.generation
        };

        let resolver = Arc::clone(&self.resolver);
        let inner = Arc::clone(&self.inner);

        Ok(tokio::spawn(async move {
            let name = resolver.resolve(coordinate).await;

            let mut inner = inner.lock().await;
            let still_current = inner.generation == generation
                && matches!(inner.state, SessionState::Pending { coordinate: c } if c == coordinate);

            if still_current {
                debug!("Pin {} named '{}'", coordinate, name);
                inner.state = SessionState::Named { coordinate, name };
            } else {
                debug!("Discarding stale name '{}' for {}", name, coordinate);
            }
        }))
    }

    /// Drop the pin and any name
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        inner.state = SessionState::Empty;
    }

    /// Hand over the current pin and reset to `Empty`
    pub async fn confirm(&self) -> Result<SelectedLocation> {
        let mut inner = self.inner.lock().await;

        let selected = match std::mem::take(&mut inner.state) {
            SessionState::Empty => {
                return Err(AppError::InvalidState(
                    "No location has been selected".to_string(),
                ))
            }
            SessionState::Pending { coordinate } => SelectedLocation {
                coordinate,
                name: String::new(),
            },
            SessionState::Named { coordinate, name } => SelectedLocation { coordinate, name },
        };

        inner.generation += 1;
        Ok(selected)
    }

    /// Put back a confirmed selection whose consumer failed.
    ///
    /// Ignored if the session has moved on since.
    pub async fn restore(&self, selected: SelectedLocation) {
        let mut inner = self.inner.lock().await;
        if inner.state == SessionState::Empty {
            inner.generation += 1;
            inner.state = SessionState::Named {
                coordinate: selected.coordinate,
                name: selected.name,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::geocoding::models::PlaceCandidate;
    use crate::features::geocoding::ReverseGeocoder;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::sync::oneshot;
    use tokio_test::{assert_err, assert_ok};

    const KYOTO: Coordinate = Coordinate {
        latitude: 35.0,
        longitude: 135.8,
    };
    const OSAKA: Coordinate = Coordinate {
        latitude: 34.69,
        longitude: 135.5,
    };

    /// Geocoder whose answers are released by the test, one per coordinate
    struct GatedGeocoder {
        gates: Mutex<HashMap<String, oneshot::Receiver<String>>>,
    }

    #[async_trait]
    impl ReverseGeocoder for GatedGeocoder {
        async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<Option<PlaceCandidate>> {
            let gate = self
                .gates
                .lock()
                .await
                .remove(&coordinate.to_string())
                .expect("unexpected lookup");
            let name = gate.await.expect("gate dropped");
            Ok(Some(PlaceCandidate {
                common_name: Some(name),
                ..Default::default()
            }))
        }
    }

    fn gated_session(
        coordinates: &[Coordinate],
    ) -> (LocationSelectionSession, Vec<oneshot::Sender<String>>) {
        let mut gates = HashMap::new();
        let mut senders = Vec::new();
        for coordinate in coordinates {
            let (tx, rx) = oneshot::channel();
            gates.insert(coordinate.to_string(), rx);
            senders.push(tx);
        }

        let geocoder = Arc::new(GatedGeocoder {
            gates: Mutex::new(gates),
        });
        let resolver = Arc::new(GeoPlaceResolver::new(geocoder, Duration::from_secs(5)));
        (LocationSelectionSession::new(resolver), senders)
    }

    #[tokio::test]
    async fn test_pin_resolves_and_confirms() {
        let (session, mut gates) = gated_session(&[KYOTO]);

        let task = assert_ok!(session.place_pin(KYOTO).await);
        assert_eq!(
            session.state().await,
            SessionState::Pending { coordinate: KYOTO }
        );

        gates.remove(0).send("Kyoto".to_string()).unwrap();
        task.await.unwrap();

        let selected = assert_ok!(session.confirm().await);
        assert_eq!(selected.coordinate, KYOTO);
        assert_eq!(selected.name, "Kyoto");
        assert_eq!(session.state().await, SessionState::Empty);
    }

    #[tokio::test]
    async fn test_late_answer_for_old_pin_is_discarded() {
        let (session, mut gates) = gated_session(&[KYOTO, OSAKA]);
        let osaka_gate = gates.remove(1);
        let kyoto_gate = gates.remove(0);

        let kyoto_task = session.place_pin(KYOTO).await.unwrap();
        let osaka_task = session.place_pin(OSAKA).await.unwrap();

        osaka_gate.send("Osaka".to_string()).unwrap();
        osaka_task.await.unwrap();

        kyoto_gate.send("Kyoto".to_string()).unwrap();
        kyoto_task.await.unwrap();

        let selected = session.confirm().await.unwrap();
        assert_eq!(selected.coordinate, OSAKA);
        assert_eq!(selected.name, "Osaka");
    }

    #[tokio::test]
    async fn test_old_answer_arriving_first_keeps_new_pin_pending() {
        let (session, mut gates) = gated_session(&[KYOTO, OSAKA]);
        let osaka_gate = gates.remove(1);
        let kyoto_gate = gates.remove(0);

        let kyoto_task = session.place_pin(KYOTO).await.unwrap();
        let osaka_task = session.place_pin(OSAKA).await.unwrap();

        kyoto_gate.send("Kyoto".to_string()).unwrap();
        kyoto_task.await.unwrap();
        assert_eq!(
            session.state().await,
            SessionState::Pending { coordinate: OSAKA }
        );

        osaka_gate.send("Osaka".to_string()).unwrap();
        osaka_task.await.unwrap();
        assert_eq!(session.state().await.name(), Some("Osaka"));
    }

    #[tokio::test]
    async fn test_clear_discards_pending_lookup() {
        let (session, mut gates) = gated_session(&[KYOTO]);

        let task = session.place_pin(KYOTO).await.unwrap();
        session.clear().await;

        gates.remove(0).send("Kyoto".to_string()).unwrap();
        task.await.unwrap();

        assert_eq!(session.state().await, SessionState::Empty);
        assert_err!(session.confirm().await);
    }

    #[tokio::test]
    async fn test_confirm_while_pending_yields_empty_name() {
        let (session, mut gates) = gated_session(&[KYOTO]);

        let task = session.place_pin(KYOTO).await.unwrap();
        let selected = session.confirm().await.unwrap();
        assert_eq!(selected.coordinate, KYOTO);
        assert_eq!(selected.name, "");

        gates.remove(0).send("Kyoto".to_string()).unwrap();
        task.await.unwrap();
        assert_eq!(session.state().await, SessionState::Empty);
    }

    #[tokio::test]
    async fn test_confirm_from_empty_is_invalid_state() {
        let (session, _gates) = gated_session(&[]);
        let result = session.confirm().await;
        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_out_of_range_pin_is_rejected() {
        let (session, _gates) = gated_session(&[]);
        let result = session.place_pin(Coordinate::new(91.0, 0.0)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(session.state().await, SessionState::Empty);
    }

    #[tokio::test]
    async fn test_restore_only_into_empty_session() {
        let (session, mut gates) = gated_session(&[OSAKA]);
        let kyoto = SelectedLocation {
            coordinate: KYOTO,
            name: "Kyoto".to_string(),
        };

        session.restore(kyoto.clone()).await;
        assert_eq!(session.state().await.name(), Some("Kyoto"));

        let task = session.place_pin(OSAKA).await.unwrap();
        session.restore(kyoto).await;
        assert_eq!(
            session.state().await,
            SessionState::Pending { coordinate: OSAKA }
        );

        gates.remove(0).send("Osaka".to_string()).unwrap();
        task.await.unwrap();
    }
}

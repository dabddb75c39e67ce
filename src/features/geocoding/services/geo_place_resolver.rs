use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::error::Result;
use crate::features::geocoding::models::{PlaceCandidate, UNKNOWN_LOCATION};
use crate::shared::Coordinate;

/// Raw reverse geocoding backend
///
/// `Ok(None)` means the service answered but knows no place at the point.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<Option<PlaceCandidate>>;
}

/// Turns a coordinate into a display name
///
/// Resolution never fails: any lookup error, empty answer or timeout
/// becomes [`UNKNOWN_LOCATION`]. Exactly one lookup is made per call.
pub struct GeoPlaceResolver {
    geocoder: Arc<dyn ReverseGeocoder>,
    timeout: Duration,
}

impl GeoPlaceResolver {
    pub fn new(geocoder: Arc<dyn ReverseGeocoder>, timeout: Duration) -> Self {
        Self { geocoder, timeout }
    }

    pub async fn resolve(&self, coordinate: Coordinate) -> String {
        if !coordinate.is_valid() {
            warn!("Not geocoding malformed coordinate {}", coordinate);
            return UNKNOWN_LOCATION.to_string();
        }

        let lookup = self.geocoder.reverse_geocode(coordinate);
        match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(Some(candidate))) => {
                let name = candidate.display_name();
                debug!("Resolved {} -> {}", coordinate, name);
                name
            }
            Ok(Ok(None)) => {
                debug!("No place found at {}", coordinate);
                UNKNOWN_LOCATION.to_string()
            }
            Ok(Err(e)) => {
                warn!("Reverse geocoding failed for {}: {}", coordinate, e);
                UNKNOWN_LOCATION.to_string()
            }
            Err(_) => {
                warn!(
                    "Reverse geocoding for {} timed out after {:?}",
                    coordinate, self.timeout
                );
                UNKNOWN_LOCATION.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AppError;
    use crate::features::geocoding::models::SELECTED_LOCATION;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Reply {
        Place(PlaceCandidate),
        Nothing,
        Failure,
        Hang,
    }

    struct StubGeocoder {
        reply: Reply,
        calls: AtomicUsize,
    }

    impl StubGeocoder {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ReverseGeocoder for StubGeocoder {
        async fn reverse_geocode(&self, _coordinate: Coordinate) -> Result<Option<PlaceCandidate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Reply::Place(candidate) => Ok(Some(candidate.clone())),
                Reply::Nothing => Ok(None),
                Reply::Failure => Err(AppError::ExternalServiceError(
                    "connection refused".to_string(),
                )),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(None)
                }
            }
        }
    }

    fn resolver(geocoder: Arc<StubGeocoder>) -> GeoPlaceResolver {
        GeoPlaceResolver::new(geocoder, Duration::from_millis(100))
    }

    const KYOTO: Coordinate = Coordinate {
        latitude: 35.0,
        longitude: 135.8,
    };

    #[tokio::test]
    async fn test_resolves_common_name() {
        let geocoder = StubGeocoder::new(Reply::Place(PlaceCandidate {
            common_name: Some("Kyoto".to_string()),
            ..Default::default()
        }));

        assert_eq!(resolver(Arc::clone(&geocoder)).resolve(KYOTO).await, "Kyoto");
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_place_without_text_is_selected_location() {
        let geocoder = StubGeocoder::new(Reply::Place(PlaceCandidate::default()));
        assert_eq!(resolver(geocoder).resolve(KYOTO).await, SELECTED_LOCATION);
    }

    #[tokio::test]
    async fn test_no_data_is_unknown_location() {
        let geocoder = StubGeocoder::new(Reply::Nothing);
        assert_eq!(resolver(geocoder).resolve(KYOTO).await, "Unknown Location");
    }

    #[tokio::test]
    async fn test_failure_is_unknown_location_after_one_attempt() {
        let geocoder = StubGeocoder::new(Reply::Failure);
        assert_eq!(
            resolver(Arc::clone(&geocoder)).resolve(KYOTO).await,
            UNKNOWN_LOCATION
        );
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_unknown_location() {
        let geocoder = StubGeocoder::new(Reply::Hang);
        assert_eq!(resolver(geocoder).resolve(KYOTO).await, UNKNOWN_LOCATION);
    }

    #[tokio::test]
    async fn test_malformed_coordinate_skips_lookup() {
        let geocoder = StubGeocoder::new(Reply::Nothing);
        let name = resolver(Arc::clone(&geocoder))
            .resolve(Coordinate::new(f64::NAN, 200.0))
            .await;

        assert_eq!(name, UNKNOWN_LOCATION);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }
}

use async_trait::async_trait;
use serde::Deserialize;

use crate::core::config::GeocodingConfig;
use crate::core::error::{AppError, Result};
use crate::features::geocoding::models::PlaceCandidate;
use crate::features::geocoding::services::ReverseGeocoder;
use crate::shared::Coordinate;

/// Nominatim `/reverse` response (jsonv2)
#[derive(Debug, Deserialize)]
pub struct NominatimReverseResponse {
    /// Set instead of the other fields when nothing is found (e.g. open sea)
    pub error: Option<String>,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub address: Option<NominatimAddress>,
}

/// Nominatim address components
#[derive(Debug, Default, Deserialize)]
pub struct NominatimAddress {
    pub amenity: Option<String>,
    pub tourism: Option<String>,
    pub leisure: Option<String>,
    pub shop: Option<String>,
    pub building: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl NominatimAddress {
    /// First named feature at the point, if any
    pub fn get_point_of_interest(&self) -> Option<String> {
        self.amenity
            .clone()
            .or_else(|| self.tourism.clone())
            .or_else(|| self.leisure.clone())
            .or_else(|| self.shop.clone())
            .or_else(|| self.building.clone())
    }

    /// Get city, falling back to town or village
    pub fn get_city(&self) -> Option<String> {
        self.city
            .clone()
            .or_else(|| self.town.clone())
            .or_else(|| self.village.clone())
    }
}

impl From<NominatimReverseResponse> for PlaceCandidate {
    fn from(r: NominatimReverseResponse) -> Self {
        let address = r.address.unwrap_or_default();
        PlaceCandidate {
            common_name: r.name,
            formatted_address: r.display_name,
            point_of_interest: address.get_point_of_interest(),
            locality: address.get_city(),
            administrative_area: address.state,
            country: address.country,
        }
    }
}

/// Reverse geocoder backed by a Nominatim instance
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
    language: String,
}

impl NominatimClient {
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
        })
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimClient {
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<Option<PlaceCandidate>> {
        let url = format!("{}/reverse", self.base_url);
        tracing::debug!("Reverse geocoding {} -> {}", coordinate, url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", coordinate.latitude.to_string()),
                ("lon", coordinate.longitude.to_string()),
                ("addressdetails", "1".to_string()),
                ("accept-language", self.language.clone()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Nominatim request failed: {:?}", e);
                AppError::ExternalServiceError(format!("Nominatim request failed: {}", e))
            })?;

        if !response.status().is_success() {
            tracing::warn!("Nominatim returned status: {}", response.status());
            return Err(AppError::ExternalServiceError(format!(
                "Nominatim returned status {}",
                response.status()
            )));
        }

        let body: NominatimReverseResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Nominatim response: {:?}", e);
            AppError::ExternalServiceError(format!("Failed to parse Nominatim response: {}", e))
        })?;

        if let Some(error) = &body.error {
            tracing::debug!("Nominatim has no place at {}: {}", coordinate, error);
            return Ok(None);
        }

        Ok(Some(body.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> NominatimClient {
        NominatimClient::new(&GeocodingConfig {
            base_url: format!("{}/", server.uri()),
            user_agent: "bucket-list-tests".to_string(),
            language: "en".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    const KYOTO: Coordinate = Coordinate {
        latitude: 35.0,
        longitude: 135.8,
    };

    #[tokio::test]
    async fn test_reverse_maps_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .and(query_param("format", "jsonv2"))
            .and(query_param("lat", "35"))
            .and(query_param("lon", "135.8"))
            .and(query_param("accept-language", "en"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Kyoto",
                "display_name": "Kyoto, Kyoto Prefecture, Japan",
                "address": {
                    "city": "Kyoto",
                    "state": "Kyoto Prefecture",
                    "country": "Japan"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let candidate = client_for(&server)
            .reverse_geocode(KYOTO)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(candidate.common_name.as_deref(), Some("Kyoto"));
        assert_eq!(candidate.locality.as_deref(), Some("Kyoto"));
        assert_eq!(candidate.administrative_area.as_deref(), Some("Kyoto Prefecture"));
        assert_eq!(candidate.country.as_deref(), Some("Japan"));
        assert_eq!(candidate.display_name(), "Kyoto");
    }

    #[tokio::test]
    async fn test_town_and_amenity_fallbacks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "address": {
                    "tourism": "Old Lighthouse",
                    "town": "Harbourside",
                    "country": "Norway"
                }
            })))
            .mount(&server)
            .await;

        let candidate = client_for(&server)
            .reverse_geocode(KYOTO)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(candidate.display_name(), "Old Lighthouse, Harbourside, Norway");
    }

    #[tokio::test]
    async fn test_error_body_is_no_place() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "error": "Unable to geocode" })),
            )
            .mount(&server)
            .await;

        let result = client_for(&server).reverse_geocode(KYOTO).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_external_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = client_for(&server).reverse_geocode(KYOTO).await;
        assert!(matches!(result, Err(AppError::ExternalServiceError(_))));
    }
}

//! Nominatim geocoding client
//!
//! Resolves a free-text property address to coordinates via the OpenStreetMap
//! Nominatim search API. The public instance requires a descriptive
//! User-Agent and at most 1 request per second.

use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

const USER_AGENT: &str = "GeoRisk/0.1.0 (https://github.com/georisk/georisk)";
const RATE_LIMIT_MS: u64 = 1000; // Nominatim usage policy: 1 request per second
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Geocoder client errors
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Network failure, timeout, or upstream 5xx
    #[error("Geocoding service is unavailable: {0}")]
    Unavailable(String),

    /// No result for the submitted address
    #[error("Could not find location for address: {0}")]
    AddressNotFound(String),

    #[error("Geocoder API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// A geocoded place
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedPlace {
    pub display_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Nominatim search result entry (jsonv2 format, subset)
///
/// Nominatim serializes coordinates as strings.
#[derive(Debug, Clone, Deserialize)]
struct NominatimPlace {
    display_name: String,
    lat: String,
    lon: String,
}

/// Rate limiter enforcing 1 request/second
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with rate limit
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Nominatim geocoding client
pub struct GeocoderClient {
    http_client: reqwest::Client,
    base_url: String,
    rate_limiter: Arc<RateLimiter>,
}

impl GeocoderClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GeocodeError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| GeocodeError::Unavailable(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
            rate_limiter: Arc::new(RateLimiter::new(RATE_LIMIT_MS)),
        })
    }

    /// Resolve an address to coordinates
    ///
    /// Returns the single best match, or `AddressNotFound` when Nominatim
    /// has no result.
    pub async fn geocode(&self, address: &str) -> Result<GeocodedPlace, GeocodeError> {
        // Rate limit
        self.rate_limiter.wait().await;

        let url = format!("{}/search", self.base_url);

        tracing::debug!(address = %address, url = %url, "Querying Nominatim");

        let response = self
            .http_client
            .get(&url)
            .query(&[("q", address), ("format", "jsonv2"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| GeocodeError::Unavailable(e.to_string()))?;

        let status = response.status();

        if status.is_server_error() {
            return Err(GeocodeError::Unavailable(format!("HTTP {}", status.as_u16())));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GeocodeError::ApiError(status.as_u16(), error_text));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| GeocodeError::Parse(e.to_string()))?;

        let place = best_match(places, address)?;

        tracing::info!(
            address = %address,
            display_name = %place.display_name,
            latitude = place.latitude,
            longitude = place.longitude,
            "Geocoded address"
        );

        Ok(place)
    }
}

/// Pick the first result and parse its coordinates
fn best_match(
    places: Vec<NominatimPlace>,
    address: &str,
) -> Result<GeocodedPlace, GeocodeError> {
    let place = places
        .into_iter()
        .next()
        .ok_or_else(|| GeocodeError::AddressNotFound(address.to_string()))?;

    let latitude = place
        .lat
        .parse::<f64>()
        .map_err(|e| GeocodeError::Parse(format!("latitude '{}': {}", place.lat, e)))?;
    let longitude = place
        .lon
        .parse::<f64>()
        .map_err(|e| GeocodeError::Parse(format!("longitude '{}': {}", place.lon, e)))?;

    Ok(GeocodedPlace {
        display_name: place.display_name,
        latitude,
        longitude,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = GeocoderClient::new("https://nominatim.openstreetmap.org");
        assert!(client.is_ok());
    }

    #[test]
    fn parses_nominatim_jsonv2_response() {
        let json = r#"[
            {
                "place_id": 128372,
                "licence": "Data © OpenStreetMap contributors",
                "display_name": "Marienplatz, Munich, Bavaria, Germany",
                "lat": "48.1374300",
                "lon": "11.5754900",
                "category": "highway",
                "type": "pedestrian"
            }
        ]"#;

        let places: Vec<NominatimPlace> = serde_json::from_str(json).unwrap();
        let place = best_match(places, "Marienplatz, Munich").unwrap();

        assert_eq!(place.display_name, "Marienplatz, Munich, Bavaria, Germany");
        assert!((place.latitude - 48.13743).abs() < 1e-6);
        assert!((place.longitude - 11.57549).abs() < 1e-6);
    }

    #[test]
    fn empty_result_set_is_address_not_found() {
        let err = best_match(Vec::new(), "nowhere at all").unwrap_err();
        assert!(matches!(err, GeocodeError::AddressNotFound(_)));
    }

    #[test]
    fn unparseable_coordinates_are_a_parse_error() {
        let places = vec![NominatimPlace {
            display_name: "Broken".to_string(),
            lat: "not-a-number".to_string(),
            lon: "11.5".to_string(),
        }];
        let err = best_match(places, "broken").unwrap_err();
        assert!(matches!(err, GeocodeError::Parse(_)));
    }

    #[tokio::test]
    async fn test_rate_limiter_timing() {
        let limiter = RateLimiter::new(500); // 500ms for faster test

        let start = Instant::now();

        // First request - no wait
        limiter.wait().await;
        let first_elapsed = start.elapsed();

        // Second request - should wait ~500ms
        limiter.wait().await;
        let second_elapsed = start.elapsed();

        assert!(first_elapsed < Duration::from_millis(100));
        assert!(second_elapsed >= Duration::from_millis(450));
    }
}

//! Environmental-data service client
//!
//! Typed client for the satellite-data service backing the location card and
//! the wildfire factor inputs. The upstream aggregates several Earth
//! observation datasets:
//!
//! - ESA WorldCover land cover histogram
//! - FIRMS historical fire detections
//! - GLDAS surface conditions (temperature, soil moisture, wind)
//! - MODIS vegetation indices (NDVI/EVI) and water coverage
//!
//! We extract a small subset of each payload; every field is optional
//! because individual datasets routinely have gaps at a given coordinate.

use georisk_common::models::{
    land_cover_label, CurrentConditions, FireHistory, LandCoverClass, LandCoverSummary,
    LocationData,
};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::services::wildfire::WildfireInputs;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Environmental-data client errors
#[derive(Debug, Error)]
pub enum EarthDataError {
    /// Network communication error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Upstream returned an error response
    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    /// Failed to parse API response JSON
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// `GET /v1/landcover` response
#[derive(Debug, Clone, Deserialize)]
pub struct LandCoverResponse {
    pub classes: Vec<LandCoverEntry>,
}

/// One histogram bucket: WorldCover class code and area share
#[derive(Debug, Clone, Deserialize)]
pub struct LandCoverEntry {
    pub code: u16,
    pub percent: f64,
}

/// `GET /v1/fires` response
#[derive(Debug, Clone, Deserialize)]
pub struct FireHistoryResponse {
    pub has_fire: bool,
    pub last_fire_date: Option<chrono::NaiveDate>,
    pub total_fires_in_period: u32,
    pub fires_per_year: f64,
}

/// `GET /v1/conditions` response (GLDAS + MODIS + water coverage subset)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConditionsResponse {
    pub surface_temperature_k: Option<f64>,
    pub soil_moisture_kg_m2: Option<f64>,
    pub soil_temperature_k: Option<f64>,
    pub wind_speed_m_s: Option<f64>,
    pub ndvi: Option<f64>,
    pub evi: Option<f64>,
    pub water_coverage_percent: Option<f64>,
    pub nearby_water_coverage_percent: Option<f64>,
}

/// `GET /v1/wildfire-factors` response
///
/// The five scoring inputs; paired values carry the historical baseline.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WildfireFactorsResponse {
    pub ndvi: Option<f64>,
    pub temperature_c: Option<ValuePair>,
    pub precipitation_mm: Option<ValuePair>,
    pub fire_count: Option<u32>,
    pub elevation_m: Option<f64>,
}

/// A (current, historical average) measurement pair
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ValuePair {
    pub current: f64,
    pub historical: f64,
}

impl From<WildfireFactorsResponse> for WildfireInputs {
    fn from(response: WildfireFactorsResponse) -> Self {
        WildfireInputs {
            ndvi: response.ndvi,
            temperature_c: response.temperature_c.map(|p| (p.current, p.historical)),
            precipitation_mm: response.precipitation_mm.map(|p| (p.current, p.historical)),
            fire_count: response.fire_count,
            elevation_m: response.elevation_m,
        }
    }
}

/// Environmental-data service client
pub struct EarthDataClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl EarthDataClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, EarthDataError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| EarthDataError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
            api_key,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<T, EarthDataError> {
        let url = format!("{}{}", self.base_url, path);

        tracing::debug!(url = %url, latitude, longitude, "Querying environmental-data service");

        let mut request = self.http_client.get(&url).query(&[
            ("lat", latitude.to_string()),
            ("lon", longitude.to_string()),
        ]);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EarthDataError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EarthDataError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| EarthDataError::ParseError(e.to_string()))
    }

    /// Land cover composition around the coordinate
    pub async fn land_cover(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<LandCoverSummary, EarthDataError> {
        let response: LandCoverResponse =
            self.get_json("/v1/landcover", latitude, longitude).await?;
        Ok(summarize_land_cover(response))
    }

    /// Historical fire activity at the coordinate
    pub async fn fire_history(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<FireHistory, EarthDataError> {
        let response: FireHistoryResponse = self.get_json("/v1/fires", latitude, longitude).await?;
        Ok(FireHistory {
            has_fire: response.has_fire,
            last_fire_date: response.last_fire_date,
            total_fires_in_period: response.total_fires_in_period,
            fires_per_year: response.fires_per_year,
        })
    }

    /// Current surface conditions and vegetation indices
    pub async fn current_conditions(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<CurrentConditions, EarthDataError> {
        let response: ConditionsResponse =
            self.get_json("/v1/conditions", latitude, longitude).await?;
        Ok(CurrentConditions {
            surface_temperature_k: response.surface_temperature_k,
            soil_moisture_kg_m2: response.soil_moisture_kg_m2,
            soil_temperature_k: response.soil_temperature_k,
            wind_speed_m_s: response.wind_speed_m_s,
            ndvi: response.ndvi,
            evi: response.evi,
            water_coverage_percent: response.water_coverage_percent,
            nearby_water_coverage_percent: response.nearby_water_coverage_percent,
        })
    }

    /// Wildfire scoring inputs
    pub async fn wildfire_factors(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WildfireInputs, EarthDataError> {
        let response: WildfireFactorsResponse = self
            .get_json("/v1/wildfire-factors", latitude, longitude)
            .await?;
        Ok(response.into())
    }

    /// Assemble the location card, tolerating per-section failures
    ///
    /// Sections are fetched concurrently. A failed section logs a warning
    /// and is left out; `None` is returned only when every section failed.
    pub async fn location_data(&self, latitude: f64, longitude: f64) -> Option<LocationData> {
        let (land_cover, fire_history, current_conditions) = tokio::join!(
            self.land_cover(latitude, longitude),
            self.fire_history(latitude, longitude),
            self.current_conditions(latitude, longitude),
        );

        let data = LocationData {
            land_cover: land_cover
                .map_err(|e| tracing::warn!(error = %e, "Land cover lookup failed"))
                .ok(),
            fire_history: fire_history
                .map_err(|e| tracing::warn!(error = %e, "Fire history lookup failed"))
                .ok(),
            current_conditions: current_conditions
                .map_err(|e| tracing::warn!(error = %e, "Conditions lookup failed"))
                .ok(),
        };

        if data.is_empty() {
            None
        } else {
            Some(data)
        }
    }
}

/// Attach labels and sort classes by share, largest first
fn summarize_land_cover(response: LandCoverResponse) -> LandCoverSummary {
    let mut classes: Vec<LandCoverClass> = response
        .classes
        .into_iter()
        .map(|entry| LandCoverClass {
            code: entry.code,
            label: land_cover_label(entry.code).to_string(),
            percent: entry.percent,
        })
        .collect();
    classes.sort_by(|a, b| b.percent.total_cmp(&a.percent));
    LandCoverSummary { classes }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = EarthDataClient::new("https://earthdata.example.net", None);
        assert!(client.is_ok());
    }

    #[test]
    fn land_cover_summary_is_labeled_and_sorted() {
        let response: LandCoverResponse = serde_json::from_str(
            r#"{"classes": [
                {"code": 10, "percent": 12.5},
                {"code": 50, "percent": 80.0},
                {"code": 30, "percent": 7.5}
            ]}"#,
        )
        .unwrap();

        let summary = summarize_land_cover(response);
        assert_eq!(summary.classes[0].code, 50);
        assert_eq!(summary.classes[0].label, "Built-up");
        assert_eq!(summary.classes[2].code, 30);
    }

    #[test]
    fn wildfire_factors_parse_with_gaps() {
        let response: WildfireFactorsResponse = serde_json::from_str(
            r#"{
                "ndvi": 0.42,
                "temperature_c": {"current": 28.5, "historical": 24.0},
                "fire_count": 3
            }"#,
        )
        .unwrap();

        let inputs: WildfireInputs = response.into();
        assert_eq!(inputs.ndvi, Some(0.42));
        assert_eq!(inputs.temperature_c, Some((28.5, 24.0)));
        assert_eq!(inputs.fire_count, Some(3));
        assert!(inputs.precipitation_mm.is_none());
        assert!(inputs.elevation_m.is_none());
        assert!(inputs.has_any());
    }

    #[test]
    fn conditions_parse_from_sample() {
        let response: ConditionsResponse = serde_json::from_str(
            r#"{
                "surface_temperature_k": 295.2,
                "soil_moisture_kg_m2": 21.4,
                "wind_speed_m_s": 3.1,
                "ndvi": 0.55,
                "water_coverage_percent": 0.0,
                "nearby_water_coverage_percent": 4.2
            }"#,
        )
        .unwrap();

        assert_eq!(response.surface_temperature_k, Some(295.2));
        assert_eq!(response.soil_temperature_k, None);
        assert_eq!(response.evi, None);
        assert_eq!(response.nearby_water_coverage_percent, Some(4.2));
    }

    #[test]
    fn fire_history_parse_from_sample() {
        let response: FireHistoryResponse = serde_json::from_str(
            r#"{
                "has_fire": true,
                "last_fire_date": "2021-08-14",
                "total_fires_in_period": 6,
                "fires_per_year": 0.4
            }"#,
        )
        .unwrap();

        assert!(response.has_fire);
        assert_eq!(
            response.last_fire_date,
            chrono::NaiveDate::from_ymd_opt(2021, 8, 14)
        );
        assert_eq!(response.total_fires_in_period, 6);
    }
}

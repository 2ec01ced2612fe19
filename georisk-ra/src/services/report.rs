//! Risk report orchestration
//!
//! Drives one assessment end to end: geocode (when needed), gather wildfire
//! factors, compute the data-driven wildfire score, fetch the location card,
//! call the AI model, then merge and normalize the result.

use georisk_common::models::{RiskReport, RiskScoreMetadata};
use std::sync::Arc;

use crate::error::ApiError;
use crate::services::earthdata::EarthDataClient;
use crate::services::gemini::{GeminiClient, GeminiError};
use crate::services::geocoder::{GeocodeError, GeocoderClient};
use crate::services::wildfire::{self, WildfireAssessment};

/// Scores at or below this value are treated as 0-10 scale and rescaled
const MODEL_SCALE_MAX: f64 = 10.0;

/// Report orchestration service
pub struct ReportService {
    geocoder: Arc<GeocoderClient>,
    /// Absent when no environmental-data service is configured
    earthdata: Option<Arc<EarthDataClient>>,
    gemini: Arc<GeminiClient>,
}

impl ReportService {
    pub fn new(
        geocoder: Arc<GeocoderClient>,
        earthdata: Option<Arc<EarthDataClient>>,
        gemini: Arc<GeminiClient>,
    ) -> Self {
        Self {
            geocoder,
            earthdata,
            gemini,
        }
    }

    /// Produce a complete risk report for an address
    ///
    /// `coordinates` short-circuits geocoding when the client already knows
    /// them (e.g. from autocomplete selection).
    pub async fn assess(
        &self,
        address: &str,
        coordinates: Option<(f64, f64)>,
    ) -> Result<RiskReport, ApiError> {
        let (latitude, longitude) = match coordinates {
            Some((latitude, longitude)) => {
                tracing::info!(address = %address, latitude, longitude, "Using provided coordinates");
                (latitude, longitude)
            }
            None => {
                tracing::info!(address = %address, "Coordinates not provided, geocoding address");
                let place = self.geocoder.geocode(address).await.map_err(map_geocode_error)?;
                (place.latitude, place.longitude)
            }
        };

        let wildfire = self.data_driven_wildfire(latitude, longitude).await;

        let location_data = match &self.earthdata {
            Some(client) => client.location_data(latitude, longitude).await,
            None => None,
        };

        let mut report = self
            .gemini
            .generate_report(address, latitude, longitude, wildfire.as_ref())
            .await
            .map_err(map_gemini_error)?;

        if let Some(assessment) = &wildfire {
            apply_wildfire_override(&mut report, assessment);
        }

        normalize_scores(&mut report);
        if location_data.is_some() {
            report.location_data = location_data;
        }

        Ok(report)
    }

    /// Compute the satellite-data wildfire assessment, if inputs are available
    ///
    /// Any failure here degrades to the AI-generated wildfire score.
    async fn data_driven_wildfire(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Option<WildfireAssessment> {
        let client = self.earthdata.as_ref()?;

        match client.wildfire_factors(latitude, longitude).await {
            Ok(inputs) if inputs.has_any() => {
                let assessment = wildfire::assess(&inputs);
                tracing::info!(
                    latitude,
                    longitude,
                    score = assessment.score,
                    "Data-driven wildfire risk calculated"
                );
                Some(assessment)
            }
            Ok(_) => {
                tracing::warn!(latitude, longitude, "No wildfire factors available, falling back to AI score");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Wildfire factor lookup failed, falling back to AI score");
                None
            }
        }
    }
}

fn map_geocode_error(error: GeocodeError) -> ApiError {
    match error {
        GeocodeError::AddressNotFound(_) => {
            ApiError::NotFound("Could not find location for that address.".to_string())
        }
        GeocodeError::Unavailable(details) => {
            ApiError::ServiceUnavailable(format!("Geocoding service is unavailable: {}", details))
        }
        other => ApiError::Internal(format!("Geocoding failed: {}", other)),
    }
}

fn map_gemini_error(error: GeminiError) -> ApiError {
    match error {
        GeminiError::MalformedReport { details } => {
            ApiError::Internal(format!("AI model returned non-JSON output: {}", details))
        }
        other => ApiError::Internal(format!("AI model failed to generate report: {}", other)),
    }
}

/// Replace the model's wildfire entry with the data-driven assessment
///
/// The score stays on the 0-10 scale here; `normalize_scores` rescales it
/// with the rest of the report.
pub(crate) fn apply_wildfire_override(report: &mut RiskReport, assessment: &WildfireAssessment) {
    for risk_score in &mut report.risk_scores {
        if risk_score.risk_type.eq_ignore_ascii_case("wildfire") {
            tracing::info!(
                ai_score = risk_score.score,
                data_score = assessment.score,
                "Replacing AI wildfire score with data-driven score"
            );
            risk_score.score = assessment.score;
            risk_score.explanation = format!(
                "{} (satellite data-driven assessment)",
                assessment.explanation
            );
            risk_score.metadata = Some(RiskScoreMetadata {
                earth_observation: true,
                data_sources: assessment.data_sources.clone(),
            });
            break;
        }
    }
}

/// Rescale 0-10 model scores to the 0-100 scale the UI renders, then clamp
pub(crate) fn normalize_scores(report: &mut RiskReport) {
    for risk_score in &mut report.risk_scores {
        if risk_score.score <= MODEL_SCALE_MAX {
            risk_score.score = (risk_score.score * 10.0 * 10.0).round() / 10.0;
        }
        risk_score.score = risk_score.score.clamp(0.0, 100.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use georisk_common::models::{AutomatedDecision, Location, RiskScore, WildfireDataSources};

    fn sample_report() -> RiskReport {
        RiskReport {
            location: Location {
                address: "Santa Rosa, CA".to_string(),
                latitude: 38.44,
                longitude: -122.71,
            },
            risk_scores: vec![
                RiskScore {
                    risk_type: "Flood".to_string(),
                    score: 3.0,
                    explanation: "Limited floodplain exposure.".to_string(),
                    metadata: None,
                },
                RiskScore {
                    risk_type: "Wildfire".to_string(),
                    score: 5.0,
                    explanation: "Regionally elevated fire weather.".to_string(),
                    metadata: None,
                },
            ],
            overall_summary: "Wildfire is the leading hazard.".to_string(),
            automated_decision: AutomatedDecision::FlagForReview,
            location_data: None,
        }
    }

    fn sample_assessment() -> WildfireAssessment {
        WildfireAssessment {
            score: 8.2,
            explanation: "8 historical fires indicate high risk".to_string(),
            data_sources: WildfireDataSources {
                historical_fires: true,
                ..Default::default()
            },
        }
    }

    #[test]
    fn override_replaces_wildfire_entry() {
        let mut report = sample_report();
        apply_wildfire_override(&mut report, &sample_assessment());

        let wildfire = &report.risk_scores[1];
        assert_eq!(wildfire.score, 8.2);
        assert!(wildfire.explanation.contains("satellite data-driven assessment"));
        let metadata = wildfire.metadata.as_ref().unwrap();
        assert!(metadata.earth_observation);
        assert!(metadata.data_sources.historical_fires);

        // Other hazards untouched
        assert_eq!(report.risk_scores[0].score, 3.0);
        assert!(report.risk_scores[0].metadata.is_none());
    }

    #[test]
    fn override_matches_case_insensitively() {
        let mut report = sample_report();
        report.risk_scores[1].risk_type = "WILDFIRE".to_string();
        apply_wildfire_override(&mut report, &sample_assessment());
        assert_eq!(report.risk_scores[1].score, 8.2);
    }

    #[test]
    fn override_without_wildfire_row_is_a_no_op() {
        let mut report = sample_report();
        report.risk_scores.remove(1);
        apply_wildfire_override(&mut report, &sample_assessment());
        assert_eq!(report.risk_scores.len(), 1);
        assert_eq!(report.risk_scores[0].score, 3.0);
    }

    #[test]
    fn normalize_rescales_model_scale_scores() {
        let mut report = sample_report();
        report.risk_scores[0].score = 7.25;
        report.risk_scores[1].score = 10.0;
        normalize_scores(&mut report);
        assert_eq!(report.risk_scores[0].score, 72.5);
        assert_eq!(report.risk_scores[1].score, 100.0);
    }

    #[test]
    fn normalize_leaves_already_scaled_scores() {
        let mut report = sample_report();
        report.risk_scores[0].score = 85.0;
        normalize_scores(&mut report);
        assert_eq!(report.risk_scores[0].score, 85.0);
    }

    #[test]
    fn normalize_clamps_out_of_range_scores() {
        let mut report = sample_report();
        report.risk_scores[0].score = 140.0;
        report.risk_scores[1].score = -2.0;
        normalize_scores(&mut report);
        assert_eq!(report.risk_scores[0].score, 100.0);
        assert_eq!(report.risk_scores[1].score, 0.0);
    }

    #[test]
    fn overridden_score_is_rescaled_with_the_rest() {
        let mut report = sample_report();
        apply_wildfire_override(&mut report, &sample_assessment());
        normalize_scores(&mut report);
        assert_eq!(report.risk_scores[1].score, 82.0);
    }

    #[test]
    fn geocode_error_mapping() {
        let not_found = map_geocode_error(GeocodeError::AddressNotFound("x".to_string()));
        assert!(matches!(not_found, ApiError::NotFound(_)));

        let unavailable = map_geocode_error(GeocodeError::Unavailable("timeout".to_string()));
        assert!(matches!(unavailable, ApiError::ServiceUnavailable(_)));

        let parse = map_geocode_error(GeocodeError::Parse("bad".to_string()));
        assert!(matches!(parse, ApiError::Internal(_)));
    }
}

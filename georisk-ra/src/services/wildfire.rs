//! Data-driven wildfire risk scoring
//!
//! Combines satellite-derived factors into a 0-10 wildfire score using
//! weighted components:
//!
//! - Historical fire frequency: 30%
//! - Current vegetation/fuel load (NDVI): 25%
//! - Temperature anomaly: 20%
//! - Precipitation deficit: 15%
//! - Elevation/terrain: 10%
//!
//! A factor that could not be retrieved contributes a neutral 5.0 so the
//! remaining observations still shape the score.

use georisk_common::models::WildfireDataSources;

const WEIGHT_FIRE_FREQUENCY: f64 = 0.30;
const WEIGHT_VEGETATION: f64 = 0.25;
const WEIGHT_TEMPERATURE: f64 = 0.20;
const WEIGHT_PRECIPITATION: f64 = 0.15;
const WEIGHT_ELEVATION: f64 = 0.10;

/// Neutral component score when a factor is unavailable
const NEUTRAL_SCORE: f64 = 5.0;

/// Scoring inputs gathered from the environmental-data service
///
/// Paired values are (current, historical average).
#[derive(Debug, Clone, Default)]
pub struct WildfireInputs {
    /// Vegetation index, 0-1
    pub ndvi: Option<f64>,
    /// Land surface temperature in Celsius
    pub temperature_c: Option<(f64, f64)>,
    /// Accumulated precipitation in millimeters
    pub precipitation_mm: Option<(f64, f64)>,
    /// Detected fire events over the observation period
    pub fire_count: Option<u32>,
    /// Terrain elevation in meters
    pub elevation_m: Option<f64>,
}

impl WildfireInputs {
    /// True when at least one factor was retrieved
    pub fn has_any(&self) -> bool {
        self.ndvi.is_some()
            || self.temperature_c.is_some()
            || self.precipitation_mm.is_some()
            || self.fire_count.is_some()
            || self.elevation_m.is_some()
    }
}

/// Result of the weighted scoring
#[derive(Debug, Clone)]
pub struct WildfireAssessment {
    /// Wildfire risk on the 0-10 scale, rounded to one decimal
    pub score: f64,
    /// Assembled from the three leading factor explanations
    pub explanation: String,
    pub data_sources: WildfireDataSources,
}

/// Compute the weighted wildfire risk score
pub fn assess(inputs: &WildfireInputs) -> WildfireAssessment {
    let mut components: Vec<(f64, f64)> = Vec::with_capacity(5);
    let mut explanations: Vec<String> = Vec::with_capacity(5);

    // 1. Historical fire frequency (30%)
    match inputs.fire_count {
        Some(count) => {
            let (score, explanation) = fire_frequency_score(count);
            components.push((score, WEIGHT_FIRE_FREQUENCY));
            explanations.push(explanation);
        }
        None => {
            components.push((NEUTRAL_SCORE, WEIGHT_FIRE_FREQUENCY));
            explanations.push("Historical fire data unavailable".to_string());
        }
    }

    // 2. Vegetation/fuel load - NDVI (25%)
    match inputs.ndvi {
        Some(ndvi) => {
            let (score, explanation) = vegetation_score(ndvi);
            components.push((score, WEIGHT_VEGETATION));
            explanations.push(explanation);
        }
        None => {
            components.push((NEUTRAL_SCORE, WEIGHT_VEGETATION));
            explanations.push("Vegetation data unavailable".to_string());
        }
    }

    // 3. Temperature anomaly (20%)
    match inputs.temperature_c {
        Some((current, historical)) => {
            let (score, explanation) = temperature_score(current - historical);
            components.push((score, WEIGHT_TEMPERATURE));
            explanations.push(explanation);
        }
        None => {
            components.push((NEUTRAL_SCORE, WEIGHT_TEMPERATURE));
            explanations.push("Temperature data unavailable".to_string());
        }
    }

    // 4. Precipitation deficit (15%)
    match inputs.precipitation_mm {
        Some((current, historical)) => {
            let (score, explanation) = precipitation_score(current, historical);
            components.push((score, WEIGHT_PRECIPITATION));
            explanations.push(explanation);
        }
        None => {
            components.push((NEUTRAL_SCORE, WEIGHT_PRECIPITATION));
            explanations.push("Precipitation data unavailable".to_string());
        }
    }

    // 5. Elevation/terrain (10%)
    match inputs.elevation_m {
        Some(elevation) => {
            let (score, explanation) = elevation_score(elevation);
            components.push((score, WEIGHT_ELEVATION));
            explanations.push(explanation);
        }
        None => {
            components.push((NEUTRAL_SCORE, WEIGHT_ELEVATION));
            explanations.push("Elevation data unavailable".to_string());
        }
    }

    let total: f64 = components.iter().map(|(score, weight)| score * weight).sum();

    // Top 3 factors carry the narrative
    let mut explanation = explanations[..3].join(". ");
    explanation.push('.');

    WildfireAssessment {
        score: round1(total),
        explanation,
        data_sources: WildfireDataSources {
            ndvi: inputs.ndvi.is_some(),
            temperature: inputs.temperature_c.is_some(),
            precipitation: inputs.precipitation_mm.is_some(),
            historical_fires: inputs.fire_count.is_some(),
            elevation: inputs.elevation_m.is_some(),
        },
    }
}

/// 0 fires = 0, 1-2 fires = 2-4, 3-5 fires = 5-7, 6+ fires = 8-10
fn fire_frequency_score(count: u32) -> (f64, String) {
    match count {
        0 => (0.0, "No historical fires in the region".to_string()),
        1..=2 => (
            2.0 + (count as f64 - 1.0) * 2.0,
            format!("{} historical fire(s) detected", count),
        ),
        3..=5 => (
            5.0 + (count as f64 - 3.0),
            format!("{} historical fires indicate moderate risk", count),
        ),
        _ => (
            (8.0 + (count as f64 - 6.0) * 0.5).min(10.0),
            format!("{} historical fires indicate high risk", count),
        ),
    }
}

/// Higher NDVI = more vegetation = more fuel = higher risk
///
/// NDVI 0-0.3 (sparse) = 0-3, 0.3-0.6 (moderate) = 3-7, 0.6+ (dense) = 7-10
fn vegetation_score(ndvi: f64) -> (f64, String) {
    if ndvi < 0.3 {
        (ndvi / 0.3 * 3.0, "Low vegetation density".to_string())
    } else if ndvi < 0.6 {
        (
            3.0 + ((ndvi - 0.3) / 0.3) * 4.0,
            "Moderate vegetation density".to_string(),
        )
    } else {
        (
            7.0 + (((ndvi - 0.6) / 0.4) * 3.0).min(3.0),
            "High vegetation density (high fuel load)".to_string(),
        )
    }
}

/// Positive anomaly = higher risk: -5C or less = 0, 0C = 5, +5C or more = 10
fn temperature_score(anomaly_c: f64) -> (f64, String) {
    let score = (5.0 + anomaly_c).clamp(0.0, 10.0);
    let explanation = if anomaly_c > 5.0 {
        format!("Temperature {:.1}\u{b0}C above average (high risk)", anomaly_c)
    } else if anomaly_c >= 0.0 {
        format!("Temperature {:.1}\u{b0}C above average", anomaly_c)
    } else {
        format!("Temperature {:.1}\u{b0}C below average", anomaly_c.abs())
    };
    (score, explanation)
}

/// Higher deficit = higher risk: 0% deficit = 0, 50% = 7.5, 100%+ = 10
fn precipitation_score(current_mm: f64, historical_mm: f64) -> (f64, String) {
    let deficit_pct = if historical_mm > 0.0 {
        (historical_mm - current_mm) / historical_mm * 100.0
    } else {
        0.0
    };

    if deficit_pct <= 0.0 {
        (0.0, "Precipitation at or above average".to_string())
    } else if deficit_pct <= 50.0 {
        (
            deficit_pct / 50.0 * 7.5,
            format!("{:.0}% precipitation deficit", deficit_pct),
        )
    } else {
        (
            7.5 + (((deficit_pct - 50.0) / 50.0) * 2.5).min(2.5),
            format!("{:.0}% precipitation deficit (severe drought)", deficit_pct),
        )
    }
}

/// Very low elevation (<100m) = 2, moderate (100-500m) = 2-8, high (>500m) = 8-10
fn elevation_score(elevation_m: f64) -> (f64, String) {
    if elevation_m < 100.0 {
        (2.0, "Low elevation".to_string())
    } else if elevation_m < 500.0 {
        (
            2.0 + ((elevation_m - 100.0) / 400.0) * 6.0,
            format!("Moderate elevation ({:.0}m)", elevation_m),
        )
    } else {
        (
            8.0 + (((elevation_m - 500.0) / 1000.0) * 2.0).min(2.0),
            format!("High elevation ({:.0}m, complex terrain)", elevation_m),
        )
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_data_yields_neutral_score() {
        let assessment = assess(&WildfireInputs::default());
        assert_eq!(assessment.score, 5.0);
        assert!(assessment.explanation.contains("unavailable"));
        assert!(!assessment.data_sources.ndvi);
        assert!(!assessment.data_sources.historical_fires);
    }

    #[test]
    fn fire_frequency_table() {
        assert_eq!(fire_frequency_score(0).0, 0.0);
        assert_eq!(fire_frequency_score(1).0, 2.0);
        assert_eq!(fire_frequency_score(2).0, 4.0);
        assert_eq!(fire_frequency_score(3).0, 5.0);
        assert_eq!(fire_frequency_score(5).0, 7.0);
        assert_eq!(fire_frequency_score(6).0, 8.0);
        // Capped at 10
        assert_eq!(fire_frequency_score(100).0, 10.0);
    }

    #[test]
    fn vegetation_bands() {
        assert!((vegetation_score(0.15).0 - 1.5).abs() < 1e-9);
        assert!((vegetation_score(0.45).0 - 5.0).abs() < 1e-9);
        assert!((vegetation_score(0.8).0 - 8.5).abs() < 1e-9);
        // Dense canopy caps at 10
        assert_eq!(vegetation_score(1.0).0, 10.0);
    }

    #[test]
    fn temperature_anomaly_is_monotonic() {
        assert_eq!(temperature_score(-8.0).0, 0.0);
        assert_eq!(temperature_score(-2.5).0, 2.5);
        assert_eq!(temperature_score(0.0).0, 5.0);
        assert_eq!(temperature_score(2.5).0, 7.5);
        assert_eq!(temperature_score(9.0).0, 10.0);
    }

    #[test]
    fn precipitation_deficit_bands() {
        assert_eq!(precipitation_score(120.0, 100.0).0, 0.0);
        assert!((precipitation_score(75.0, 100.0).0 - 3.75).abs() < 1e-9);
        assert!((precipitation_score(0.0, 100.0).0 - 10.0).abs() < 1e-9);
        // No historical baseline means no deficit signal
        assert_eq!(precipitation_score(0.0, 0.0).0, 0.0);
    }

    #[test]
    fn elevation_bands() {
        assert_eq!(elevation_score(50.0).0, 2.0);
        assert!((elevation_score(300.0).0 - 5.0).abs() < 1e-9);
        assert_eq!(elevation_score(500.0).0, 8.0);
        assert_eq!(elevation_score(2000.0).0, 10.0);
    }

    #[test]
    fn fire_prone_location_scores_high() {
        // Dense fuel, hot and dry, repeated fires: a chaparral hillside
        let inputs = WildfireInputs {
            ndvi: Some(0.7),
            temperature_c: Some((32.0, 27.0)),
            precipitation_mm: Some((20.0, 120.0)),
            fire_count: Some(8),
            elevation_m: Some(600.0),
        };
        let assessment = assess(&inputs);
        assert!(assessment.score >= 8.0, "score was {}", assessment.score);
        assert!(assessment.data_sources.ndvi);
        assert!(assessment.data_sources.historical_fires);
        assert!(assessment.explanation.contains("historical fires"));
    }

    #[test]
    fn wet_lowland_scores_low() {
        let inputs = WildfireInputs {
            ndvi: Some(0.2),
            temperature_c: Some((10.0, 12.0)),
            precipitation_mm: Some((200.0, 150.0)),
            fire_count: Some(0),
            elevation_m: Some(20.0),
        };
        let assessment = assess(&inputs);
        assert!(assessment.score <= 2.0, "score was {}", assessment.score);
        assert!(assessment.explanation.starts_with("No historical fires"));
    }

    #[test]
    fn partial_inputs_use_neutral_fill() {
        let inputs = WildfireInputs {
            fire_count: Some(0),
            ..Default::default()
        };
        let assessment = assess(&inputs);
        // 0*0.30 + 5*(0.25+0.20+0.15+0.10) = 3.5
        assert_eq!(assessment.score, 3.5);
        assert!(assessment.data_sources.historical_fires);
        assert!(!assessment.data_sources.elevation);
    }

    #[test]
    fn score_is_rounded_to_one_decimal() {
        let inputs = WildfireInputs {
            ndvi: Some(0.333),
            ..Default::default()
        };
        let assessment = assess(&inputs);
        assert_eq!(assessment.score, (assessment.score * 10.0).round() / 10.0);
    }

    #[test]
    fn explanation_uses_top_three_factors() {
        let inputs = WildfireInputs {
            ndvi: Some(0.7),
            temperature_c: Some((30.0, 25.0)),
            precipitation_mm: Some((10.0, 100.0)),
            fire_count: Some(4),
            elevation_m: Some(800.0),
        };
        let assessment = assess(&inputs);
        // Fire, vegetation, temperature lead; precipitation and elevation are dropped
        assert!(assessment.explanation.contains("moderate risk"));
        assert!(assessment.explanation.contains("vegetation density"));
        assert!(!assessment.explanation.contains("elevation"));
    }
}

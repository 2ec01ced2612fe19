//! Risk report wire types
//!
//! The JSON contract shared by the Risk Assessor service and the web UI.
//! These records pass through the service largely unchanged: the AI model
//! produces the report skeleton, the service normalizes scores and attaches
//! observational data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A geocoded property location
///
/// Accepts `lat`/`lon` as input aliases (the AI model occasionally emits
/// the short keys) but always serializes the long form the UI expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Property address as submitted by the underwriter
    pub address: String,
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lon", alias = "lng")]
    pub longitude: f64,
}

/// A single hazard score within a risk report
///
/// `risk_type` stays a free string: the model is prompted for the four
/// standard hazards but extra rows must survive the round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskScore {
    pub risk_type: String,
    /// Hazard severity. 0-10 from the model, rescaled to 0-100 for the UI.
    pub score: f64,
    /// One-sentence rationale for the score
    pub explanation: String,
    /// Present only when the score was replaced by a data-driven assessment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RiskScoreMetadata>,
}

/// Provenance attached to a data-driven hazard score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskScoreMetadata {
    /// True when the score came from satellite observation rather than the model
    pub earth_observation: bool,
    /// Which observational inputs were actually available
    pub data_sources: WildfireDataSources,
}

/// Availability flags for the wildfire scoring inputs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WildfireDataSources {
    pub ndvi: bool,
    pub temperature: bool,
    pub precipitation: bool,
    pub historical_fires: bool,
    pub elevation: bool,
}

/// Underwriting recommendation produced by the AI service
///
/// Categorical by contract; aliases cover the wording variations the model
/// has been observed to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutomatedDecision {
    #[serde(rename = "APPROVE", alias = "APPROVED")]
    Approve,
    #[serde(rename = "DENY", alias = "DENIED", alias = "REJECT")]
    Deny,
    #[serde(
        rename = "FLAG FOR REVIEW",
        alias = "FLAG_FOR_REVIEW",
        alias = "REVIEW"
    )]
    FlagForReview,
}

/// The complete risk report returned to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    pub location: Location,
    pub risk_scores: Vec<RiskScore>,
    /// Two-sentence narrative summary of the key risks
    pub overall_summary: String,
    pub automated_decision: AutomatedDecision,
    /// Observational card data; omitted when the data service was unreachable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_data: Option<LocationData>,
}

/// Satellite-derived observational data for the location card
///
/// Each section is fetched independently and may be missing on its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub land_cover: Option<LandCoverSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fire_history: Option<FireHistory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_conditions: Option<CurrentConditions>,
}

impl LocationData {
    /// True when no section was retrieved
    pub fn is_empty(&self) -> bool {
        self.land_cover.is_none() && self.fire_history.is_none() && self.current_conditions.is_none()
    }
}

/// Land cover composition around the property (ESA WorldCover classes)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandCoverSummary {
    pub classes: Vec<LandCoverClass>,
}

/// One land cover class with its share of the sampled area
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandCoverClass {
    /// WorldCover class code (10, 20, ... 100)
    pub code: u16,
    pub label: String,
    pub percent: f64,
}

/// Historical fire activity at the location (FIRMS-derived)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FireHistory {
    /// Whether the containing pixel ever burned in the observation period
    pub has_fire: bool,
    /// Date of the most recent detected fire
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fire_date: Option<NaiveDate>,
    pub total_fires_in_period: u32,
    pub fires_per_year: f64,
}

/// Current surface conditions and vegetation indices
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrentConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_temperature_k: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_moisture_kg_m2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_temperature_k: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed_m_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ndvi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_coverage_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearby_water_coverage_percent: Option<f64>,
}

/// Human-readable label for an ESA WorldCover class code
pub fn land_cover_label(code: u16) -> &'static str {
    match code {
        10 => "Tree cover",
        20 => "Shrubland",
        30 => "Grassland",
        40 => "Cropland",
        50 => "Built-up",
        60 => "Bare / sparse vegetation",
        70 => "Snow and ice",
        80 => "Permanent water bodies",
        90 => "Herbaceous wetland",
        95 => "Mangroves",
        100 => "Moss and lichen",
        _ => "Unknown",
    }
}

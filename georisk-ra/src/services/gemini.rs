//! Gemini generative-AI client
//!
//! Calls the `generateContent` REST endpoint with a master prompt that casts
//! the model as an expert underwriting analyst and constrains it to a JSON
//! risk report. The response is forced to `application/json`, but model
//! output is still treated as untrusted text: parsing falls back to
//! extracting the outermost JSON object before giving up.

use georisk_common::models::RiskReport;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::services::wildfire::WildfireAssessment;

const REQUEST_TIMEOUT_SECS: u64 = 60;

/// How much raw model output to keep in error details
const ERROR_SAMPLE_CHARS: usize = 500;

/// Gemini client errors
#[derive(Debug, Error)]
pub enum GeminiError {
    /// Network failure or timeout
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Gemini API returned an error response
    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    /// Response contained no candidate text
    #[error("AI model returned no content")]
    EmptyResponse,

    /// Candidate text was not a parseable risk report
    #[error("AI model returned non-JSON output: {details}")]
    MalformedReport { details: String },
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Gemini API client
pub struct GeminiClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, GeminiError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| GeminiError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Generate a risk report for the location
    ///
    /// When a data-driven wildfire assessment is supplied, the prompt
    /// instructs the model to reuse that exact wildfire score.
    pub async fn generate_report(
        &self,
        address: &str,
        latitude: f64,
        longitude: f64,
        wildfire: Option<&WildfireAssessment>,
    ) -> Result<RiskReport, GeminiError> {
        let prompt = build_prompt(address, latitude, longitude, wildfire);

        tracing::info!(address = %address, model = %self.model, "Requesting risk report from Gemini");
        tracing::debug!(prompt_chars = prompt.len(), "Prompt assembled");

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GeminiError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GeminiError::ApiError(status.as_u16(), error_text));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::MalformedReport {
                details: e.to_string(),
            })?;

        let text = candidate_text(&body).ok_or(GeminiError::EmptyResponse)?;
        let report = extract_report(&text)?;

        tracing::info!(
            address = %address,
            hazards = report.risk_scores.len(),
            decision = ?report.automated_decision,
            "Received valid risk report from Gemini"
        );

        Ok(report)
    }
}

/// Concatenate the text parts of the first candidate
fn candidate_text(response: &GenerateContentResponse) -> Option<String> {
    let content = response.candidates.first()?.content.as_ref()?;
    let text: String = content
        .parts
        .iter()
        .filter_map(|part| part.text.as_deref())
        .collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Parse the model output into a report
///
/// Tries a direct parse first, then salvages the substring between the
/// first `{` and the last `}` (models occasionally wrap the JSON in prose
/// or code fences despite the response MIME type).
fn extract_report(text: &str) -> Result<RiskReport, GeminiError> {
    if let Ok(report) = serde_json::from_str::<RiskReport>(text) {
        return Ok(report);
    }

    let start = text.find('{');
    let end = text.rfind('}');
    if let (Some(start), Some(end)) = (start, end) {
        if end > start {
            if let Ok(report) = serde_json::from_str::<RiskReport>(&text[start..=end]) {
                return Ok(report);
            }
        }
    }

    tracing::error!(sample = %truncate(text, ERROR_SAMPLE_CHARS), "Failed to parse model output");
    Err(GeminiError::MalformedReport {
        details: truncate(text, ERROR_SAMPLE_CHARS),
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Assemble the master prompt
fn build_prompt(
    address: &str,
    latitude: f64,
    longitude: f64,
    wildfire: Option<&WildfireAssessment>,
) -> String {
    let wildfire_context = wildfire
        .map(|assessment| {
            let sources: Vec<&str> = [
                ("NDVI", assessment.data_sources.ndvi),
                ("temperature", assessment.data_sources.temperature),
                ("precipitation", assessment.data_sources.precipitation),
                ("historical fires", assessment.data_sources.historical_fires),
                ("elevation", assessment.data_sources.elevation),
            ]
            .into_iter()
            .filter(|(_, available)| *available)
            .map(|(name, _)| name)
            .collect();

            format!(
                "\n\
                IMPORTANT: Use the following satellite data-driven wildfire risk assessment:\n\
                - Wildfire Risk Score: {score}/10\n\
                - Explanation: {explanation}\n\
                - Data Sources Available: {sources}\n\
                \n\
                You MUST use this exact wildfire score ({score}) in your response, but you can \
                still provide your own explanation or enhance it with additional context.\n",
                score = assessment.score,
                explanation = assessment.explanation,
                sources = sources.join(", "),
            )
        })
        .unwrap_or_default();

    format!(
        "You are a professional geospatial risk model that analyzes risk for the insurance \
         industry. You have access to satellite imagery, Earth observation data, climate models, \
         historical disaster data, and regional climate patterns.\n\
         \n\
         Your task is to act as an expert insurance underwriter. Given a location, you must \
         generate a comprehensive, data-driven multi-factor risk report based on:\n\
         - Regional climate patterns and historical data\n\
         - Geographic location and terrain\n\
         - Known disaster history in the area\n\
         - Climate change projections\n\
         - Local environmental factors\n\
         \n\
         IMPORTANT SCORING GUIDELINES:\n\
         - Scores are on a scale of 0-10, where 0 = minimal risk and 10 = extreme risk\n\
         - Consider the region's actual climate patterns (e.g., Sahel region = high drought \
         risk, coastal areas = flood/storm risk)\n\
         - Use real-world knowledge: Nigeria and Sahel regions have HIGH drought risk (7-9), not low\n\
         - Tropical regions have higher storm/flood risks\n\
         - Arid/semi-arid regions have higher drought risk\n\
         - Fire-prone regions (Mediterranean, California, Australia) have higher wildfire risk\n\
         - Be realistic and data-driven, not conservative\n\
         \n\
         Please generate a risk report for this location:\n\
         Address: {address}\n\
         Latitude: {latitude}\n\
         Longitude: {longitude}\n\
         {wildfire_context}\n\
         Return a JSON object with this exact structure:\n\
         {{\n\
          \"location\": {{\n\
          \"address\": \"{address}\",\n\
          \"latitude\": {latitude},\n\
          \"longitude\": {longitude}\n\
          }},\n\
          \"risk_scores\": [\n\
          {{\"risk_type\": \"Flood\", \"score\": <number 0-10>, \"explanation\": \"<1-sentence \
         summary based on regional flood risk factors>\"}},\n\
          {{\"risk_type\": \"Wildfire\", \"score\": <number 0-10>, \"explanation\": \"<1-sentence \
         summary based on regional wildfire risk factors>\"}},\n\
          {{\"risk_type\": \"Storm\", \"score\": <number 0-10>, \"explanation\": \"<1-sentence \
         summary based on regional storm risk factors>\"}},\n\
          {{\"risk_type\": \"Drought\", \"score\": <number 0-10>, \"explanation\": \"<1-sentence \
         summary based on regional drought risk factors>\"}}\n\
          ],\n\
          \"overall_summary\": \"<A 2-sentence summary of the key risks for this property based \
         on regional climate patterns.>\",\n\
          \"automated_decision\": \"<'APPROVE', 'DENY', or 'FLAG FOR REVIEW' based on overall \
         risk level>\"\n\
         }}\n",
        address = address,
        latitude = latitude,
        longitude = longitude,
        wildfire_context = wildfire_context,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use georisk_common::models::WildfireDataSources;

    fn sample_report_json() -> &'static str {
        r#"{
            "location": {"address": "Valencia, Spain", "latitude": 39.47, "longitude": -0.38},
            "risk_scores": [
                {"risk_type": "Flood", "score": 7, "explanation": "Mediterranean flash flooding."},
                {"risk_type": "Wildfire", "score": 6, "explanation": "Dry summers with fuel buildup."},
                {"risk_type": "Storm", "score": 5, "explanation": "Occasional severe convective storms."},
                {"risk_type": "Drought", "score": 6, "explanation": "Recurrent Iberian drought cycles."}
            ],
            "overall_summary": "Flood and wildfire exposure dominate. Seasonal drought adds stress.",
            "automated_decision": "FLAG FOR REVIEW"
        }"#
    }

    #[test]
    fn prompt_contains_location_and_guidelines() {
        let prompt = build_prompt("Valencia, Spain", 39.47, -0.38, None);
        assert!(prompt.contains("Address: Valencia, Spain"));
        assert!(prompt.contains("Latitude: 39.47"));
        assert!(prompt.contains("scale of 0-10"));
        assert!(prompt.contains("\"risk_type\": \"Drought\""));
        assert!(!prompt.contains("MUST use this exact wildfire score"));
    }

    #[test]
    fn prompt_embeds_wildfire_assessment_when_present() {
        let assessment = WildfireAssessment {
            score: 8.2,
            explanation: "6 historical fires indicate high risk. High vegetation density (high fuel load). Temperature 3.0\u{b0}C above average.".to_string(),
            data_sources: WildfireDataSources {
                ndvi: true,
                temperature: true,
                precipitation: false,
                historical_fires: true,
                elevation: false,
            },
        };
        let prompt = build_prompt("Somewhere, CA", 38.5, -122.8, Some(&assessment));
        assert!(prompt.contains("Wildfire Risk Score: 8.2/10"));
        assert!(prompt.contains("MUST use this exact wildfire score (8.2)"));
        assert!(prompt.contains("NDVI, temperature, historical fires"));
    }

    #[test]
    fn extracts_direct_json() {
        let report = extract_report(sample_report_json()).unwrap();
        assert_eq!(report.risk_scores.len(), 4);
        assert_eq!(report.location.address, "Valencia, Spain");
    }

    #[test]
    fn salvages_json_wrapped_in_prose_and_fences() {
        let wrapped = format!(
            "Here is the requested report:\n```json\n{}\n```\nLet me know if you need anything else.",
            sample_report_json()
        );
        let report = extract_report(&wrapped).unwrap();
        assert_eq!(report.risk_scores[1].risk_type, "Wildfire");
    }

    #[test]
    fn unparseable_output_reports_a_sample() {
        let err = extract_report("The model refuses to answer in JSON today.").unwrap_err();
        match err {
            GeminiError::MalformedReport { details } => {
                assert!(details.contains("refuses"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn candidate_text_concatenates_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [
                    {"content": {"parts": [{"text": "{\"a\":"}, {"text": " 1}"}]}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(candidate_text(&response).as_deref(), Some("{\"a\": 1}"));
    }

    #[test]
    fn empty_candidates_yield_none() {
        let response: GenerateContentResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(candidate_text(&response).is_none());
    }
}

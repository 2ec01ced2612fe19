//! Risk report API handler
//!
//! `POST /api/get-risk-report` — the single product endpoint. Validation is
//! deliberately permissive about numeric types: browsers and spreadsheet
//! exports routinely send coordinates as strings.

use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    routing::post,
    Json, Router,
};
use georisk_common::models::RiskReport;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

/// POST /api/get-risk-report
///
/// Body: `{"address": "...", "latitude": <optional>, "longitude": <optional>}`.
/// When both coordinates are present, geocoding is skipped.
pub async fn get_risk_report(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<RiskReport>> {
    let request_id = Uuid::new_v4();

    let Json(body) = payload.map_err(|e| {
        ApiError::BadRequest(format!("Invalid JSON in request body: {}", e.body_text()))
    })?;

    let request = parse_request(&body)?;

    tracing::info!(
        %request_id,
        address = %request.address,
        has_coordinates = request.coordinates.is_some(),
        "Processing risk report request"
    );

    let result = state
        .reports
        .assess(&request.address, request.coordinates)
        .await;

    match result {
        Ok(report) => {
            tracing::info!(%request_id, "Risk report generated successfully");
            Ok(Json(report))
        }
        Err(error) => {
            tracing::error!(%request_id, error = %error, "Risk report request failed");
            state.record_error(error.to_string()).await;
            Err(error)
        }
    }
}

/// Validated request fields
#[derive(Debug)]
struct ParsedRequest {
    address: String,
    coordinates: Option<(f64, f64)>,
}

fn parse_request(body: &Value) -> Result<ParsedRequest, ApiError> {
    let object = body
        .as_object()
        .ok_or_else(|| ApiError::BadRequest("No data provided in request body.".to_string()))?;

    let address = object
        .get("address")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No address provided.".to_string()))?
        .to_string();

    // Coordinates are used only when both are present; otherwise geocode
    let coordinates = match (object.get("latitude"), object.get("longitude")) {
        (Some(latitude), Some(longitude)) => Some((
            parse_coordinate(latitude, "latitude")?,
            parse_coordinate(longitude, "longitude")?,
        )),
        _ => None,
    };

    if let Some((latitude, longitude)) = coordinates {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(ApiError::BadRequest(format!(
                "Coordinates out of range: ({}, {})",
                latitude, longitude
            )));
        }
    }

    Ok(ParsedRequest {
        address,
        coordinates,
    })
}

/// Accept a coordinate as a JSON number or numeric string
fn parse_coordinate(value: &Value, field: &str) -> Result<f64, ApiError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid coordinate values: {}", field)))
}

/// Build risk report routes
pub fn report_routes() -> Router<AppState> {
    Router::new().route("/api/get-risk-report", post(get_risk_report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_numeric_and_string_coordinates() {
        let request = parse_request(&json!({
            "address": "Marienplatz, Munich",
            "latitude": 48.1374,
            "longitude": "11.5761"
        }))
        .unwrap();
        assert_eq!(request.coordinates, Some((48.1374, 11.5761)));
    }

    #[test]
    fn missing_address_is_rejected() {
        let err = parse_request(&json!({"latitude": 1.0, "longitude": 2.0})).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.contains("address")));
    }

    #[test]
    fn blank_address_is_rejected() {
        let err = parse_request(&json!({"address": "   "})).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn single_coordinate_falls_back_to_geocoding() {
        let request = parse_request(&json!({
            "address": "Munich",
            "latitude": 48.1374
        }))
        .unwrap();
        assert!(request.coordinates.is_none());
    }

    #[test]
    fn non_numeric_coordinate_is_rejected() {
        let err = parse_request(&json!({
            "address": "Munich",
            "latitude": "north-ish",
            "longitude": 11.5
        }))
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.contains("latitude")));
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let err = parse_request(&json!({
            "address": "Nowhere",
            "latitude": 123.0,
            "longitude": 11.5
        }))
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.contains("out of range")));
    }

    #[test]
    fn non_object_body_is_rejected() {
        let err = parse_request(&json!("just a string")).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}

//! Web UI - underwriter landing page
//!
//! Single embedded page: address form, result cards, decision badge. The
//! page calls `POST /api/get-risk-report` and renders the returned JSON.
//! Build identification values are substituted at request time.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::AppState;

/// GET /
///
/// Underwriter landing page with the address form and report view
pub async fn root_page(State(state): State<AppState>) -> impl IntoResponse {
    let html = PAGE_HTML
        .replace("__VERSION__", env!("CARGO_PKG_VERSION"))
        .replace("__GIT_HASH__", env!("GIT_HASH"))
        .replace("__BUILD_TIMESTAMP__", env!("BUILD_TIMESTAMP"))
        .replace("__BUILD_PROFILE__", env!("BUILD_PROFILE"))
        .replace(
            "__MAP_API_KEY__",
            state.config.map_api_key.as_deref().unwrap_or(""),
        );

    Html(html)
}

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new().route("/", get(root_page))
}

const PAGE_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>GeoRisk Property Assessment</title>
    <style>
        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }
        body {
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            background-color: #1a1a1a;
            color: #e0e0e0;
            line-height: 1.6;
        }
        header {
            background-color: #2a2a2a;
            border-bottom: 1px solid #3a3a3a;
            padding: 20px;
            margin-bottom: 30px;
        }
        .header-content {
            display: flex;
            justify-content: space-between;
            align-items: center;
            max-width: 900px;
            margin: 0 auto;
        }
        .header-right {
            text-align: right;
            font-size: 13px;
            color: #888;
            font-family: 'Courier New', monospace;
            line-height: 1.3;
        }
        h1 {
            font-size: 26px;
            margin-bottom: 5px;
            color: #4a9eff;
        }
        .subtitle {
            color: #888;
            font-size: 16px;
        }
        .container {
            max-width: 900px;
            margin: 0 auto;
            padding: 0 20px 40px;
        }
        .search-card {
            background-color: #2a2a2a;
            border: 1px solid #3a3a3a;
            border-radius: 8px;
            padding: 20px;
            margin-bottom: 24px;
        }
        .search-row {
            display: flex;
            gap: 12px;
        }
        input[type="text"] {
            flex: 1;
            padding: 10px 14px;
            font-size: 16px;
            background-color: #1a1a1a;
            border: 1px solid #3a3a3a;
            border-radius: 6px;
            color: #e0e0e0;
        }
        input[type="text"]:focus {
            outline: none;
            border-color: #4a9eff;
        }
        button {
            padding: 10px 24px;
            font-size: 16px;
            font-weight: 600;
            background-color: #4a9eff;
            border: none;
            border-radius: 6px;
            color: #fff;
            cursor: pointer;
        }
        button:disabled {
            background-color: #3a3a3a;
            color: #888;
            cursor: wait;
        }
        .banner-error {
            display: none;
            background-color: #3a1f1f;
            border: 1px solid #b24a4a;
            color: #ff9e9e;
            border-radius: 6px;
            padding: 12px 16px;
            margin-bottom: 24px;
        }
        .loading {
            display: none;
            color: #888;
            margin-bottom: 24px;
        }
        #report {
            display: none;
        }
        .summary-card, .risk-card, .data-card {
            background-color: #2a2a2a;
            border: 1px solid #3a3a3a;
            border-radius: 8px;
            padding: 20px;
            margin-bottom: 16px;
        }
        .summary-head {
            display: flex;
            justify-content: space-between;
            align-items: center;
            gap: 12px;
            margin-bottom: 10px;
        }
        .badge {
            display: inline-block;
            padding: 4px 12px;
            border-radius: 12px;
            font-size: 13px;
            font-weight: 700;
            white-space: nowrap;
        }
        .badge-approve { background-color: #1f3a24; color: #7ddb8a; border: 1px solid #2f8a3f; }
        .badge-deny { background-color: #3a1f1f; color: #ff9e9e; border: 1px solid #b24a4a; }
        .badge-review { background-color: #3a331f; color: #ffd37a; border: 1px solid #b2924a; }
        .location-line { color: #888; font-size: 14px; }
        .risk-grid {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(260px, 1fr));
            gap: 16px;
        }
        .risk-title {
            display: flex;
            justify-content: space-between;
            font-weight: 600;
            margin-bottom: 8px;
        }
        .meter {
            height: 8px;
            background-color: #1a1a1a;
            border-radius: 4px;
            overflow: hidden;
            margin-bottom: 8px;
        }
        .meter-fill { height: 100%; border-radius: 4px; }
        .risk-explanation { color: #aaa; font-size: 14px; }
        .source-tag {
            display: inline-block;
            margin-top: 6px;
            font-size: 12px;
            color: #7fb8ff;
        }
        .data-card h3 { color: #4a9eff; margin-bottom: 10px; font-size: 16px; }
        .data-grid {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
            gap: 6px 20px;
            font-size: 14px;
        }
        .data-grid dt { color: #888; }
        .data-grid dd { margin-bottom: 6px; }
        .cover-row { display: flex; align-items: center; gap: 8px; font-size: 14px; margin-bottom: 4px; }
        .cover-bar { flex: 1; height: 6px; background-color: #1a1a1a; border-radius: 3px; overflow: hidden; }
        .cover-fill { height: 100%; background-color: #4a9eff; }
        .cover-label { width: 180px; color: #aaa; }
        .cover-pct { width: 52px; text-align: right; color: #888; }
    </style>
</head>
<body>
    <header>
        <div class="header-content">
            <div>
                <h1>GeoRisk</h1>
                <div class="subtitle">Environmental risk assessment for property underwriting</div>
            </div>
            <div class="header-right">
                <div>v__VERSION__ (__GIT_HASH__)</div>
                <div>__BUILD_TIMESTAMP__</div>
                <div>__BUILD_PROFILE__</div>
            </div>
        </div>
    </header>
    <div class="container">
        <div class="search-card">
            <form id="search-form">
                <div class="search-row">
                    <input type="text" id="address" list="address-suggestions"
                           placeholder="Property address, e.g. 1600 Amphitheatre Parkway, Mountain View"
                           autocomplete="off" required>
                    <datalist id="address-suggestions"></datalist>
                    <button type="submit" id="submit">Assess</button>
                </div>
            </form>
        </div>
        <div class="banner-error" id="error-banner"></div>
        <div class="loading" id="loading">Generating risk report&hellip; this can take a few seconds.</div>
        <div id="report">
            <div class="summary-card">
                <div class="summary-head">
                    <div id="report-address" style="font-weight: 600;"></div>
                    <span class="badge" id="decision-badge"></span>
                </div>
                <div class="location-line" id="report-coords"></div>
                <p id="report-summary" style="margin-top: 10px;"></p>
            </div>
            <div class="risk-grid" id="risk-grid"></div>
            <div class="data-card" id="location-data" style="display: none;"></div>
        </div>
    </div>
    <script>
        const MAP_API_KEY = "__MAP_API_KEY__";
        const form = document.getElementById("search-form");
        const addressInput = document.getElementById("address");
        const suggestions = document.getElementById("address-suggestions");
        const submitButton = document.getElementById("submit");
        const errorBanner = document.getElementById("error-banner");
        const loading = document.getElementById("loading");
        const reportView = document.getElementById("report");

        // Address autocomplete (only when a client-side map key is configured)
        let suggestTimer = null;
        addressInput.addEventListener("input", () => {
            if (!MAP_API_KEY || addressInput.value.length < 4) return;
            clearTimeout(suggestTimer);
            suggestTimer = setTimeout(async () => {
                try {
                    const url = "https://api.geoapify.com/v1/geocode/autocomplete?text="
                        + encodeURIComponent(addressInput.value) + "&limit=5&apiKey=" + MAP_API_KEY;
                    const response = await fetch(url);
                    if (!response.ok) return;
                    const data = await response.json();
                    suggestions.innerHTML = "";
                    for (const feature of (data.features || [])) {
                        const option = document.createElement("option");
                        option.value = feature.properties.formatted;
                        suggestions.appendChild(option);
                    }
                } catch (_) { /* autocomplete is best-effort */ }
            }, 250);
        });

        form.addEventListener("submit", async (event) => {
            event.preventDefault();
            errorBanner.style.display = "none";
            reportView.style.display = "none";
            loading.style.display = "block";
            submitButton.disabled = true;
            try {
                const response = await fetch("/api/get-risk-report", {
                    method: "POST",
                    headers: { "Content-Type": "application/json" },
                    body: JSON.stringify({ address: addressInput.value })
                });
                const data = await response.json();
                if (!response.ok) {
                    const message = data && data.error && data.error.message
                        ? data.error.message
                        : "Request failed (" + response.status + ")";
                    showError(message);
                    return;
                }
                renderReport(data);
            } catch (err) {
                showError("Could not reach the risk service: " + err.message);
            } finally {
                loading.style.display = "none";
                submitButton.disabled = false;
            }
        });

        function showError(message) {
            errorBanner.textContent = message;
            errorBanner.style.display = "block";
        }

        function meterColor(score) {
            if (score < 40) return "#2f8a3f";
            if (score < 70) return "#b2924a";
            return "#b24a4a";
        }

        function decisionClass(decision) {
            if (decision === "APPROVE") return "badge-approve";
            if (decision === "DENY") return "badge-deny";
            return "badge-review";
        }

        function renderReport(report) {
            document.getElementById("report-address").textContent = report.location.address;
            document.getElementById("report-coords").textContent =
                report.location.latitude.toFixed(4) + ", " + report.location.longitude.toFixed(4);
            document.getElementById("report-summary").textContent = report.overall_summary;

            const badge = document.getElementById("decision-badge");
            badge.textContent = report.automated_decision;
            badge.className = "badge " + decisionClass(report.automated_decision);

            const grid = document.getElementById("risk-grid");
            grid.innerHTML = "";
            for (const risk of report.risk_scores) {
                const card = document.createElement("div");
                card.className = "risk-card";
                const sourceTag = risk.metadata && risk.metadata.earth_observation
                    ? '<span class="source-tag">satellite data-driven</span>' : "";
                card.innerHTML =
                    '<div class="risk-title"><span>' + risk.risk_type + '</span><span>' +
                    risk.score.toFixed(1) + ' / 100</span></div>' +
                    '<div class="meter"><div class="meter-fill" style="width:' +
                    Math.min(100, risk.score) + '%; background-color:' + meterColor(risk.score) +
                    '"></div></div>' +
                    '<div class="risk-explanation">' + risk.explanation + '</div>' + sourceTag;
                grid.appendChild(card);
            }

            renderLocationData(report.location_data);
            reportView.style.display = "block";
        }

        function renderLocationData(data) {
            const card = document.getElementById("location-data");
            if (!data) {
                card.style.display = "none";
                return;
            }
            let html = "<h3>Location data</h3>";
            if (data.land_cover && data.land_cover.classes.length > 0) {
                html += "<h4 style='margin-bottom:6px;'>Land cover</h4>";
                for (const entry of data.land_cover.classes) {
                    html += '<div class="cover-row"><span class="cover-label">' + entry.label +
                        '</span><span class="cover-bar"><span class="cover-fill" style="width:' +
                        Math.min(100, entry.percent) + '%; display:block;"></span></span>' +
                        '<span class="cover-pct">' + entry.percent.toFixed(1) + '%</span></div>';
                }
            }
            html += '<dl class="data-grid" style="margin-top:10px;">';
            if (data.fire_history) {
                html += "<dt>Fires in period</dt><dd>" + data.fire_history.total_fires_in_period + "</dd>";
                html += "<dt>Fires per year</dt><dd>" + data.fire_history.fires_per_year.toFixed(2) + "</dd>";
                if (data.fire_history.last_fire_date) {
                    html += "<dt>Last fire</dt><dd>" + data.fire_history.last_fire_date + "</dd>";
                }
            }
            const cc = data.current_conditions;
            if (cc) {
                if (cc.surface_temperature_k != null) {
                    html += "<dt>Surface temperature</dt><dd>" + (cc.surface_temperature_k - 273.15).toFixed(1) + " &deg;C</dd>";
                }
                if (cc.soil_moisture_kg_m2 != null) {
                    html += "<dt>Soil moisture</dt><dd>" + cc.soil_moisture_kg_m2.toFixed(1) + " kg/m&sup2;</dd>";
                }
                if (cc.wind_speed_m_s != null) {
                    html += "<dt>Wind speed</dt><dd>" + cc.wind_speed_m_s.toFixed(1) + " m/s</dd>";
                }
                if (cc.ndvi != null) {
                    html += "<dt>NDVI</dt><dd>" + cc.ndvi.toFixed(2) + "</dd>";
                }
                if (cc.water_coverage_percent != null) {
                    html += "<dt>Water coverage</dt><dd>" + cc.water_coverage_percent.toFixed(1) + "%</dd>";
                }
            }
            html += "</dl>";
            card.innerHTML = html;
            card.style.display = "block";
        }
    </script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_template_has_substitution_markers() {
        assert!(PAGE_HTML.contains("__VERSION__"));
        assert!(PAGE_HTML.contains("__MAP_API_KEY__"));
        assert!(PAGE_HTML.contains("/api/get-risk-report"));
    }
}

//! Web server for the AeroSense dashboard.
//!
//! Serves a single-page dashboard and a small JSON API over the shared
//! [`Dashboard`]:
//! - Axum for the HTTP server
//! - Leaflet for the map layer
//! - `fetch` polling instead of a push channel

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::dashboard::{Dashboard, DisplayState, RefreshOutcome};
use crate::errors::AirError;
use crate::marker;
use crate::output::SnapshotReport;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    dashboard: Arc<Dashboard>,
}

impl AppState {
    #[must_use]
    pub fn new(dashboard: Arc<Dashboard>) -> Self {
        Self { dashboard }
    }
}

/// What `/api/state` returns.
#[derive(Debug, Serialize)]
pub struct StateReport {
    pub race_policy: &'static str,
    pub snapshot: Option<SnapshotReport>,
    pub error: Option<String>,
}

impl StateReport {
    fn new(state: &DisplayState, dashboard: &Dashboard) -> Self {
        Self {
            race_policy: dashboard.policy().as_str(),
            snapshot: state.snapshot.as_deref().map(SnapshotReport::from),
            error: state.error.clone(),
        }
    }
}

/// Body of `POST /api/resolve`.
#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub city: String,
}

/// Result of one resolve request together with the state it left behind.
#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub outcome: &'static str,
    pub error: Option<String>,
    pub state: StateReport,
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/state", get(state_handler))
        .route("/api/resolve", post(resolve_handler))
        .route("/api/marker", get(marker_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Start the web server.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server stops abnormally.
pub async fn run_server(config: ServerConfig, dashboard: Arc<Dashboard>) -> anyhow::Result<()> {
    let app = create_router(AppState::new(dashboard));

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("🌫 AeroSense UI starting at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// HTTP status for a failed refresh.
fn error_status(err: &AirError) -> StatusCode {
    match err {
        AirError::NotFound(_) => StatusCode::NOT_FOUND,
        AirError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        err if err.is_upstream() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Serve the main HTML page.
async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Current display state as JSON.
async fn state_handler(State(state): State<AppState>) -> Json<StateReport> {
    let current = state.dashboard.current();
    Json(StateReport::new(&current, &state.dashboard))
}

/// Resolve a city and commit the result to the display.
async fn resolve_handler(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Response {
    let outcome = state.dashboard.refresh(&request.city).await;
    let current = state.dashboard.current();
    let report = StateReport::new(&current, &state.dashboard);

    let (status, outcome, error) = match outcome {
        RefreshOutcome::Committed(_) => (StatusCode::OK, "committed", None),
        RefreshOutcome::Failed(err) => (error_status(&err), "failed", Some(err.to_string())),
        // The request itself succeeded; a newer one owns the display.
        RefreshOutcome::Superseded => (StatusCode::OK, "superseded", None),
    };

    (
        status,
        Json(ResolveResponse {
            outcome,
            error,
            state: report,
        }),
    )
        .into_response()
}

/// Marker for the displayed snapshot, or 404 before the first success.
async fn marker_handler(State(state): State<AppState>) -> Response {
    match state.dashboard.current().snapshot {
        Some(snapshot) => Json(marker::project(&snapshot)).into_response(),
        None => (StatusCode::NOT_FOUND, "no snapshot displayed").into_response(),
    }
}

/// Health check endpoint.
async fn health_handler() -> &'static str {
    "OK"
}

/// Main HTML page.
const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>AeroSense · City Air Quality</title>
    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
    <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
    <style>
        :root {
            --font: 'Inter', -apple-system, BlinkMacSystemFont, sans-serif;
            --bg-primary: #09090b;
            --bg-secondary: #18181b;
            --text-primary: #fafafa;
            --text-secondary: #a1a1aa;
            --border: #27272a;
            --accent: #818cf8;
            --danger: #ef4444;
            --radius-md: 10px;
            --radius-lg: 16px;
        }

        * { margin: 0; padding: 0; box-sizing: border-box; }

        body {
            font-family: var(--font);
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.6;
            min-height: 100vh;
        }

        .main { max-width: 1100px; margin: 0 auto; padding: 2rem 1.5rem; }

        .search { display: flex; gap: 0.5rem; margin-bottom: 1.5rem; }
        .search input {
            flex: 1;
            padding: 0.6rem 0.9rem;
            border-radius: var(--radius-md);
            border: 1px solid var(--border);
            background: var(--bg-secondary);
            color: var(--text-primary);
        }
        .search button {
            padding: 0.6rem 1.2rem;
            border: none;
            border-radius: var(--radius-md);
            background: var(--accent);
            color: white;
            cursor: pointer;
        }

        .error { color: var(--danger); margin-bottom: 1rem; min-height: 1.5rem; }

        .grid { display: grid; grid-template-columns: 1fr 1fr; gap: 1.25rem; }

        .card {
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            border-radius: var(--radius-lg);
            padding: 1.25rem;
        }

        .aqi-card { color: white; }
        .aqi-value { font-size: 3.5rem; font-weight: 700; }
        .gauge { height: 8px; border-radius: 4px; background: rgba(255,255,255,0.25); margin-top: 1rem; }
        .gauge-fill { height: 100%; border-radius: 4px; background: white; }

        .muted { color: var(--text-secondary); font-size: 0.85rem; }

        .trend { display: flex; align-items: flex-end; gap: 0.5rem; height: 120px; }
        .bar { flex: 1; background: var(--accent); border-radius: 4px 4px 0 0; }
        .labels { display: flex; gap: 0.5rem; }
        .labels span { flex: 1; text-align: center; }

        #map { height: 320px; border-radius: var(--radius-lg); grid-column: 1 / -1; }

        @media (max-width: 768px) { .grid { grid-template-columns: 1fr; } }
    </style>
</head>
<body>
    <main class="main">
        <form class="search" id="search">
            <input id="city" name="city" placeholder="Search a city" autocomplete="off">
            <button type="submit">Check</button>
        </form>
        <div class="error" id="error"></div>

        <div class="grid">
            <div class="card aqi-card" id="aqi-card">
                <div class="muted" id="location">Loading</div>
                <div class="aqi-value" id="aqi">–</div>
                <div id="label"></div>
                <div class="gauge"><div class="gauge-fill" id="gauge" style="width: 0%"></div></div>
                <p id="advisory" style="margin-top: 1rem"></p>
            </div>

            <div class="card">
                <div id="weather" class="muted"></div>
                <div id="pollutants" style="margin-top: 0.75rem"></div>
            </div>

            <div class="card" style="grid-column: 1 / -1">
                <div class="muted">Last 7 days</div>
                <div class="trend" id="trend"></div>
                <div class="labels muted" id="trend-labels"></div>
            </div>

            <div id="map"></div>
        </div>
    </main>

    <script>
        const map = L.map('map').setView([28.6139, 77.209], 12);
        L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
            attribution: '&copy; OpenStreetMap contributors'
        }).addTo(map);
        let circle = null;
        let shownLocation = null;

        function render(state) {
            document.getElementById('error').textContent = state.error || '';
            const s = state.snapshot;
            if (!s) return;

            const card = document.getElementById('aqi-card');
            card.style.background = `linear-gradient(135deg, ${s.gradient[0]}, ${s.gradient[1]})`;
            document.getElementById('location').textContent = s.location;
            document.getElementById('aqi').textContent = s.aqi;
            document.getElementById('label').textContent = s.label;
            document.getElementById('gauge').style.width = `${s.gauge_percent}%`;
            document.getElementById('advisory').textContent = s.advisory;

            const uv = s.uv_index_synthetic ? `${s.uv_index} (est.)` : s.uv_index;
            document.getElementById('weather').textContent =
                `${Math.round(s.temperature_c)}°C ${s.description} · Humidity ${s.humidity_pct}% · Wind ${Math.round(s.wind_kph)} km/h · UV ${uv}`;
            document.getElementById('pollutants').textContent =
                `PM2.5 ${s.pm2_5} · PM10 ${s.pm10} · NO₂ ${s.no2} · O₃ ${s.o3} · SO₂ ${s.so2} µg/m³`;

            const peak = Math.max(1, ...s.history.map(p => p.aqi));
            document.getElementById('trend').innerHTML = s.history
                .map(p => `<div class="bar" title="${p.aqi}" style="height:${(p.aqi / peak) * 100}%"></div>`)
                .join('');
            document.getElementById('trend-labels').innerHTML = s.history
                .map(p => `<span>${p.label}</span>`)
                .join('');

            const m = s.marker;
            const center = [m.center.latitude, m.center.longitude];
            if (circle) map.removeLayer(circle);
            circle = L.circle(center, {
                radius: m.radius_meters,
                color: m.fill_color,
                fillColor: m.fill_color,
                fillOpacity: 0.5
            }).addTo(map).bindPopup(document.createTextNode(m.popup_text));
            if (s.location !== shownLocation) {
                map.setView(center, m.zoom);
                shownLocation = s.location;
            }
        }

        const STATE_POLL_MS = 30000;

        async function loadState() {
            const response = await fetch('/api/state');
            render(await response.json());
        }

        document.getElementById('search').addEventListener('submit', async (e) => {
            e.preventDefault();
            const city = document.getElementById('city').value;
            const response = await fetch('/api/resolve', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify({ city })
            });
            const body = await response.json();
            render(body.state);
            if (body.error) document.getElementById('error').textContent = body.error;
        });

        loadState();
        setInterval(loadState, STATE_POLL_MS);
    </script>
</body>
</html>
"##;

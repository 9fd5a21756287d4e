//! Output formatters for snapshots.
//!
//! Supports human-readable (with colors), JSON, and NDJSON formats.

use std::io::{self, Write};

use serde::Serialize;

use crate::category::AqiCategory;
use crate::domain::Snapshot;
use crate::marker::{self, MapMarker};

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

// Tier colors
const GREEN: &str = "\x1b[92m";
const YELLOW: &str = "\x1b[93m";
const ORANGE: &str = "\x1b[38;5;208m";
const RED: &str = "\x1b[91m";
const MAGENTA: &str = "\x1b[95m";
const HAZARD: &str = "\x1b[41;97m";

const ICON_PIN: &str = "📍";
const ICON_SYNTHETIC: &str = "≈";

/// Width of the AQI gauge in characters.
const GAUGE_WIDTH: usize = 30;

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable terminal output (default)
    #[default]
    Human,
    /// JSON array
    Json,
    /// Newline-delimited JSON (one object per line)
    Ndjson,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::Ndjson),
            _ => Err(format!("unknown format: {s} (expected: human, json, ndjson)")),
        }
    }
}

/// Flattened snapshot for JSON output and the HTTP API.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotReport {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub aqi: u16,
    pub category: AqiCategory,
    pub label: &'static str,
    pub color: &'static str,
    pub gradient: [&'static str; 2],
    pub gauge_percent: f64,
    pub advisory: &'static str,
    pub particulate_level: &'static str,
    pub pm2_5: f64,
    pub pm10: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub wind_kph: f64,
    pub condition: &'static str,
    pub description: String,
    pub uv_index: u8,
    pub uv_index_synthetic: bool,
    pub history: Vec<HistoryReport>,
    pub marker: MapMarker,
    pub fetched_at: String,
}

/// One day of the trend, labelled for charts.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryReport {
    pub date: String,
    pub label: String,
    pub aqi: u16,
}

impl From<&Snapshot> for SnapshotReport {
    fn from(s: &Snapshot) -> Self {
        let advisory = s.advisory();
        let (from, to) = s.category.gradient();
        Self {
            location: s.location.resolved_name.clone(),
            latitude: s.location.latitude,
            longitude: s.location.longitude,
            aqi: s.aqi.get(),
            category: s.category,
            label: s.category.label(),
            color: s.category.color(),
            gradient: [from, to],
            gauge_percent: s.aqi.gauge_percent(),
            advisory: advisory.message,
            particulate_level: advisory.particulate_level,
            pm2_5: s.pollutants.pm2_5,
            pm10: s.pollutants.pm10,
            no2: s.pollutants.no2,
            o3: s.pollutants.o3,
            so2: s.pollutants.so2,
            temperature_c: s.weather.temperature_c,
            humidity_pct: s.weather.humidity_pct,
            wind_kph: s.weather.wind_kph,
            condition: s.weather.condition.as_str(),
            description: s.weather.description.clone(),
            uv_index: s.weather.uv_index.get(),
            uv_index_synthetic: s.weather.uv_index_synthetic,
            history: s
                .history
                .iter()
                .map(|p| HistoryReport {
                    date: p.date.to_string(),
                    label: p.label(),
                    aqi: p.aqi.get(),
                })
                .collect(),
            marker: marker::project(s),
            fetched_at: s.fetched_at.to_rfc3339(),
        }
    }
}

/// Terminal color for a tier.
fn category_color(category: AqiCategory) -> &'static str {
    match category {
        AqiCategory::Good => GREEN,
        AqiCategory::Moderate => YELLOW,
        AqiCategory::UnhealthyForSensitive => ORANGE,
        AqiCategory::Unhealthy => RED,
        AqiCategory::Severe => MAGENTA,
        AqiCategory::Hazardous => HAZARD,
    }
}

/// Gauge bar with a cursor at the AQI position.
fn gauge(percent: f64) -> String {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let cursor = ((percent / 100.0) * (GAUGE_WIDTH - 1) as f64).round() as usize;
    (0..GAUGE_WIDTH)
        .map(|i| if i == cursor { '●' } else { '─' })
        .collect()
}

/// Write snapshots in human-readable format with rich colors.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human<W: Write>(writer: &mut W, snapshots: &[Snapshot]) -> io::Result<()> {
    for s in snapshots {
        let color = category_color(s.category);
        let advisory = s.advisory();
        let w = &s.weather;
        let uv_note = if w.uv_index_synthetic {
            format!(" {DIM}{ICON_SYNTHETIC} placeholder{RESET}")
        } else {
            String::new()
        };

        writeln!(
            writer,
            "{ICON_PIN} {BOLD}{}{RESET} {DIM}({:.4}, {:.4}){RESET}",
            s.location.resolved_name, s.location.latitude, s.location.longitude
        )?;
        writeln!(
            writer,
            "   {color}{BOLD}AQI {}{RESET} │ {color}{}{RESET} │ {DIM}{}{RESET}",
            s.aqi,
            s.category.label(),
            gauge(s.aqi.gauge_percent())
        )?;
        writeln!(
            writer,
            "   PM2.5 {:.1} │ PM10 {:.1} │ NO₂ {:.1} │ O₃ {:.1} │ SO₂ {:.1} {DIM}µg/m³{RESET}",
            s.pollutants.pm2_5,
            s.pollutants.pm10,
            s.pollutants.no2,
            s.pollutants.o3,
            s.pollutants.so2
        )?;
        writeln!(
            writer,
            "   {} {:.0}°C {} │ 💧 {}% │ 💨 {:.0} km/h │ UV {}{uv_note}",
            w.condition.icon(),
            w.temperature_c,
            w.description,
            w.humidity_pct,
            w.wind_kph,
            w.uv_index.get()
        )?;

        if !s.history.is_empty() {
            let trend: Vec<String> = s
                .history
                .iter()
                .map(|p| format!("{} {}", p.label(), p.aqi))
                .collect();
            writeln!(writer, "   {DIM}7-day:{RESET} {}", trend.join(" · "))?;
        }

        writeln!(
            writer,
            "   {DIM}Particulates {}:{RESET} {}",
            advisory.particulate_level, advisory.message
        )?;
    }
    Ok(())
}

/// Write snapshots as a JSON array.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write>(writer: &mut W, snapshots: &[Snapshot]) -> io::Result<()> {
    let output: Vec<SnapshotReport> = snapshots.iter().map(SnapshotReport::from).collect();
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{json}")
}

/// Write snapshots as newline-delimited JSON.
///
/// Each snapshot is written as a single line of JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_ndjson<W: Write>(writer: &mut W, snapshots: &[Snapshot]) -> io::Result<()> {
    for snapshot in snapshots {
        let output = SnapshotReport::from(snapshot);
        let json = serde_json::to_string(&output)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(writer, "{json}")?;
    }
    Ok(())
}

/// Write snapshots in the specified format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_snapshots<W: Write>(
    writer: &mut W,
    snapshots: &[Snapshot],
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Human => write_human(writer, snapshots),
        Format::Json => write_json(writer, snapshots),
        Format::Ndjson => write_ndjson(writer, snapshots),
    }
}

/// Write a map marker as JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_marker<W: Write>(writer: &mut W, marker: &MapMarker) -> io::Result<()> {
    let json = serde_json::to_string_pretty(marker)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{json}")
}

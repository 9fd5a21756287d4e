//! Map marker projection.
//!
//! Computes what the map layer should draw for a snapshot. Tiles, pan/zoom and
//! the rendering surface belong to the map collaborator.

use serde::Serialize;

use crate::domain::{GeoPoint, Snapshot};

/// Radius of the AQI circle drawn around the location.
pub const MARKER_RADIUS_METERS: u32 = 2000;

/// Zoom level used when centring the map on a marker.
pub const DEFAULT_ZOOM: u8 = 12;

/// A circle marker for the map layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub center: GeoPoint,
    pub radius_meters: u32,
    pub fill_color: &'static str,
    pub popup_text: String,
    pub zoom: u8,
}

/// Project a snapshot onto a map marker.
#[must_use]
pub fn project(snapshot: &Snapshot) -> MapMarker {
    MapMarker {
        center: snapshot.location.clone(),
        radius_meters: MARKER_RADIUS_METERS,
        fill_color: snapshot.category.color(),
        popup_text: format!(
            "{}: AQI {} ({})",
            snapshot.location.resolved_name,
            snapshot.aqi,
            snapshot.category.label()
        ),
        zoom: DEFAULT_ZOOM,
    }
}

//! Point-marker map of vacancy records.
//!
//! A [`MapView`] is recomputed for every render and never cached. Its HTML
//! form is a self-contained Leaflet page placed in an iframe `srcdoc`, so
//! the fragment works when injected with `innerHTML` (scripts inside a
//! `srcdoc` run, scripts set through `innerHTML` do not).

use geo::Point;
use serde::Serialize;
use vacancy_map_vacancy_models::VacancyRecord;

use crate::html;

/// Latitude the base map is centered on.
pub const CENTER_LATITUDE: f64 = 41.85;
/// Longitude the base map is centered on.
pub const CENTER_LONGITUDE: f64 = -87.65;
/// Initial zoom level of the base map.
pub const DEFAULT_ZOOM: u8 = 10;

const LEAFLET_VERSION: &str = "1.9.4";
const TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
const TILE_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";

/// A single map pin.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Pin location (x = longitude, y = latitude).
    pub position: Point<f64>,
    /// Popup text.
    pub label: String,
}

impl Marker {
    /// Latitude of the pin.
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.position.y()
    }

    /// Longitude of the pin.
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.position.x()
    }
}

/// Marker as handed to the Leaflet script.
#[derive(Serialize)]
struct MarkerJson<'a> {
    lat: f64,
    lng: f64,
    label: &'a str,
}

/// A base map plus its markers.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    /// Map center (x = longitude, y = latitude).
    pub center: Point<f64>,
    /// Initial zoom level.
    pub zoom: u8,
    /// Markers in input order.
    pub markers: Vec<Marker>,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: Point::new(CENTER_LONGITUDE, CENTER_LATITUDE),
            zoom: DEFAULT_ZOOM,
            markers: Vec::new(),
        }
    }
}

impl MapView {
    /// Number of markers on the map.
    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Serializes the markers to the JSON array embedded in the page.
    fn markers_json(&self) -> String {
        let markers: Vec<MarkerJson<'_>> = self
            .markers
            .iter()
            .map(|m| MarkerJson {
                lat: m.latitude(),
                lng: m.longitude(),
                label: &m.label,
            })
            .collect();

        // Serializing plain floats and strings cannot fail; non-finite
        // coordinates never reach a marker.
        serde_json::to_string(&markers).unwrap_or_else(|e| {
            log::error!("Failed to serialize markers: {e}");
            "[]".to_string()
        })
    }

    /// Renders a standalone HTML document containing the Leaflet map.
    #[must_use]
    pub fn to_document(&self) -> String {
        let markers = html::script_safe_json(&self.markers_json());
        let lat = self.center.y();
        let lng = self.center.x();
        let zoom = self.zoom;

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<link rel="stylesheet" href="https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.js"></script>
<style>html, body {{ width: 100%; height: 100%; margin: 0; padding: 0; }} #map {{ position: absolute; top: 0; bottom: 0; left: 0; right: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map("map", {{ center: [{lat}, {lng}], zoom: {zoom} }});
L.tileLayer("{TILE_URL}", {{ maxZoom: 19, attribution: '{TILE_ATTRIBUTION}' }}).addTo(map);
var markers = {markers};
markers.forEach(function (m) {{
  var popup = document.createElement("div");
  popup.textContent = m.label;
  L.marker([m.lat, m.lng]).bindPopup(popup).addTo(map);
}});
</script>
</body>
</html>
"#
        )
    }

    /// Renders the map as an embeddable fragment: a responsive iframe whose
    /// `srcdoc` holds [`Self::to_document`].
    #[must_use]
    pub fn to_html(&self) -> String {
        format!(
            concat!(
                r#"<div class="vacancy-map" style="width:100%;">"#,
                r#"<div style="position:relative;width:100%;height:0;padding-bottom:60%;">"#,
                r#"<iframe srcdoc="{}" style="position:absolute;width:100%;height:100%;left:0;top:0;border:none;" allowfullscreen></iframe>"#,
                "</div></div>"
            ),
            html::escape(&self.to_document())
        )
    }
}

/// Builds the map for a set of records.
///
/// One marker per record with geometry, labelled with its address and kept
/// in input order. Records without geometry are skipped.
#[must_use]
pub fn render_map<'a, I>(records: I) -> MapView
where
    I: IntoIterator<Item = &'a VacancyRecord>,
{
    let mut skipped = 0_usize;

    let markers: Vec<Marker> = records
        .into_iter()
        .filter_map(|record| {
            let Some(position) = record.geometry else {
                skipped += 1;
                return None;
            };
            Some(Marker {
                position,
                label: record.property_address.clone(),
            })
        })
        .collect();

    if skipped > 0 {
        log::debug!("Skipped {skipped} records without geometry");
    }
    log::debug!("Rendered map with {} markers", markers.len());

    MapView {
        markers,
        ..MapView::default()
    }
}

//! Per-connection reactive sessions.
//!
//! Each browser tab gets its own [`SessionGraph`] wiring the dashboard's
//! inputs to its outputs. The image output reads both dropdowns; the map
//! output only fires on the year slider's value event.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use serde_json::Value;
use uuid::Uuid;
use vacancy_map_reactive::{Inputs, ReactiveError, ReactiveGraph, Trigger};
use vacancy_map_render::{ImageDirectory, render_map, select_image};
use vacancy_map_server_models::{ApiOutput, ApiOutputBody};
use vacancy_map_store::RecordStore;
use vacancy_map_vacancy_models::{AreaMeasure, ImageRef, WealthMeasure};

use crate::config::{AppKind, YearBounds};

/// Area measure dropdown.
pub const INPUT_AREA_MEASURE: &str = "area_measure";
/// Wealth measure dropdown.
pub const INPUT_WEALTH_MEASURE: &str = "wealth_measure";
/// Year slider.
pub const INPUT_YEAR: &str = "year";

/// Static wealth-map image output.
pub const OUTPUT_MAP_IMAGE: &str = "map_image";
/// Embedded marker map output.
pub const OUTPUT_MAP: &str = "map";

/// URL prefix the wealth-map images are served under.
pub const IMAGE_ROUTE: &str = "/images";

/// The reactive graph behind one dashboard session.
pub type SessionGraph = ReactiveGraph<ApiOutputBody>;

/// Builds the graph for a new session of the given dashboard.
///
/// # Errors
///
/// Returns [`ReactiveError`] if the dashboard wiring is inconsistent.
pub fn build_session(
    app: AppKind,
    store: &Arc<RecordStore>,
    images: &ImageDirectory,
    years: YearBounds,
) -> Result<SessionGraph, ReactiveError> {
    let mut graph = SessionGraph::new();

    if app.shows_images() {
        graph.declare_input(
            INPUT_AREA_MEASURE,
            Value::String(AreaMeasure::default().to_string()),
        )?;
        graph.declare_input(
            INPUT_WEALTH_MEASURE,
            Value::String(WealthMeasure::default().to_string()),
        )?;

        let images = images.clone();
        graph.register_output(
            OUTPUT_MAP_IMAGE,
            Trigger::reads(&[INPUT_AREA_MEASURE, INPUT_WEALTH_MEASURE]),
            move |inputs| image_output(&images, inputs),
        )?;
    }

    if app.shows_map() {
        graph.declare_input(INPUT_YEAR, Value::from(years.initial()))?;

        let store = Arc::clone(store);
        graph.register_output(OUTPUT_MAP, Trigger::event(INPUT_YEAR), move |inputs| {
            map_output(&store, inputs)
        })?;
    }

    Ok(graph)
}

/// Checks an incoming input value before it reaches the graph.
///
/// # Errors
///
/// Returns a message describing why the value is not acceptable.
pub fn validate_input(name: &str, value: &Value) -> Result<(), String> {
    match name {
        INPUT_AREA_MEASURE => value
            .as_str()
            .and_then(|s| s.parse::<AreaMeasure>().ok())
            .map(|_| ())
            .ok_or_else(|| format!("{name} must be one of: zcta, tract")),
        INPUT_WEALTH_MEASURE => value
            .as_str()
            .and_then(|s| s.parse::<WealthMeasure>().ok())
            .map(|_| ())
            .ok_or_else(|| format!("{name} must be one of: income, value")),
        INPUT_YEAR => value
            .as_i64()
            .and_then(|y| i32::try_from(y).ok())
            .map(|_| ())
            .ok_or_else(|| format!("{name} must be an integer year")),
        _ => Ok(()),
    }
}

/// Converts flushed graph results into API outputs.
#[must_use]
pub fn to_api_outputs(results: Vec<(String, ApiOutputBody)>) -> Vec<ApiOutput> {
    results
        .into_iter()
        .map(|(name, body)| ApiOutput { name, body })
        .collect()
}

/// API body for an image that exists on disk.
#[must_use]
pub fn image_body(image: &ImageRef) -> ApiOutputBody {
    ApiOutputBody::Image {
        src: format!("{IMAGE_ROUTE}/{}", image.path.display()),
        alt: image.alt.clone(),
        width: image.width.clone(),
    }
}

/// Selects and locates the wealth-map image for the current dropdowns.
fn image_output(images: &ImageDirectory, inputs: &Inputs<'_>) -> ApiOutputBody {
    let area = inputs
        .get_str(INPUT_AREA_MEASURE)
        .and_then(|s| s.parse::<AreaMeasure>().ok());
    let wealth = inputs
        .get_str(INPUT_WEALTH_MEASURE)
        .and_then(|s| s.parse::<WealthMeasure>().ok());

    let (Some(area), Some(wealth)) = (area, wealth) else {
        return ApiOutputBody::Error {
            message: "Invalid area or wealth measure".to_string(),
        };
    };

    let image = select_image(area, wealth);
    match images.locate(&image) {
        Ok(_) => image_body(&image),
        Err(e) => {
            log::warn!("Failed to render {OUTPUT_MAP_IMAGE}: {e}");
            ApiOutputBody::Error {
                message: format!("Image {} is unavailable", image.path.display()),
            }
        }
    }
}

/// Filters the store to the slider's year and renders the marker map.
fn map_output(store: &RecordStore, inputs: &Inputs<'_>) -> ApiOutputBody {
    let Some(year) = inputs
        .get_i64(INPUT_YEAR)
        .and_then(|y| i32::try_from(y).ok())
    else {
        return ApiOutputBody::Error {
            message: "Invalid year".to_string(),
        };
    };

    let records = store.filter_by_year(year);
    log::debug!("Rendering map for {year}: {} records", records.len());

    ApiOutputBody::Html {
        html: render_map(records).to_html(),
    }
}

/// Idle time after which a session is dropped when no TTL is configured.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

struct SessionEntry {
    graph: Arc<Mutex<SessionGraph>>,
    last_touched: Instant,
}

/// All live sessions, keyed by id.
///
/// Each graph sits behind its own mutex so one session's outputs are
/// computed strictly one after another while other sessions proceed.
/// Sessions untouched for longer than the TTL are evicted on the next
/// [`insert`](Self::insert) or [`get`](Self::get).
pub struct SessionRegistry {
    sessions: RwLock<BTreeMap<Uuid, SessionEntry>>,
    ttl: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

impl SessionRegistry {
    /// Creates an empty registry that evicts sessions idle for `ttl`.
    #[must_use]
    pub const fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(BTreeMap::new()),
            ttl,
        }
    }

    /// Idle time after which sessions are evicted.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stores a graph under a fresh id.
    pub fn insert(&self, graph: SessionGraph) -> Uuid {
        let id = Uuid::new_v4();
        let now = Instant::now();
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        self.evict_locked(&mut sessions, now);
        sessions.insert(
            id,
            SessionEntry {
                graph: Arc::new(Mutex::new(graph)),
                last_touched: now,
            },
        );
        log::debug!("Opened session {id}");
        id
    }

    /// Looks up a session and marks it as used.
    #[must_use]
    pub fn get(&self, id: &Uuid) -> Option<Arc<Mutex<SessionGraph>>> {
        let now = Instant::now();
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        self.evict_locked(&mut sessions, now);
        sessions.get_mut(id).map(|entry| {
            entry.last_touched = now;
            Arc::clone(&entry.graph)
        })
    }

    /// Removes a session, returning whether it existed.
    pub fn remove(&self, id: &Uuid) -> bool {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some();
        if removed {
            log::debug!("Closed session {id}");
        }
        removed
    }

    /// Drops every session idle for longer than the TTL as of `now`,
    /// returning how many were removed.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        self.evict_locked(&mut sessions, now)
    }

    fn evict_locked(&self, sessions: &mut BTreeMap<Uuid, SessionEntry>, now: Instant) -> usize {
        let before = sessions.len();
        sessions.retain(|_, entry| now.saturating_duration_since(entry.last_touched) <= self.ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            log::debug!("Evicted {evicted} idle session(s)");
        }
        evicted
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether there are no live sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use vacancy_map_vacancy_models::GeometryPolicy;

    use super::*;

    const SAMPLE: &str = "issued_date,longitude,latitude,property_address\n\
                          2015-03-12,-87.6278,41.8827,100 N STATE ST\n\
                          2015-07-01,-87.6341,41.8819,200 W MADISON ST\n\
                          2020-01-05,-87.6365,41.8776,300 S WACKER DR\n";

    fn store() -> Arc<RecordStore> {
        Arc::new(RecordStore::from_reader(SAMPLE.as_bytes(), GeometryPolicy::DropAtLoad).unwrap())
    }

    fn years() -> YearBounds {
        YearBounds {
            min: 2015,
            max: 2020,
        }
    }

    #[test]
    fn tabs_session_renders_both_outputs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("zcta_income.png"), b"png").unwrap();
        let images = ImageDirectory::new(dir.path());

        let mut graph = build_session(AppKind::Tabs, &store(), &images, years()).unwrap();
        let outputs = to_api_outputs(graph.flush());

        assert_eq!(outputs.len(), 2);
        assert_eq!(
            outputs[0].body,
            ApiOutputBody::Image {
                src: "/images/zcta_income.png".to_string(),
                alt: "Map showing income for zcta".to_string(),
                width: "80%".to_string(),
            }
        );
        match &outputs[1].body {
            ApiOutputBody::Html { html } => assert!(html.contains("100 N STATE ST")),
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn missing_image_is_a_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let images = ImageDirectory::new(dir.path());

        let mut graph = build_session(AppKind::Images, &store(), &images, years()).unwrap();
        let outputs = to_api_outputs(graph.flush());

        assert_eq!(outputs.len(), 1);
        assert_eq!(
            outputs[0].body,
            ApiOutputBody::Error {
                message: "Image zcta_income.png is unavailable".to_string(),
            }
        );

        // The session keeps working after the failed render.
        std::fs::write(dir.path().join("tract_income.png"), b"png").unwrap();
        graph.set_input(INPUT_AREA_MEASURE, json!("tract")).unwrap();
        let outputs = to_api_outputs(graph.flush());
        assert!(matches!(outputs[0].body, ApiOutputBody::Image { .. }));
    }

    #[test]
    fn slider_only_recomputes_map() {
        let dir = tempfile::tempdir().unwrap();
        let images = ImageDirectory::new(dir.path());
        let mut graph = build_session(AppKind::Tabs, &store(), &images, years()).unwrap();
        graph.flush();

        graph.set_input(INPUT_YEAR, json!(2020)).unwrap();
        let outputs = to_api_outputs(graph.flush());
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].name, OUTPUT_MAP);
        match &outputs[0].body {
            ApiOutputBody::Html { html } => {
                assert!(html.contains("300 S WACKER DR"));
                assert!(!html.contains("100 N STATE ST"));
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn map_only_session_has_no_dropdowns() {
        let dir = tempfile::tempdir().unwrap();
        let images = ImageDirectory::new(dir.path());
        let mut graph = build_session(AppKind::Map, &store(), &images, years()).unwrap();
        assert!(graph.input(INPUT_AREA_MEASURE).is_none());
        assert_eq!(graph.input(INPUT_YEAR), Some(&json!(2015)));
        assert!(graph.set_input(INPUT_AREA_MEASURE, json!("tract")).is_err());
    }

    #[test]
    fn validates_input_values() {
        assert!(validate_input(INPUT_AREA_MEASURE, &json!("tract")).is_ok());
        assert!(validate_input(INPUT_AREA_MEASURE, &json!("county")).is_err());
        assert!(validate_input(INPUT_WEALTH_MEASURE, &json!(3)).is_err());
        assert!(validate_input(INPUT_YEAR, &json!(2016)).is_ok());
        assert!(validate_input(INPUT_YEAR, &json!("2016")).is_err());
        assert!(validate_input(INPUT_YEAR, &json!(2016.5)).is_err());
    }

    #[test]
    fn registry_tracks_sessions() {
        let registry = SessionRegistry::default();
        let id = registry.insert(SessionGraph::new());
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&id).is_some());
        assert!(registry.remove(&id));
        assert!(!registry.remove(&id));
        assert!(registry.is_empty());
    }

    #[test]
    fn idle_sessions_are_evicted() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let stale = registry.insert(SessionGraph::new());
        registry.insert(SessionGraph::new());
        assert_eq!(registry.len(), 2);

        assert_eq!(registry.evict_idle(Instant::now()), 0);
        assert_eq!(registry.len(), 2);

        let later = Instant::now() + Duration::from_secs(61);
        assert_eq!(registry.evict_idle(later), 2);
        assert!(registry.is_empty());
        assert!(registry.get(&stale).is_none());
    }

    #[test]
    fn zero_ttl_evicts_on_next_insert() {
        let registry = SessionRegistry::new(Duration::ZERO);
        for _ in 0..10 {
            registry.insert(SessionGraph::new());
            std::thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(registry.len(), 1);
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Vacancy record types and static map selection enums.
//!
//! This crate defines the plain data shared by the record store, the map
//! renderer and the server: one parsed vacant-building record, the two
//! categorical measures behind the pre-rendered wealth maps, and the image
//! reference produced when a pair of measures is selected.

use std::path::PathBuf;

use chrono::{Datelike as _, NaiveDate};
use geo::Point;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One row of the vacant-building dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct VacancyRecord {
    /// Date the vacancy notice was issued.
    pub issued_date: NaiveDate,
    /// Calendar year of [`Self::issued_date`].
    pub year: i32,
    /// Longitude, if the source row had a usable value.
    pub longitude: Option<f64>,
    /// Latitude, if the source row had a usable value.
    pub latitude: Option<f64>,
    /// Point geometry (x = longitude, y = latitude). Present iff both
    /// coordinates are present.
    pub geometry: Option<Point<f64>>,
    /// Street address, used as the marker popup label.
    pub property_address: String,
}

impl VacancyRecord {
    /// Builds a record, deriving the year and point geometry.
    #[must_use]
    pub fn new(
        issued_date: NaiveDate,
        longitude: Option<f64>,
        latitude: Option<f64>,
        property_address: String,
    ) -> Self {
        let geometry = match (longitude, latitude) {
            (Some(x), Some(y)) => Some(Point::new(x, y)),
            _ => None,
        };

        Self {
            issued_date,
            year: issued_date.year(),
            longitude,
            latitude,
            geometry,
            property_address,
        }
    }

    /// Whether this record can be placed on a map.
    #[must_use]
    pub const fn has_geometry(&self) -> bool {
        self.geometry.is_some()
    }
}

/// What to do with rows that lack a longitude or latitude.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum GeometryPolicy {
    /// Remove the row while loading; it is never returned by a filter.
    #[default]
    #[serde(rename = "drop")]
    #[strum(serialize = "drop")]
    DropAtLoad,
    /// Keep the row with no geometry; the map renderer skips it.
    #[serde(rename = "retain")]
    #[strum(serialize = "retain")]
    RetainAndSkip,
}

/// Geographic unit the wealth maps are aggregated over.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AreaMeasure {
    /// ZIP Code Tabulation Area
    #[default]
    Zcta,
    /// Census tract
    Tract,
}

impl AreaMeasure {
    /// Returns all variants in dropdown order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Zcta, Self::Tract]
    }
}

/// Wealth indicator the wealth maps are shaded by.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WealthMeasure {
    /// Median household income
    #[default]
    Income,
    /// Median home value
    Value,
}

impl WealthMeasure {
    /// Returns all variants in dropdown order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Income, Self::Value]
    }
}

/// A pair of dropdown choices identifying one pre-rendered wealth map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticMapSelection {
    /// Selected area measure.
    pub area_measure: AreaMeasure,
    /// Selected wealth measure.
    pub wealth_measure: WealthMeasure,
}

impl StaticMapSelection {
    /// Creates a selection from its two measures.
    #[must_use]
    pub const fn new(area_measure: AreaMeasure, wealth_measure: WealthMeasure) -> Self {
        Self {
            area_measure,
            wealth_measure,
        }
    }

    /// Every selection the dropdowns can produce.
    #[must_use]
    pub fn all() -> Vec<Self> {
        AreaMeasure::all()
            .iter()
            .flat_map(|area| {
                WealthMeasure::all()
                    .iter()
                    .map(move |wealth| Self::new(*area, *wealth))
            })
            .collect()
    }

    /// Image file name, e.g. `zcta_income.png`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}_{}.png", self.area_measure, self.wealth_measure)
    }

    /// Alt text describing the map, e.g. `Map showing income for zcta`.
    #[must_use]
    pub fn alt_text(&self) -> String {
        format!("Map showing {} for {}", self.wealth_measure, self.area_measure)
    }

    /// Parses a file name produced by [`Self::file_name`].
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(".png")?;
        let (area, wealth) = stem.split_once('_')?;
        Some(Self::new(area.parse().ok()?, wealth.parse().ok()?))
    }
}

/// Reference to an image resource plus its display hints.
///
/// Constructing one never touches the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    /// Location of the image file.
    pub path: PathBuf,
    /// Alt text for the rendered `<img>`.
    pub alt: String,
    /// CSS width hint (e.g. `80%`).
    pub width: String,
}

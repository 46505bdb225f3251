#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! CSV-backed, read-only store of vacant-building records.
//!
//! [`load`] reads the dataset once at startup and returns an owned
//! [`RecordStore`]. The store is never mutated afterwards, so it can be
//! shared across sessions behind an `Arc` without locking.

pub mod parsing;

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use vacancy_map_vacancy_models::{GeometryPolicy, VacancyRecord};

/// Columns the CSV must contain. Any others are ignored.
pub const REQUIRED_COLUMNS: &[&str] = &["issued_date", "longitude", "latitude", "property_address"];

/// Errors that can occur while loading the record store.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The source file could not be opened.
    #[error("failed to open {}: {source}", path.display())]
    Io {
        /// Path that was being opened.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The CSV could not be parsed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The header row is missing a required column.
    #[error("missing required column '{0}'")]
    MissingColumn(String),

    /// A non-empty `issued_date` value did not match any known format.
    #[error("invalid issued_date '{value}' on line {line}")]
    InvalidDate {
        /// 1-based line number in the source file.
        line: u64,
        /// The offending value.
        value: String,
    },
}

/// The subset of CSV columns the store reads.
#[derive(Debug, Deserialize)]
struct RawVacancyRow {
    issued_date: Option<String>,
    longitude: Option<String>,
    latitude: Option<String>,
    property_address: Option<String>,
}

/// In-memory, immutable collection of parsed vacancy records in source
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordStore {
    records: Vec<VacancyRecord>,
    policy: GeometryPolicy,
}

impl RecordStore {
    /// Builds a store from already-parsed records, applying `policy`.
    #[must_use]
    pub fn from_records(records: Vec<VacancyRecord>, policy: GeometryPolicy) -> Self {
        let records = match policy {
            GeometryPolicy::DropAtLoad => records
                .into_iter()
                .filter(VacancyRecord::has_geometry)
                .collect(),
            GeometryPolicy::RetainAndSkip => records,
        };

        Self { records, policy }
    }

    /// Parses CSV data from any reader.
    ///
    /// # Errors
    ///
    /// Returns [`DataLoadError`] if the CSV is malformed, a required column
    /// is missing, or an `issued_date` cannot be parsed.
    pub fn from_reader<R: Read>(reader: R, policy: GeometryPolicy) -> Result<Self, DataLoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == *column) {
                return Err(DataLoadError::MissingColumn((*column).to_string()));
            }
        }

        let mut records = Vec::new();
        let mut skipped_undated = 0_u64;

        for result in reader.records() {
            let row = result?;
            let line = row.position().map_or(0, csv::Position::line);
            let raw: RawVacancyRow = row.deserialize(Some(&headers))?;

            let Some(date_str) = raw.issued_date.filter(|s| !s.is_empty()) else {
                log::debug!("Skipping line {line}: empty issued_date");
                skipped_undated += 1;
                continue;
            };

            let issued_date = parsing::parse_issued_date(&date_str).ok_or_else(|| {
                DataLoadError::InvalidDate {
                    line,
                    value: date_str.clone(),
                }
            })?;

            records.push(VacancyRecord::new(
                issued_date,
                parsing::parse_coordinate(raw.longitude.as_deref()),
                parsing::parse_coordinate(raw.latitude.as_deref()),
                raw.property_address.unwrap_or_default(),
            ));
        }

        if skipped_undated > 0 {
            log::warn!("Skipped {skipped_undated} rows with no issued_date");
        }

        let parsed = records.len();
        let store = Self::from_records(records, policy);

        if store.records.len() < parsed {
            log::info!(
                "Dropped {} rows without coordinates",
                parsed - store.records.len()
            );
        }

        Ok(store)
    }

    /// All records, in source order.
    #[must_use]
    pub fn records(&self) -> &[VacancyRecord] {
        &self.records
    }

    /// Number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The null-geometry policy the store was built with.
    #[must_use]
    pub const fn policy(&self) -> GeometryPolicy {
        self.policy
    }

    /// Smallest and largest derived year, or `None` for an empty store.
    #[must_use]
    pub fn year_range(&self) -> Option<(i32, i32)> {
        let min = self.records.iter().map(|r| r.year).min()?;
        let max = self.records.iter().map(|r| r.year).max()?;
        Some((min, max))
    }

    /// Records whose derived year equals `year`, in source order.
    #[must_use]
    pub fn filter_by_year(&self, year: i32) -> Vec<&VacancyRecord> {
        self.records.iter().filter(|r| r.year == year).collect()
    }
}

/// Loads the record store from the CSV file at `path`.
///
/// # Errors
///
/// Returns [`DataLoadError`] if the file cannot be opened, is malformed, or
/// lacks a required column.
pub fn load(path: &Path, policy: GeometryPolicy) -> Result<RecordStore, DataLoadError> {
    log::info!("Loading vacancy records from {}", path.display());

    let file = File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let store = RecordStore::from_reader(file, policy)?;

    match store.year_range() {
        Some((min, max)) => log::info!(
            "Loaded {} records spanning {min}-{max} ({policy} policy)",
            store.len()
        ),
        None => log::warn!("Loaded an empty record store from {}", path.display()),
    }

    Ok(store)
}

/// Records whose derived year equals `year`, in source order.
///
/// An empty result is not an error.
#[must_use]
pub fn filter_by_year(store: &RecordStore, year: i32) -> Vec<&VacancyRecord> {
    store.filter_by_year(year)
}

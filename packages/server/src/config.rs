//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use vacancy_map_store::RecordStore;
use vacancy_map_vacancy_models::GeometryPolicy;

use crate::ServerError;

/// Year range used for the slider when the store has no records and no
/// override is given.
pub const FALLBACK_YEARS: (i32, i32) = (2011, 2024);

/// Which dashboard the server presents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum AppKind {
    /// Wealth-map dropdowns and the static image only.
    Images,
    /// Year slider and the marker map only.
    Map,
    /// Both, on two navbar tabs.
    #[default]
    Tabs,
}

impl AppKind {
    /// Whether the static wealth-map image is part of this dashboard.
    #[must_use]
    pub const fn shows_images(self) -> bool {
        matches!(self, Self::Images | Self::Tabs)
    }

    /// Whether the yearly marker map is part of this dashboard.
    #[must_use]
    pub const fn shows_map(self) -> bool {
        matches!(self, Self::Map | Self::Tabs)
    }

    /// Label used in prompts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Images => "Wealth maps only",
            Self::Map => "Yearly vacancy map only",
            Self::Tabs => "Both, as tabs",
        }
    }

    /// All variants in prompt order.
    pub const ALL: &[Self] = &[Self::Tabs, Self::Images, Self::Map];
}

/// Command-line arguments for `vacancy_map_server`.
#[derive(Debug, Clone, Parser)]
#[command(name = "vacancy_map_server", about = "Chicago vacancy dashboards")]
pub struct ServerArgs {
    /// Path to the vacant-building CSV
    #[arg(long, env = "VACANCY_DATA")]
    pub data: Option<PathBuf>,

    /// Directory holding the `{area}_{wealth}.png` wealth maps
    #[arg(long, env = "VACANCY_IMAGE_DIR", default_value = ".")]
    pub image_dir: PathBuf,

    /// Dashboard to serve
    #[arg(long, env = "VACANCY_APP", value_enum, default_value_t = AppKind::Tabs)]
    pub app: AppKind,

    /// What to do with rows missing coordinates (`drop` or `retain`)
    #[arg(long, default_value = "drop", value_parser = parse_geometry_policy)]
    pub geometry_policy: GeometryPolicy,

    /// Lower bound of the year slider (defaults to the earliest year in the data)
    #[arg(long)]
    pub year_min: Option<i32>,

    /// Upper bound of the year slider (defaults to the latest year in the data)
    #[arg(long)]
    pub year_max: Option<i32>,

    /// Address to bind
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1")]
    pub bind_addr: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Seconds a session may sit idle before it is dropped
    #[arg(long, env = "VACANCY_SESSION_TTL_SECS", default_value_t = 1800)]
    pub session_ttl_secs: u64,

    /// Prompt for the settings above before starting
    #[arg(long)]
    pub interactive: bool,
}

impl ServerArgs {
    /// Validates the arguments into a [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::MissingDataPath`] if no data path was given,
    /// or [`ServerError::InvalidYearRange`] if the slider overrides are
    /// inverted.
    pub fn into_config(self) -> Result<ServerConfig, ServerError> {
        let data_path = self.data.ok_or(ServerError::MissingDataPath)?;

        if let (Some(min), Some(max)) = (self.year_min, self.year_max)
            && min > max
        {
            return Err(ServerError::InvalidYearRange { min, max });
        }

        Ok(ServerConfig {
            data_path,
            image_dir: self.image_dir,
            app: self.app,
            geometry_policy: self.geometry_policy,
            year_min: self.year_min,
            year_max: self.year_max,
            bind_addr: self.bind_addr,
            port: self.port,
            session_ttl: Duration::from_secs(self.session_ttl_secs),
        })
    }
}

fn parse_geometry_policy(s: &str) -> Result<GeometryPolicy, String> {
    s.parse()
        .map_err(|_| format!("unknown geometry policy '{s}' (expected 'drop' or 'retain')"))
}

/// Resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Vacant-building CSV.
    pub data_path: PathBuf,
    /// Wealth-map image directory.
    pub image_dir: PathBuf,
    /// Dashboard to serve.
    pub app: AppKind,
    /// Null-coordinate handling.
    pub geometry_policy: GeometryPolicy,
    /// Slider lower bound override.
    pub year_min: Option<i32>,
    /// Slider upper bound override.
    pub year_max: Option<i32>,
    /// Bind address.
    pub bind_addr: String,
    /// Port.
    pub port: u16,
    /// Idle time after which a session is dropped.
    pub session_ttl: Duration,
}

/// Bounds of the year slider. The slider starts at `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearBounds {
    /// Smallest selectable year.
    pub min: i32,
    /// Largest selectable year.
    pub max: i32,
}

impl YearBounds {
    /// Picks slider bounds from the overrides, then the data, then
    /// [`FALLBACK_YEARS`].
    #[must_use]
    pub fn resolve(store: &RecordStore, min: Option<i32>, max: Option<i32>) -> Self {
        let (data_min, data_max) = store.year_range().unwrap_or(FALLBACK_YEARS);
        let min = min.unwrap_or(data_min);
        let max = max.unwrap_or(data_max).max(min);
        Self { min, max }
    }

    /// Initial slider position.
    #[must_use]
    pub const fn initial(self) -> i32 {
        self.min
    }
}

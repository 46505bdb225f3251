#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web dashboards for the Chicago vacancy map.
//!
//! Serves one of three dashboards (wealth-map images, a yearly vacancy
//! marker map, or both on tabs). Every browser tab opens a reactive session
//! through `/api/sessions`; input changes are posted back and only the
//! outputs depending on the changed input are re-rendered.

pub mod config;
mod handlers;
pub mod interactive;
pub mod page;
pub mod session;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use vacancy_map_render::ImageDirectory;
use vacancy_map_store::{DataLoadError, RecordStore};

use crate::config::{AppKind, ServerConfig, YearBounds};
use crate::session::SessionRegistry;

/// Errors that prevent the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// No dataset path was configured.
    #[error("no data file configured: pass --data or set VACANCY_DATA")]
    MissingDataPath,

    /// The slider overrides are inverted.
    #[error("--year-min ({min}) is greater than --year-max ({max})")]
    InvalidYearRange {
        /// Lower bound given.
        min: i32,
        /// Upper bound given.
        max: i32,
    },

    /// The dataset could not be loaded.
    #[error(transparent)]
    DataLoad(#[from] DataLoadError),

    /// Binding or running the HTTP server failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An interactive prompt failed.
    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),
}

/// Shared application state.
pub struct AppState {
    /// Vacancy records, loaded once at startup.
    pub store: Arc<RecordStore>,
    /// Wealth-map image directory.
    pub images: ImageDirectory,
    /// Dashboard being served.
    pub app: AppKind,
    /// Year slider bounds.
    pub years: YearBounds,
    /// Live reactive sessions.
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Builds state around an already-loaded store.
    #[must_use]
    pub fn new(config: &ServerConfig, store: RecordStore) -> Self {
        let years = YearBounds::resolve(&store, config.year_min, config.year_max);

        Self {
            store: Arc::new(store),
            images: ImageDirectory::new(config.image_dir.clone()),
            app: config.app,
            years,
            sessions: SessionRegistry::new(config.session_ttl),
        }
    }
}

/// Registers every route. Shared by [`run_server`] and the handler tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::index))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(handlers::health))
                .route("/summary", web::get().to(handlers::summary))
                .route("/map", web::get().to(handlers::map))
                .route("/image", web::get().to(handlers::image))
                .route("/sessions", web::post().to(handlers::create_session))
                .route(
                    "/sessions/{id}/inputs",
                    web::post().to(handlers::update_input),
                )
                .route("/sessions/{id}", web::delete().to(handlers::delete_session)),
        )
        .route(
            &format!("{}/{{file}}", session::IMAGE_ROUTE),
            web::get().to(handlers::image_file),
        );
}

/// Loads the dataset and starts the vacancy map server.
///
/// This is a regular async function; the caller provides the runtime (e.g.
/// via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if the dataset cannot be loaded or the HTTP
/// server fails to bind or run.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let store = vacancy_map_store::load(&config.data_path, config.geometry_policy)?;

    let state = web::Data::new(AppState::new(&config, store));
    log::info!(
        "Serving {:?} dashboard, slider {}-{}, images from {}",
        state.app,
        state.years.min,
        state.years.max,
        state.images.root().display()
    );

    let bind_addr = config.bind_addr.clone();
    let port = config.port;

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await?;

    Ok(())
}

//! HTTP handler functions for the vacancy map dashboards.

use std::sync::PoisonError;

use actix_files::NamedFile;
use actix_web::{HttpRequest, HttpResponse, web};
use uuid::Uuid;
use vacancy_map_render::{render_map, select_image};
use vacancy_map_server_models::{
    ApiHealth, ApiSession, ApiSummary, ImageQueryParams, InputUpdate, MapQueryParams,
};
use vacancy_map_vacancy_models::StaticMapSelection;

use crate::session::{self, build_session, to_api_outputs, validate_input};
use crate::{AppState, page};

/// `GET /`
pub async fn index(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page::render(state.app, state.years))
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/summary`
///
/// Describes the loaded dataset.
pub async fn summary(state: web::Data<AppState>) -> HttpResponse {
    let range = state.store.year_range();

    HttpResponse::Ok().json(ApiSummary {
        record_count: state.store.len(),
        min_year: range.map(|(min, _)| min),
        max_year: range.map(|(_, max)| max),
        geometry_policy: state.store.policy(),
    })
}

/// `GET /api/map?year=2015`
///
/// Renders the marker map for one year without a session.
pub async fn map(state: web::Data<AppState>, params: web::Query<MapQueryParams>) -> HttpResponse {
    let html = render_map(state.store.filter_by_year(params.year)).to_html();

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html)
}

/// `GET /api/image?areaMeasure=zcta&wealthMeasure=income`
///
/// Selects a wealth-map image without a session.
pub async fn image(
    state: web::Data<AppState>,
    params: web::Query<ImageQueryParams>,
) -> HttpResponse {
    let image = select_image(params.area_measure, params.wealth_measure);

    match state.images.locate(&image) {
        Ok(_) => HttpResponse::Ok().json(session::image_body(&image)),
        Err(e) => {
            log::warn!("Image lookup failed: {e}");
            HttpResponse::NotFound().json(serde_json::json!({
                "error": format!("Image {} is unavailable", image.path.display())
            }))
        }
    }
}

/// `GET /images/{file}`
///
/// Serves one of the four wealth-map images. Any other file name is a 404.
pub async fn image_file(
    req: HttpRequest,
    state: web::Data<AppState>,
    file: web::Path<String>,
) -> HttpResponse {
    let Some(selection) = StaticMapSelection::from_file_name(&file) else {
        return HttpResponse::NotFound().finish();
    };

    let image = select_image(selection.area_measure, selection.wealth_measure);
    let path = match state.images.locate(&image) {
        Ok(path) => path,
        Err(e) => {
            log::warn!("{e}");
            return HttpResponse::NotFound().finish();
        }
    };

    match NamedFile::open(&path) {
        Ok(named) => named.into_response(&req),
        Err(e) => {
            log::error!("Failed to open {}: {e}", path.display());
            HttpResponse::NotFound().finish()
        }
    }
}

/// `POST /api/sessions`
///
/// Opens a reactive session and returns the initial value of every output.
pub async fn create_session(state: web::Data<AppState>) -> HttpResponse {
    let mut graph = match build_session(state.app, &state.store, &state.images, state.years) {
        Ok(graph) => graph,
        Err(e) => {
            log::error!("Failed to build session: {e}");
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to create session"
            }));
        }
    };

    let outputs = to_api_outputs(graph.flush());
    let id = state.sessions.insert(graph);

    HttpResponse::Ok().json(ApiSession {
        session_id: id.to_string(),
        outputs,
    })
}

/// `POST /api/sessions/{id}/inputs`
///
/// Sets one input and returns the outputs that were recomputed because of
/// it (none if the value did not change).
pub async fn update_input(
    state: web::Data<AppState>,
    id: web::Path<String>,
    update: web::Json<InputUpdate>,
) -> HttpResponse {
    let Some((id, session)) = Uuid::parse_str(&id)
        .ok()
        .and_then(|id| state.sessions.get(&id).map(|s| (id, s)))
    else {
        return session_not_found();
    };

    let InputUpdate { name, value } = update.into_inner();

    if let Err(message) = validate_input(&name, &value) {
        return HttpResponse::BadRequest().json(serde_json::json!({ "error": message }));
    }

    let mut graph = session.lock().unwrap_or_else(PoisonError::into_inner);

    if let Err(e) = graph.set_input(&name, value) {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": e.to_string()
        }));
    }

    let outputs = to_api_outputs(graph.flush());
    drop(graph);

    HttpResponse::Ok().json(ApiSession {
        session_id: id.to_string(),
        outputs,
    })
}

/// `DELETE /api/sessions/{id}`
pub async fn delete_session(state: web::Data<AppState>, id: web::Path<String>) -> HttpResponse {
    match Uuid::parse_str(&id) {
        Ok(id) if state.sessions.remove(&id) => HttpResponse::NoContent().finish(),
        _ => session_not_found(),
    }
}

fn session_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": "Session not found"
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test, web};
    use vacancy_map_server_models::{ApiOutputBody, ApiSummary};
    use vacancy_map_store::RecordStore;
    use vacancy_map_vacancy_models::GeometryPolicy;

    use super::*;
    use crate::config::{AppKind, ServerConfig};

    const SAMPLE: &str = "issued_date,longitude,latitude,property_address\n\
                          2015-03-12,-87.6278,41.8827,100 N STATE ST\n\
                          2015-07-01,-87.6341,41.8819,200 W MADISON ST\n\
                          2020-01-05,-87.6365,41.8776,300 S WACKER DR\n";

    fn state(app: AppKind, image_dir: &std::path::Path) -> web::Data<AppState> {
        state_with_ttl(app, image_dir, crate::session::DEFAULT_SESSION_TTL)
    }

    fn state_with_ttl(
        app: AppKind,
        image_dir: &std::path::Path,
        session_ttl: std::time::Duration,
    ) -> web::Data<AppState> {
        let config = ServerConfig {
            data_path: "vacant.csv".into(),
            image_dir: image_dir.to_path_buf(),
            app,
            geometry_policy: GeometryPolicy::DropAtLoad,
            year_min: None,
            year_max: None,
            bind_addr: "127.0.0.1".to_string(),
            port: 0,
            session_ttl,
        };
        let store = RecordStore::from_reader(SAMPLE.as_bytes(), config.geometry_policy).unwrap();
        web::Data::new(AppState::new(&config, store))
    }

    #[actix_web::test]
    async fn health_reports_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(AppKind::Tabs, dir.path()))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: ApiHealth = test::call_and_read_body_json(&app, req).await;
        assert!(body.healthy);
    }

    #[actix_web::test]
    async fn summary_describes_store() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(AppKind::Tabs, dir.path()))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/summary").to_request();
        let body: ApiSummary = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body,
            ApiSummary {
                record_count: 3,
                min_year: Some(2015),
                max_year: Some(2020),
                geometry_policy: GeometryPolicy::DropAtLoad,
            }
        );
    }

    #[actix_web::test]
    async fn index_serves_configured_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(AppKind::Map, dir.path()))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let html = std::str::from_utf8(&body).unwrap();
        assert!(html.contains(r#"min="2015""#));
        assert!(html.contains(r#"max="2020""#));
        assert!(!html.contains("Area Measure:"));
    }

    #[actix_web::test]
    async fn stateless_map_filters_by_year() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(AppKind::Tabs, dir.path()))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/map?year=2015").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let html = std::str::from_utf8(&body).unwrap();
        assert!(html.contains("200 W MADISON ST"));
        assert!(!html.contains("300 S WACKER DR"));
    }

    #[actix_web::test]
    async fn missing_image_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(AppKind::Tabs, dir.path()))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/image?areaMeasure=tract&wealthMeasure=value")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri("/images/tract_value.png")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn serves_only_known_image_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("zcta_value.png"), b"png").unwrap();
        std::fs::write(dir.path().join("secret.png"), b"png").unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(AppKind::Tabs, dir.path()))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/images/zcta_value.png")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/images/secret.png").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn session_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("zcta_income.png"), b"png").unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(AppKind::Tabs, dir.path()))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::post().uri("/api/sessions").to_request();
        let created: ApiSession = test::call_and_read_body_json(&app, req).await;
        assert_eq!(created.outputs.len(), 2);
        let id = created.session_id;

        // Same value: nothing recomputes.
        let req = test::TestRequest::post()
            .uri(&format!("/api/sessions/{id}/inputs"))
            .set_json(serde_json::json!({ "name": "year", "value": 2015 }))
            .to_request();
        let updated: ApiSession = test::call_and_read_body_json(&app, req).await;
        assert!(updated.outputs.is_empty());

        // Year outside the data: empty base map, not an error.
        let req = test::TestRequest::post()
            .uri(&format!("/api/sessions/{id}/inputs"))
            .set_json(serde_json::json!({ "name": "year", "value": 2011 }))
            .to_request();
        let updated: ApiSession = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated.outputs.len(), 1);
        assert_eq!(updated.outputs[0].name, "map");
        match &updated.outputs[0].body {
            ApiOutputBody::Html { html } => assert!(html.contains("var markers = []")),
            other => panic!("unexpected output: {other:?}"),
        }

        // Missing image surfaces as an error output; the session carries on.
        let req = test::TestRequest::post()
            .uri(&format!("/api/sessions/{id}/inputs"))
            .set_json(serde_json::json!({ "name": "area_measure", "value": "tract" }))
            .to_request();
        let updated: ApiSession = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated.outputs.len(), 1);
        assert!(matches!(
            updated.outputs[0].body,
            ApiOutputBody::Error { .. }
        ));

        let req = test::TestRequest::delete()
            .uri(&format!("/api/sessions/{id}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[actix_web::test]
    async fn rejects_bad_inputs_and_unknown_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(AppKind::Images, dir.path()))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::post().uri("/api/sessions").to_request();
        let created: ApiSession = test::call_and_read_body_json(&app, req).await;
        let id = created.session_id;

        let req = test::TestRequest::post()
            .uri(&format!("/api/sessions/{id}/inputs"))
            .set_json(serde_json::json!({ "name": "area_measure", "value": "county" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // The images dashboard has no year slider.
        let req = test::TestRequest::post()
            .uri(&format!("/api/sessions/{id}/inputs"))
            .set_json(serde_json::json!({ "name": "year", "value": 2015 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/sessions/not-a-session/inputs")
            .set_json(serde_json::json!({ "name": "year", "value": 2015 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn abandoned_sessions_expire() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_ttl(AppKind::Map, dir.path(), std::time::Duration::ZERO);
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .configure(crate::configure),
        )
        .await;

        for _ in 0..20 {
            let req = test::TestRequest::post().uri("/api/sessions").to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        // Only the newest session survives; the rest went idle and were dropped.
        assert_eq!(state.sessions.len(), 1);
    }
}

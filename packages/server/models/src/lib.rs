#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the vacancy map server.
//!
//! These types are serialized to JSON for the dashboard frontend. They are
//! kept apart from the record and render types so the wire contract can
//! evolve on its own.

use serde::{Deserialize, Serialize};
use vacancy_map_vacancy_models::{AreaMeasure, GeometryPolicy, WealthMeasure};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Always `true` when the server responds.
    pub healthy: bool,
    /// Server crate version.
    pub version: String,
}

/// Description of the loaded dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSummary {
    /// Number of records in the store.
    pub record_count: usize,
    /// Earliest derived year, if any records were loaded.
    pub min_year: Option<i32>,
    /// Latest derived year, if any records were loaded.
    pub max_year: Option<i32>,
    /// How rows without coordinates were handled.
    pub geometry_policy: GeometryPolicy,
}

/// Rendered value of one reactive output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ApiOutputBody {
    /// An image to show in an `<img>` element.
    Image {
        /// URL the image is served from.
        src: String,
        /// Alt text.
        alt: String,
        /// CSS width hint.
        width: String,
    },
    /// Markup to inject as-is.
    Html {
        /// The HTML fragment.
        html: String,
    },
    /// The output failed to render; the session is still usable.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

/// A named output and its freshly computed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOutput {
    /// Output name (`map_image` or `map`).
    pub name: String,
    /// Rendered value.
    #[serde(flatten)]
    pub body: ApiOutputBody,
}

/// Response to creating a session or updating one of its inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSession {
    /// Session identifier to use in later requests.
    pub session_id: String,
    /// Outputs that were (re)computed by this request.
    pub outputs: Vec<ApiOutput>,
}

/// Body of `POST /api/sessions/{id}/inputs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputUpdate {
    /// Input name (`area_measure`, `wealth_measure` or `year`).
    pub name: String,
    /// New value.
    pub value: serde_json::Value,
}

/// Query parameters for `GET /api/map`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapQueryParams {
    /// Year to filter records by.
    pub year: i32,
}

/// Query parameters for `GET /api/image`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageQueryParams {
    /// Selected area measure.
    pub area_measure: AreaMeasure,
    /// Selected wealth measure.
    pub wealth_measure: WealthMeasure,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_serializes_with_kind_tag() {
        let output = ApiOutput {
            name: "map_image".to_string(),
            body: ApiOutputBody::Image {
                src: "/images/zcta_income.png".to_string(),
                alt: "Map showing income for zcta".to_string(),
                width: "80%".to_string(),
            },
        };
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "name": "map_image",
                "kind": "image",
                "src": "/images/zcta_income.png",
                "alt": "Map showing income for zcta",
                "width": "80%",
            })
        );
    }

    #[test]
    fn image_params_accept_lowercase_measures() {
        let params: ImageQueryParams =
            serde_json::from_str(r#"{"areaMeasure":"tract","wealthMeasure":"value"}"#).unwrap();
        assert_eq!(params.area_measure, AreaMeasure::Tract);
        assert_eq!(params.wealth_measure, WealthMeasure::Value);
    }
}

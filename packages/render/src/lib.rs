#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Leaflet map rendering and static wealth-map selection.
//!
//! [`map`] turns a filtered slice of vacancy records into a [`map::MapView`]
//! and serializes it to an embeddable HTML fragment. [`image`] maps a pair
//! of dropdown choices to one of the four pre-rendered wealth maps.

pub mod html;
pub mod image;
pub mod map;

pub use image::{ImageDirectory, ResourceNotFoundError, select_image};
pub use map::{MapView, Marker, render_map};

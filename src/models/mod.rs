//! Data models for category groups, placemarks, and marker layers.
//!
//! Models are plain data; the state machine that drives them lives in
//! `services`.

pub mod category;
pub mod layer;
pub mod placemark;
pub mod rgb;

// Re-export all model types
pub use category::{CategoryGroup, FileSpec, DEFAULT_ICON};
pub use layer::{LayerId, MarkerLayer, MarkerRef, MarkerStyle};
pub use placemark::{Coordinates, LatLng, Placemark};
pub use rgb::RgbColor;

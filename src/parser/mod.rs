//! Parsing for geo-annotation files.
//!
//! The core never reparses: files are reduced to `Placemark` records here
//! and only those records flow into the visibility store and resolver.

pub mod kml;

// Re-export commonly used functions
pub use kml::{parse_kml, KmlError};

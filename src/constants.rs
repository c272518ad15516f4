//! Application-wide constants.
//!
//! This module defines the application name and the map and loading
//! defaults shared by the configuration layer and the core.

use crate::models::RgbColor;

/// The display name of the application (human-readable, with proper capitalization).
pub const APP_NAME: &str = "HazardMap";

/// Initial map center (Hakodate city hall area), latitude and longitude.
pub const DEFAULT_CENTER: (f64, f64) = (41.7688, 140.7288);

/// Initial map zoom.
pub const DEFAULT_ZOOM: u8 = 12;

/// Minimum zoom applied when a marker is activated; also the zoom used by
/// deep links that do not carry one.
pub const FOCUS_ZOOM: u8 = 16;

/// Zoom threshold of the fire-water group in the reference configuration.
pub const FIRE_WATER_ZOOM_THRESHOLD: u8 = 16;

/// Maximum distance for nearest-marker resolution, in meters.
pub const NEAREST_RADIUS_METERS: f64 = 2000.0;

/// How long deep-link resolution waits for all files to load.
pub const READY_TIMEOUT_MS: u64 = 5000;

/// Readiness poll interval.
pub const READY_POLL_INTERVAL_MS: u64 = 200;

/// Lower bound on the readiness poll interval.
pub const MIN_POLL_INTERVAL_MS: u64 = 50;

/// Per-file fetch timeout.
pub const FETCH_TIMEOUT_MS: u64 = 10_000;

/// Data file extension.
pub const DATA_FILE_EXTENSION: &str = "kml";

/// Page the list companion links to.
pub const MAP_PAGE: &str = "map.html";

/// Marker palette, cycled by registration index for files without a color.
pub const MARKER_COLORS: [RgbColor; 8] = [
    RgbColor::new(0xe7, 0x4c, 0x3c), // red
    RgbColor::new(0x34, 0x98, 0xdb), // blue
    RgbColor::new(0x2e, 0xcc, 0x71), // green
    RgbColor::new(0xf3, 0x9c, 0x12), // orange
    RgbColor::new(0x9b, 0x59, 0xb6), // purple
    RgbColor::new(0x1a, 0xbc, 0x9c), // teal
    RgbColor::new(0xe6, 0x7e, 0x22), // dark orange
    RgbColor::new(0x95, 0xa5, 0xa6), // gray
];

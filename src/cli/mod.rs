//! CLI command handlers for HazardMap.
//!
//! The binary stands in for the map page and its list companion: `open`
//! resolves a deep link on a headless map, `layers` shows what group and
//! zoom state put on the map, and `list` prints every placemark with its link.

pub mod common;
pub mod config;
pub mod layers;
pub mod list;
pub mod open;

// Re-export types used by main.rs and tests
pub use common::{CliError, CliResult, ExitCode};
pub use config::ConfigArgs;
pub use layers::LayersArgs;
pub use list::ListArgs;
pub use open::OpenArgs;

//! Configuration management for the application.
//!
//! This module handles loading, validating, and saving application configuration
//! in TOML format with platform-specific directory resolution.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    APP_NAME, DEFAULT_CENTER, DEFAULT_ZOOM, FETCH_TIMEOUT_MS, FOCUS_ZOOM, MIN_POLL_INTERVAL_MS,
    NEAREST_RADIUS_METERS, READY_POLL_INTERVAL_MS, READY_TIMEOUT_MS,
};
use crate::models::{CategoryGroup, LatLng};
use crate::services::registry::{reference_groups, CategoryRegistry};

/// Environment variable that overrides the config directory.
pub const CONFIG_DIR_ENV: &str = "HAZARDMAP_CONFIG_DIR";

/// Path configuration for file system locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Directory holding the `.kml` data files
    pub data_dir: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("kml"),
        }
    }
}

/// Map view defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Initial zoom
    #[serde(default = "default_zoom")]
    pub default_zoom: u8,
    /// Minimum zoom applied on marker activation; zoom for deep links without one
    #[serde(default = "focus_zoom")]
    pub focus_zoom: u8,
    /// Search radius for nearest-marker resolution, in meters
    #[serde(default = "nearest_radius_m")]
    pub nearest_radius_m: f64,
    /// Initial center
    #[serde(default = "default_center")]
    pub center: LatLng,
}

const fn default_zoom() -> u8 {
    DEFAULT_ZOOM
}

const fn focus_zoom() -> u8 {
    FOCUS_ZOOM
}

const fn nearest_radius_m() -> f64 {
    NEAREST_RADIUS_METERS
}

const fn default_center() -> LatLng {
    LatLng::new(DEFAULT_CENTER.0, DEFAULT_CENTER.1)
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_zoom: default_zoom(),
            focus_zoom: focus_zoom(),
            nearest_radius_m: nearest_radius_m(),
            center: default_center(),
        }
    }
}

/// Load and readiness timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadingConfig {
    /// How long deep-link resolution waits for every file to load
    pub ready_timeout_ms: u64,
    /// Readiness poll interval (raised to the minimum if lower)
    pub poll_interval_ms: u64,
    /// Per-file fetch timeout
    pub fetch_timeout_ms: u64,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            ready_timeout_ms: READY_TIMEOUT_MS,
            poll_interval_ms: READY_POLL_INTERVAL_MS,
            fetch_timeout_ms: FETCH_TIMEOUT_MS,
        }
    }
}

impl LoadingConfig {
    /// Readiness timeout.
    #[must_use]
    pub const fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    /// Readiness poll interval, clamped to the minimum.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    /// Per-file fetch timeout.
    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

/// Application configuration.
///
/// # File Location
///
/// - Linux: `~/.config/HazardMap/config.toml`
/// - macOS: `~/Library/Application Support/HazardMap/config.toml`
/// - Windows: `%APPDATA%\HazardMap\config.toml`
///
/// `HAZARDMAP_CONFIG_DIR` replaces the directory when set.
///
/// # Validation
///
/// - timeouts must be non-zero
/// - `nearest_radius_m` must be a positive number
/// - `center` must be a valid coordinate
/// - `groups` must form a valid category registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// File system paths
    #[serde(default)]
    pub paths: PathConfig,
    /// Map view defaults
    #[serde(default)]
    pub map: MapConfig,
    /// Load timing
    #[serde(default)]
    pub loading: LoadingConfig,
    /// Category groups; the reference configuration when absent
    #[serde(default = "reference_groups")]
    pub groups: Vec<CategoryGroup>,
}

impl Config {
    /// Creates a new Config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            paths: PathConfig::default(),
            map: MapConfig::default(),
            loading: LoadingConfig::default(),
            groups: reference_groups(),
        }
    }

    /// Checks if the config file exists on disk.
    #[must_use]
    pub fn exists() -> bool {
        Self::config_file_path()
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    /// Gets the config directory path.
    ///
    /// - Linux: `~/.config/HazardMap/`
    /// - macOS: `~/Library/Application Support/HazardMap/`
    /// - Windows: `%APPDATA%\HazardMap\`
    pub fn config_dir() -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(PathBuf::from(dir));
        }

        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(APP_NAME);

        Ok(config_dir)
    }

    /// Gets the full path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads configuration from the config file.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        if !config_path.exists() {
            return Ok(Self::new());
        }

        Self::load_from(&config_path)
    }

    /// Loads and validates configuration from an explicit path.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path).context(format!(
            "Failed to read config file: {}",
            config_path.display()
        ))?;

        let config: Self = toml::from_str(&content).context(format!(
            "Failed to parse config file: {}",
            config_path.display()
        ))?;

        config.validate().context(format!(
            "Invalid config file: {}",
            config_path.display()
        ))?;

        Ok(config)
    }

    /// Saves configuration to the config file using atomic write.
    ///
    /// Uses temp file + rename pattern for atomic writes.
    pub fn save(&self) -> Result<()> {
        self.validate()?;

        // Ensure config directory exists
        let config_dir = Self::config_dir()?;
        fs::create_dir_all(&config_dir).context(format!(
            "Failed to create config directory: {}",
            config_dir.display()
        ))?;

        // Serialize to TOML
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        let config_path = Self::config_file_path()?;
        let temp_path = config_path.with_extension("toml.tmp");

        // Write to temp file
        fs::write(&temp_path, content).context(format!(
            "Failed to write temp config file: {}",
            temp_path.display()
        ))?;

        // Atomic rename
        fs::rename(&temp_path, &config_path).context(format!(
            "Failed to rename temp config file to: {}",
            config_path.display()
        ))?;

        Ok(())
    }

    /// Validates configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.loading.ready_timeout_ms == 0 {
            anyhow::bail!("loading.ready_timeout_ms must be greater than zero");
        }
        if self.loading.fetch_timeout_ms == 0 {
            anyhow::bail!("loading.fetch_timeout_ms must be greater than zero");
        }

        let radius = self.map.nearest_radius_m;
        if !radius.is_finite() || radius <= 0.0 {
            anyhow::bail!("map.nearest_radius_m must be a positive number, got {radius}");
        }
        if !self.map.center.is_valid() {
            anyhow::bail!(
                "map.center is not a valid coordinate: {}, {}",
                self.map.center.lat,
                self.map.center.lon
            );
        }

        self.registry()?;
        Ok(())
    }

    /// Builds the category registry from `groups`.
    pub fn registry(&self) -> Result<CategoryRegistry> {
        CategoryRegistry::new(self.groups.clone()).context("Invalid category groups")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

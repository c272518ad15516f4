//! Shared test fixtures for integration and E2E CLI tests.
#![allow(dead_code)] // Not every test binary uses every fixture

use hazardmap::services::{FileSource, LoadError};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tempfile::TempDir;

/// Hakodate city hall area, the default map center.
pub const CENTER: (f64, f64) = (41.7688, 140.7288);

/// Renders a KML document with one point placemark per `(name, lat, lon)`.
pub fn kml(placemarks: &[(&str, f64, f64)]) -> String {
    let mut body = String::new();
    for (name, lat, lon) in placemarks {
        body.push_str(&format!(
            "    <Placemark>\n      <name>{name}</name>\n      <description>{name} info</description>\n      \
             <Point><coordinates>{lon},{lat},0</coordinates></Point>\n    </Placemark>\n"
        ));
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<kml xmlns=\"http://www.opengis.net/kml/2.2\">\n  \
         <Document>\n{body}  </Document>\n</kml>\n"
    )
}

/// Placemarks for every file of the reference configuration.
///
/// 前進拠点 and 医療機関 both have a placemark named 市立函館病院; only the
/// one in 前進拠点 sits on the map center.
pub fn reference_data() -> Vec<(&'static str, String)> {
    vec![
        ("防火水槽", kml(&[("防火水槽-1", 41.7689, 140.7289)])),
        ("地上式", kml(&[("H-101", 41.7690, 140.7290), ("H-102", 41.7700, 140.7300)])),
        ("地下式", kml(&[("U-201", 41.7710, 140.7320)])),
        ("拠点【航空部隊】", kml(&[("函館空港", 41.7700, 140.8220)])),
        ("拠点【地上部隊】", kml(&[("千代台公園", 41.7830, 140.7470)])),
        ("宿営可能地", kml(&[("緑の島", 41.7740, 140.7160)])),
        ("前進拠点", kml(&[("市立函館病院", CENTER.0, CENTER.1)])),
        ("ヘリ離発着", kml(&[("函館市消防本部", 41.7860, 140.7560)])),
        (
            "医療機関",
            kml(&[("市立函館病院", 41.7897, 140.7574), ("共愛会病院", 41.7800, 140.7350)]),
        ),
        ("給油【航空部隊】", kml(&[("空港給油所", 41.7710, 140.8200)])),
        ("給油【地上部隊】", kml(&[("港町給油所", 41.8000, 140.7100)])),
    ]
}

/// Writes `<dir>/<file_id>.kml`.
pub fn write_kml(dir: &Path, file_id: &str, content: &str) -> PathBuf {
    let path = dir.join(format!("{file_id}.kml"));
    fs::write(&path, content).expect("Failed to write KML fixture");
    path
}

/// A temp directory holding every reference data file.
pub fn reference_data_dir() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for (file_id, content) in reference_data() {
        write_kml(dir.path(), file_id, &content);
    }
    dir
}

/// In-memory file source with optional per-file delays and failures.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    files: HashMap<String, String>,
    delays: HashMap<String, Duration>,
}

impl MemorySource {
    /// Source serving the full reference data set.
    pub fn reference() -> Self {
        let mut source = Self::default();
        for (file_id, content) in reference_data() {
            source = source.with_file(file_id, content);
        }
        source
    }

    pub fn with_file(mut self, file_id: &str, content: impl Into<String>) -> Self {
        self.files.insert(file_id.to_string(), content.into());
        self
    }

    pub fn without_file(mut self, file_id: &str) -> Self {
        self.files.remove(file_id);
        self
    }

    pub fn with_delay(mut self, file_id: &str, delay: Duration) -> Self {
        self.delays.insert(file_id.to_string(), delay);
        self
    }
}

impl FileSource for MemorySource {
    async fn fetch_text(&self, file_id: &str) -> Result<String, LoadError> {
        if let Some(delay) = self.delays.get(file_id) {
            tokio::time::sleep(*delay).await;
        }
        self.files.get(file_id).cloned().ok_or_else(|| LoadError::Fetch {
            file_id: file_id.to_string(),
            message: "404 Not Found".to_string(),
        })
    }
}

/// Path to the hazardmap binary
pub fn hazardmap_bin() -> &'static str {
    env!("CARGO_BIN_EXE_hazardmap")
}

/// Creates a Command with an isolated config directory.
pub fn isolated_command(args: &[&str], config_dir: &Path) -> Command {
    let mut cmd = Command::new(hazardmap_bin());
    cmd.env("HAZARDMAP_CONFIG_DIR", config_dir);
    cmd.env_remove("RUST_LOG");
    cmd.args(args);
    cmd
}

//! Loading data files: fetch the text, parse it, build the marker layer.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::constants::DATA_FILE_EXTENSION;
use crate::models::{MarkerLayer, MarkerStyle};
use crate::parser::{parse_kml, KmlError};

/// Why a single file failed to load.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file text could not be fetched.
    #[error("failed to fetch '{file_id}': {message}")]
    Fetch {
        /// File that failed
        file_id: String,
        /// Cause as reported by the source
        message: String,
    },
    /// The file text is not usable KML.
    #[error("failed to parse '{file_id}': {source}")]
    Parse {
        /// File that failed
        file_id: String,
        /// Parser error
        #[source]
        source: KmlError,
    },
}

/// Where data file text comes from.
#[allow(async_fn_in_trait)]
pub trait FileSource {
    /// Fetches the raw text of `file_id`.
    async fn fetch_text(&self, file_id: &str) -> Result<String, LoadError>;
}

/// Reads `<dir>/<file_id>.kml` from the local filesystem.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    timeout: Duration,
}

impl DirectorySource {
    /// Creates a source rooted at `dir` with a per-file read timeout.
    pub fn new(dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            dir: dir.into(),
            timeout,
        }
    }

    /// Path of the file backing `file_id`.
    #[must_use]
    pub fn path_of(&self, file_id: &str) -> PathBuf {
        self.dir.join(format!("{file_id}.{DATA_FILE_EXTENSION}"))
    }
}

impl FileSource for DirectorySource {
    async fn fetch_text(&self, file_id: &str) -> Result<String, LoadError> {
        let path = self.path_of(file_id);
        let fetch_err = |message: String| LoadError::Fetch {
            file_id: file_id.to_string(),
            message,
        };

        match tokio::time::timeout(self.timeout, tokio::fs::read_to_string(&path)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(fetch_err(format!("{}: {e}", path.display()))),
            Err(_) => Err(fetch_err(format!(
                "timed out after {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}

/// Fetches, parses and builds the layer for one file.
pub async fn load_file<S: FileSource>(
    source: &S,
    file_id: &str,
    style: MarkerStyle,
) -> Result<MarkerLayer, LoadError> {
    let text = source.fetch_text(file_id).await?;
    let placemarks = parse_kml(&text, file_id).map_err(|source| LoadError::Parse {
        file_id: file_id.to_string(),
        source,
    })?;
    debug!(file = file_id, placemarks = placemarks.len(), "built layer");
    Ok(MarkerLayer::new(file_id, style, placemarks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RgbColor;
    use std::fs;
    use tempfile::TempDir;

    fn style() -> MarkerStyle {
        MarkerStyle {
            icon: "place".to_string(),
            color: RgbColor::new(0, 0, 0),
        }
    }

    #[tokio::test]
    async fn test_load_file_from_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("医療機関.kml"),
            "<kml><Placemark><name>A</name><Point><coordinates>140.7,41.7</coordinates></Point></Placemark></kml>",
        )
        .unwrap();

        let source = DirectorySource::new(dir.path(), Duration::from_secs(1));
        let layer = load_file(&source, "医療機関", style()).await.unwrap();
        assert_eq!(layer.file_id(), "医療機関");
        assert_eq!(layer.markers().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_fetch_error() {
        let dir = TempDir::new().unwrap();
        let source = DirectorySource::new(dir.path(), Duration::from_secs(1));
        let err = load_file(&source, "missing", style()).await.unwrap_err();
        assert!(matches!(err, LoadError::Fetch { .. }));
        assert!(err.to_string().contains("missing"));
    }

    #[tokio::test]
    async fn test_bad_xml_is_parse_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.kml"), "<kml><Placemark><name>x</nam>").unwrap();
        let source = DirectorySource::new(dir.path(), Duration::from_secs(1));
        let err = load_file(&source, "bad", style()).await.unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }
}

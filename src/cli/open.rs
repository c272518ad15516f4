//! Open command: resolves a deep link the way the map page does on load.

use crate::cli::common::{load_config, print_json, run_local, CliError, CliResult};
use crate::map::{HeadlessMap, MapWidget};
use crate::models::LatLng;
use crate::services::{Activation, DeepLink, DirectorySource, MatchKind, Readiness, Session};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::info;

/// Open a deep link on a headless map and report the activated marker
#[derive(Debug, Clone, Args)]
pub struct OpenArgs {
    /// Deep link (full URL, map.html?... or bare query string)
    #[arg(value_name = "LINK")]
    pub link: Option<String>,

    /// Target latitude (overrides the link)
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Target longitude (overrides the link)
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Initial zoom (defaults to the focus zoom)
    #[arg(long)]
    pub zoom: Option<u8>,

    /// Data file id for an exact match
    #[arg(long, value_name = "FILE_ID")]
    pub file: Option<String>,

    /// Placemark name for an exact match
    #[arg(long, value_name = "NAME")]
    pub placemark: Option<String>,

    /// Directory holding the .kml files (overrides config)
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Readiness timeout in milliseconds (overrides config)
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ViewOutput {
    center: LatLng,
    zoom: u8,
}

#[derive(Debug, Serialize)]
struct OpenOutput {
    link: DeepLink,
    readiness: Readiness,
    ready_files: usize,
    total_files: usize,
    #[serde(rename = "match")]
    match_kind: Option<MatchKind>,
    activation: Option<Activation>,
    view: ViewOutput,
}

impl OpenArgs {
    /// Builds the target from the positional link and the flags.
    fn deep_link(&self) -> CliResult<DeepLink> {
        let mut link = match &self.link {
            Some(raw) => DeepLink::parse(raw).ok_or_else(|| {
                CliError::validation(format!("Link has no valid lat/lon: {raw}"))
            })?,
            None => match (self.lat, self.lon) {
                (Some(lat), Some(lon)) => DeepLink::at(lat, lon),
                _ => {
                    return Err(CliError::validation(
                        "Either a LINK or both --lat and --lon must be given",
                    ))
                }
            },
        };

        if let Some(lat) = self.lat {
            link.lat = lat;
        }
        if let Some(lon) = self.lon {
            link.lon = lon;
        }
        if !link.target().is_valid() {
            return Err(CliError::validation(format!(
                "Invalid coordinate: {}, {}",
                link.lat, link.lon
            )));
        }
        if self.zoom.is_some() {
            link.zoom = self.zoom;
        }
        if let Some(file) = &self.file {
            link.file = Some(file.clone());
        }
        if let Some(placemark) = &self.placemark {
            link.placemark = Some(placemark.clone());
        }
        Ok(link)
    }

    /// Execute the open command
    pub fn execute(&self) -> CliResult<()> {
        let link = self.deep_link()?;
        let config = load_config()?;
        let registry = config
            .registry()
            .map_err(|e| CliError::validation(format!("{e:#}")))?;
        let data_dir = self
            .data_dir
            .clone()
            .unwrap_or_else(|| config.paths.data_dir.clone());
        if !data_dir.is_dir() {
            return Err(CliError::io(format!(
                "Data directory not found: {}",
                data_dir.display()
            )));
        }

        let timeout = self
            .timeout_ms
            .map_or_else(|| config.loading.ready_timeout(), std::time::Duration::from_millis);
        let map = HeadlessMap::new(config.map.center, config.map.default_zoom);
        let session = Session::new(registry, map)
            .map_err(|e| CliError::validation(format!("Invalid category groups: {e}")))?;

        // The view moves to the link target before any data is loaded
        session.set_view(link.target(), link.zoom_or(config.map.focus_zoom));

        let source = Rc::new(DirectorySource::new(data_dir, config.loading.fetch_timeout()));
        let readiness = run_local(async {
            session.load_all(source);
            session
                .wait_all_ready(timeout, config.loading.poll_interval())
                .await
        })?;
        info!(?readiness, "data load finished");

        let found = session.resolve(&link, config.map.nearest_radius_m, config.map.focus_zoom);

        let (ready_files, total_files) = {
            let store = session.store();
            (store.ready_count(), store.len())
        };
        let view = {
            let map = session.map();
            ViewOutput {
                center: map.center(),
                zoom: map.current_zoom(),
            }
        };
        let (match_kind, activation) = match found {
            Some((kind, activation)) => (Some(kind), Some(activation)),
            None => (None, None),
        };
        let output = OpenOutput {
            link,
            readiness,
            ready_files,
            total_files,
            match_kind,
            activation,
            view,
        };

        if self.json {
            print_json(&output)?;
        } else {
            output_human_readable(&output);
        }

        if output.activation.is_none() {
            return Err(CliError::not_found(format!(
                "No marker found near {}, {}",
                output.link.lat, output.link.lon
            )));
        }
        Ok(())
    }
}

fn output_human_readable(output: &OpenOutput) {
    let readiness = match output.readiness {
        Readiness::AllReady => "all files ready",
        Readiness::TimedOut => "timed out, using partial data",
    };
    println!(
        "Loaded {}/{} files ({readiness})",
        output.ready_files, output.total_files
    );

    match (&output.match_kind, &output.activation) {
        (Some(kind), Some(a)) => {
            let how = match kind {
                MatchKind::Exact => "exact match".to_string(),
                MatchKind::Nearest => {
                    format!("nearest, {:.1} m", a.distance_m.unwrap_or_default())
                }
            };
            println!("Opened: {} / {} ({how})", a.file_id, a.placemark);
        }
        _ => println!("Nothing found at this location"),
    }

    println!(
        "View: {:.6}, {:.6} @ zoom {}",
        output.view.center.lat, output.view.center.lon, output.view.zoom
    );
}

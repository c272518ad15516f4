//! Layers command: applies toggles and zoom, then reports what is on the map.

use crate::cli::common::{load_config, print_json, run_local, CliError, CliResult};
use crate::map::{HeadlessMap, MapWidget};
use crate::models::RgbColor;
use crate::services::{DirectorySource, LoadState, Readiness, Session};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::rc::Rc;

/// Show group and file visibility after applying toggles
#[derive(Debug, Clone, Args)]
pub struct LayersArgs {
    /// Map zoom to evaluate zoom gates at
    #[arg(long)]
    pub zoom: Option<u8>,

    /// Enable a group (repeatable)
    #[arg(long, value_name = "GROUP")]
    pub enable: Vec<String>,

    /// Disable a group (repeatable)
    #[arg(long, value_name = "GROUP")]
    pub disable: Vec<String>,

    /// Show a single file (repeatable)
    #[arg(long, value_name = "FILE_ID")]
    pub show: Vec<String>,

    /// Hide a single file (repeatable)
    #[arg(long, value_name = "FILE_ID")]
    pub hide: Vec<String>,

    /// Directory holding the .kml files (overrides config)
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct FileState {
    file_id: String,
    status: &'static str,
    visible: bool,
    attached: bool,
    placemarks: usize,
    icon: String,
    color: RgbColor,
}

#[derive(Debug, Serialize)]
struct GroupReport {
    key: String,
    title: String,
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    zoom_gate: Option<u8>,
    gate_open: bool,
    files: Vec<FileState>,
}

#[derive(Debug, Serialize)]
struct LayersOutput {
    zoom: u8,
    readiness: Readiness,
    groups: Vec<GroupReport>,
}

impl LayersArgs {
    /// Execute the layers command
    pub fn execute(&self) -> CliResult<()> {
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

        let map = HeadlessMap::new(config.map.center, config.map.default_zoom);
        let session = Session::new(registry, map)
            .map_err(|e| CliError::validation(format!("Invalid category groups: {e}")))?;

        let source = Rc::new(DirectorySource::new(data_dir, config.loading.fetch_timeout()));
        let readiness = run_local(async {
            session.load_all(source);
            session
                .wait_all_ready(config.loading.ready_timeout(), config.loading.poll_interval())
                .await
        })?;

        // Group toggles first so per-file flags can refine them
        for key in &self.enable {
            session
                .set_group_enabled(key, true)
                .map_err(|e| CliError::validation(e.to_string()))?;
        }
        for key in &self.disable {
            session
                .set_group_enabled(key, false)
                .map_err(|e| CliError::validation(e.to_string()))?;
        }
        for file_id in &self.show {
            session
                .set_file_visible(file_id, true)
                .map_err(|e| CliError::validation(e.to_string()))?;
        }
        for file_id in &self.hide {
            session
                .set_file_visible(file_id, false)
                .map_err(|e| CliError::validation(e.to_string()))?;
        }
        if let Some(zoom) = self.zoom {
            session.zoom_to(zoom);
        }

        let output = build_output(&session, readiness);
        if self.json {
            print_json(&output)?;
        } else {
            output_human_readable(&output);
        }
        Ok(())
    }
}

fn build_output(session: &Session<HeadlessMap>, readiness: Readiness) -> LayersOutput {
    let zoom = session.map().current_zoom();
    let store = session.store();
    let groups = store
        .groups()
        .iter()
        .map(|group| GroupReport {
            key: group.key().to_string(),
            title: group.title().to_string(),
            enabled: group.is_user_enabled(),
            zoom_gate: group.zoom_threshold(),
            gate_open: group.gate_open(zoom),
            files: store
                .members_of(group)
                .filter_map(|entry| {
                    // Loaded layers carry their style; pending ones ask the registry
                    let style = entry
                        .layer()
                        .map(|l| l.style().clone())
                        .or_else(|| session.registry().style_of(entry.file_id()))?;
                    Some((entry, style))
                })
                .map(|(entry, style)| FileState {
                    file_id: entry.file_id().to_string(),
                    status: match entry.load_state() {
                        LoadState::Pending => "pending",
                        LoadState::Ready => "ready",
                        LoadState::Failed => "failed",
                    },
                    visible: entry.is_visible(),
                    attached: session.is_attached(entry.file_id()),
                    placemarks: entry.layer().map_or(0, |l| l.markers().len()),
                    icon: style.icon,
                    color: style.color,
                })
                .collect(),
        })
        .collect();

    LayersOutput {
        zoom,
        readiness,
        groups,
    }
}

fn output_human_readable(output: &LayersOutput) {
    println!("Zoom: {}", output.zoom);
    println!();
    for group in &output.groups {
        let gate = match group.zoom_gate {
            Some(t) if group.gate_open => format!(", zoom gate {t} open"),
            Some(t) => format!(", zoom gate {t} closed"),
            None => String::new(),
        };
        let state = if group.enabled { "on" } else { "off" };
        println!("{} ({}) [{state}{gate}]", group.title, group.key);

        for file in &group.files {
            let mark = if file.attached { "*" } else { " " };
            let visible = if file.visible { "visible" } else { "hidden" };
            println!(
                "  [{mark}] {:<20} {visible:<7} {} ({} placemarks) {} {}",
                file.file_id, file.status, file.placemarks, file.color, file.icon
            );
        }
        println!();
    }
    println!("[*] = attached to the map");
}

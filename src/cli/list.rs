//! List command: prints every placemark of the listed data files as text.

use crate::cli::common::{load_config, print_json, run_local, CliError, CliResult};
use crate::models::Placemark;
use crate::services::{load_file, DeepLink, DirectorySource};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

/// List placemarks with deep links into the map
#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Directory holding the .kml files (overrides config)
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Include groups hidden from the list (fire-water sources)
    #[arg(long)]
    pub all: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Listing of one data file
#[derive(Debug, Serialize)]
struct FileListing {
    file_id: String,
    group: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    placemarks: Vec<PlacemarkListing>,
}

/// Listing of one placemark
#[derive(Debug, Serialize)]
struct PlacemarkListing {
    #[serde(flatten)]
    placemark: Placemark,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<String>,
}

impl PlacemarkListing {
    /// Pairs a placemark with its map link, opened at `zoom`.
    fn new(file_id: &str, placemark: Placemark, zoom: u8) -> Self {
        let link = placemark.coordinates.map(|c| {
            DeepLink::at(c.latitude, c.longitude)
                .with_zoom(zoom)
                .with_target(file_id, placemark.name.clone())
                .to_link()
        });
        Self { placemark, link }
    }
}

#[derive(Debug, Serialize)]
struct ListOutput {
    files: Vec<FileListing>,
    total: usize,
}

impl ListArgs {
    /// Execute the list command
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
        let source = DirectorySource::new(data_dir, config.loading.fetch_timeout());
        let focus_zoom = config.map.focus_zoom;

        let file_ids: Vec<String> = if self.all {
            registry.list_all_files()
        } else {
            registry.listed_files()
        }
        .into_iter()
        .map(str::to_string)
        .collect();

        // One file at a time, in registry order
        let files = run_local(async {
            let mut files = Vec::with_capacity(file_ids.len());
            for file_id in &file_ids {
                let group = registry
                    .group_of(file_id)
                    .map(|g| g.title.clone())
                    .unwrap_or_default();
                let Some(style) = registry.style_of(file_id) else {
                    continue;
                };
                let listing = match load_file(&source, file_id, style).await {
                    Ok(layer) => FileListing {
                        file_id: file_id.clone(),
                        group,
                        status: "ok",
                        error: None,
                        placemarks: layer
                            .markers()
                            .iter()
                            .cloned()
                            .map(|p| PlacemarkListing::new(file_id, p, focus_zoom))
                            .collect(),
                    },
                    Err(e) => FileListing {
                        file_id: file_id.clone(),
                        group,
                        status: "error",
                        error: Some(e.to_string()),
                        placemarks: Vec::new(),
                    },
                };
                files.push(listing);
            }
            files
        })?;

        let total = files.iter().map(|f| f.placemarks.len()).sum();
        let output = ListOutput { files, total };

        if self.json {
            print_json(&output)?;
        } else {
            output_human_readable(&output);
        }
        Ok(())
    }
}

fn output_human_readable(output: &ListOutput) {
    for file in &output.files {
        println!("== {} [{}] ==", file.file_id, file.group);
        match &file.error {
            Some(e) => println!("error: {e}"),
            None => println!("ok ({} placemarks)", file.placemarks.len()),
        }

        for item in &file.placemarks {
            let p = &item.placemark;
            println!("  - {}", p.name);
            if !p.description.is_empty() {
                println!("    {}", p.description);
            }
            if let Some(c) = &p.coordinates {
                match c.altitude {
                    Some(alt) => println!(
                        "    {:.6}, {:.6} (alt {alt:.2})",
                        c.latitude, c.longitude
                    ),
                    None => println!("    {:.6}, {:.6}", c.latitude, c.longitude),
                }
            }
            if let Some(link) = &item.link {
                println!("    {link}");
            }
        }
        println!();
    }
    println!("Total: {} placemarks", output.total);
}

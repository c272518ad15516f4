//! Configuration management CLI commands.

use crate::cli::common::{load_config, print_json, CliError, CliResult};
use crate::config::Config;
use crate::models::CategoryGroup;
use clap::{Args, Subcommand};
use serde::Serialize;

/// Configuration management commands
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Display current configuration
    Show(ConfigShowArgs),
    /// Print the config file path
    Path,
    /// Write the default configuration to the config file
    Init(ConfigInitArgs),
}

/// Display current configuration
#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Write the default configuration
#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    force: bool,
}

/// JSON-serializable configuration for output
#[derive(Serialize, Debug)]
struct ConfigOutput<'a> {
    paths: PathsOutput,
    map: &'a crate::config::MapConfig,
    loading: &'a crate::config::LoadingConfig,
    groups: &'a [CategoryGroup],
}

#[derive(Serialize, Debug)]
struct PathsOutput {
    data_dir: String,
}

impl ConfigArgs {
    /// Execute config subcommand
    pub fn execute(&self) -> CliResult<()> {
        match &self.command {
            ConfigCommand::Show(args) => args.execute(),
            ConfigCommand::Path => {
                let path = Config::config_file_path()
                    .map_err(|e| CliError::io(format!("Failed to locate config file: {e}")))?;
                println!("{}", path.display());
                Ok(())
            }
            ConfigCommand::Init(args) => args.execute(),
        }
    }
}

impl ConfigShowArgs {
    /// Execute show command
    pub fn execute(&self) -> CliResult<()> {
        let config = load_config()?;

        if self.json {
            print_json(&ConfigOutput {
                paths: PathsOutput {
                    data_dir: config.paths.data_dir.to_string_lossy().to_string(),
                },
                map: &config.map,
                loading: &config.loading,
                groups: &config.groups,
            })?;
        } else {
            output_human_readable(&config);
        }

        Ok(())
    }
}

impl ConfigInitArgs {
    /// Execute init command
    pub fn execute(&self) -> CliResult<()> {
        if Config::exists() && !self.force {
            return Err(CliError::validation(
                "Config file already exists (use --force to overwrite)",
            ));
        }

        let config = Config::new();
        config
            .save()
            .map_err(|e| CliError::io(format!("Failed to save configuration: {e:#}")))?;

        let path = Config::config_file_path()
            .map_err(|e| CliError::io(format!("Failed to locate config file: {e}")))?;
        println!("Wrote default configuration to {}", path.display());
        Ok(())
    }
}

/// Output configuration in human-readable format
fn output_human_readable(config: &Config) {
    println!("HazardMap Configuration");
    println!("=======================");
    println!();

    println!("Paths:");
    println!("  Data Directory: {}", config.paths.data_dir.display());
    println!();

    println!("Map:");
    println!(
        "  Center: {:.4}, {:.4}",
        config.map.center.lat, config.map.center.lon
    );
    println!("  Default Zoom: {}", config.map.default_zoom);
    println!("  Focus Zoom: {}", config.map.focus_zoom);
    println!("  Nearest Radius: {} m", config.map.nearest_radius_m);
    println!();

    println!("Loading:");
    println!("  Ready Timeout: {} ms", config.loading.ready_timeout_ms);
    println!("  Poll Interval: {} ms", config.loading.poll_interval_ms);
    println!("  Fetch Timeout: {} ms", config.loading.fetch_timeout_ms);
    println!();

    println!("Groups:");
    for group in &config.groups {
        let mut flags = vec![if group.default_enabled { "on" } else { "off" }.to_string()];
        if let Some(t) = group.zoom_gate {
            flags.push(format!("zoom >= {t}"));
        }
        if !group.listed {
            flags.push("unlisted".to_string());
        }
        println!("  {} ({}) [{}]", group.title, group.key, flags.join(", "));
        for file in &group.files {
            let color = file
                .color
                .map_or_else(|| "palette".to_string(), |c| c.to_hex());
            println!("    - {} ({}, {color})", file.id, file.icon);
        }
    }
    println!();
}

//! HazardMap - headless shell for the hazard map viewer core
//!
//! Resolves deep links against the KML data set, reports layer visibility
//! under group and zoom toggles, and lists placemarks the way the list page
//! does.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hazardmap::cli::{CliResult, ConfigArgs, ExitCode, LayersArgs, ListArgs, OpenArgs};

/// HazardMap - disaster-response map data tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List placemarks with deep links into the map
    List(ListArgs),
    /// Resolve a deep link and report the activated marker
    Open(OpenArgs),
    /// Show group and file visibility after applying toggles
    Layers(LayersArgs),
    /// Configuration management
    Config(ConfigArgs),
}

impl Command {
    fn execute(&self) -> CliResult<()> {
        match self {
            Self::List(args) => args.execute(),
            Self::Open(args) => args.execute(),
            Self::Layers(args) => args.execute(),
            Self::Config(args) => args.execute(),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so --json output stays clean
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let code = match cli.command.execute() {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code
        }
    };
    std::process::exit(code.code());
}

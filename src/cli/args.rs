//! CLI argument definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Insect detection and species identification HTTP service.
#[derive(Debug, Parser)]
#[command(name = "insectid-api")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Options for serving the API.
    #[command(flatten)]
    pub serve: ServeArgs,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Arguments for running the server.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Configuration file (default: platform config directory).
    #[arg(long, env = "INSECTID_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind.
    #[arg(long, env = "INSECTID_HOST")]
    pub host: Option<String>,

    /// Port to listen on.
    #[arg(short, long, env = "INSECTID_PORT")]
    pub port: Option<u16>,

    /// Enable debug logging.
    #[arg(long, env = "INSECTID_DEBUG")]
    pub debug: bool,

    /// Path to the ONNX detection model (overrides config).
    #[arg(long, env = "INSECTID_DETECTOR_MODEL")]
    pub detector_model: Option<PathBuf>,

    /// Path to the ONNX identification model (overrides config).
    #[arg(long, env = "INSECTID_IDENTIFIER_MODEL")]
    pub identifier_model: Option<PathBuf>,

    /// Path to the identification labels file (overrides config).
    #[arg(long, env = "INSECTID_LABELS")]
    pub labels: Option<PathBuf>,

    /// Minimum top probability for a successful identification (0.0-1.0).
    #[arg(long, value_parser = parse_confidence, env = "INSECTID_MIN_CONFIDENCE")]
    pub min_confidence: Option<f64>,

    /// GBIF species search endpoint.
    #[arg(long, env = "INSECTID_GBIF_URL")]
    pub gbif_url: Option<String>,

    /// Skip GBIF lookups (all `gbif_id` values are null).
    #[arg(long)]
    pub no_gbif: bool,

    /// Only log warnings and errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace+ORT info, -vvv: trace+ORT debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse and validate confidence value.
fn parse_confidence(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !(0.0..=1.0).contains(&value) {
        return Err(format!(
            "confidence must be between 0.0 and 1.0, got {value}"
        ));
    }

    Ok(value)
}

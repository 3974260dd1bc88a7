//! insectid-api - insect detection and species identification service.
//!
//! This crate serves an HTTP API that finds insects in an uploaded image,
//! identifies each one with pre-built ONNX models, and enriches the result
//! with GBIF species keys.

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod imaging;
pub mod inference;
pub mod pipeline;
pub mod server;
pub mod taxonomy;

use clap::Parser;
use cli::{Cli, Command, ConfigAction, ServeArgs};
use config::{Config, config_file_path, load_config, resolve_model_paths, save_default_config};
use inference::{DetectorOptions, IdentifierOptions, OnnxInsectDetector, OnnxInsectIdentifier};
use pipeline::IdentificationPipeline;
use server::AppState;
use std::sync::Arc;
use taxonomy::{GbifClient, NoTaxonomy, TaxonomyLookup};
use tracing::info;

pub use error::{Error, Result};

/// Main entry point for the insectid-api binary.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(command) = cli.command {
        init_logging(cli.serve.verbose, cli.serve.quiet, cli.serve.debug);
        return handle_command(command, &cli.serve);
    }

    let mut config = load_config(cli.serve.config.as_deref())?;
    apply_overrides(&mut config, &cli.serve);

    init_logging(cli.serve.verbose, cli.serve.quiet, config.server.debug);
    config::validate_config(&config)?;

    let state = build_state(&config)?;

    let runtime = tokio::runtime::Runtime::new().map_err(|e| Error::Internal {
        message: format!("Failed to create async runtime: {e}"),
    })?;
    runtime.block_on(server::serve(
        &config.server.host,
        config.server.port,
        state,
    ))
}

/// Layer command-line and environment overrides on top of the config file.
pub fn apply_overrides(config: &mut Config, args: &ServeArgs) {
    if let Some(host) = &args.host {
        config.server.host.clone_from(host);
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.debug {
        config.server.debug = true;
    }
    if let Some(path) = &args.detector_model {
        config.models.detector = Some(path.clone());
    }
    if let Some(path) = &args.identifier_model {
        config.models.identifier = Some(path.clone());
    }
    if let Some(path) = &args.labels {
        config.models.labels = Some(path.clone());
    }
    if let Some(min_confidence) = args.min_confidence {
        config.pipeline.min_confidence = min_confidence;
    }
    if let Some(url) = &args.gbif_url {
        config.taxonomy.base_url.clone_from(url);
    }
    if args.no_gbif {
        config.taxonomy.enabled = false;
    }
}

/// Load both models and the taxonomy client; done once per process.
fn build_state(config: &Config) -> Result<Arc<AppState>> {
    let paths = resolve_model_paths(&config.models)?;
    let models = &config.models;

    info!("Loading detection model: {}", paths.detector.display());
    let detector = OnnxInsectDetector::load(
        &paths.detector,
        DetectorOptions {
            input_size: models.detector_input_size,
            confidence: models.detector_confidence,
            iou: models.detector_iou,
            threads: models.threads,
        },
    )?;

    info!(
        "Loading identification model: {} (labels: {})",
        paths.identifier.display(),
        paths.labels.display()
    );
    let identifier = OnnxInsectIdentifier::load(
        &paths.identifier,
        &paths.labels,
        IdentifierOptions {
            input_size: models.identifier_input_size,
            unknown_below: models.unknown_below,
            threads: models.threads,
        },
    )?;

    let taxonomy: Arc<dyn TaxonomyLookup> = if config.taxonomy.enabled {
        info!("GBIF lookups enabled: {}", config.taxonomy.base_url);
        Arc::new(GbifClient::from_config(&config.taxonomy)?)
    } else {
        info!("GBIF lookups disabled");
        Arc::new(NoTaxonomy)
    };

    let pipeline = IdentificationPipeline::new(
        Arc::new(detector),
        Arc::new(identifier),
        taxonomy,
        config.pipeline,
    );
    Ok(AppState::new(pipeline))
}

fn init_logging(verbose: u8, quiet: bool, debug: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // ORT logging is noisy at info; -vv and above let it through.
    let filter_str = if quiet {
        "warn,ort=off".to_string()
    } else {
        match verbose.max(u8::from(debug)) {
            0 => "info,ort=off".to_string(),
            1 => "debug,ort=warn".to_string(),
            2 => "trace,ort=info".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    fmt().with_env_filter(filter).init();
}

fn handle_command(command: Command, args: &ServeArgs) -> Result<()> {
    match command {
        Command::Config { action } => handle_config_command(action, args),
    }
}

fn handle_config_command(action: ConfigAction, args: &ServeArgs) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = config_file_path()?;
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                let saved_path = save_default_config(&Config::default())?;
                println!("Created configuration file: {}", saved_path.display());
                println!("\nNext steps:");
                println!("  set models.detector and models.identifier, then run insectid-api");
            }
            Ok(())
        }
        ConfigAction::Show => {
            let mut config = load_config(args.config.as_deref())?;
            apply_overrides(&mut config, args);
            let rendered = toml::to_string_pretty(&config)
                .map_err(|e| Error::ConfigSerialize { source: e })?;
            println!("{rendered}");
            Ok(())
        }
        ConfigAction::Path => {
            let path = args.config.clone().map_or_else(config_file_path, Ok)?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

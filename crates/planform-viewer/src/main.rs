//! Planform Viewer - native desktop front-end
//!
//! Opens a window with the floor plan viewer. Plans dropped onto the window
//! (or passed with `--image`) are sent to the inference service; a saved
//! result can be opened directly with `--result`.

mod app;
mod inference;
mod presentation;
mod ui;
mod upload;

use anyhow::{Context, Result};
use clap::Parser;
use planform_core::config::API_URL_ENV;
use planform_core::FloorPlanResult;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "planform")]
#[command(about = "Interactive 3D viewer for converted floor plans")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "planform.toml")]
    config: PathBuf,

    /// Open a saved inference result (JSON)
    #[arg(short, long)]
    result: Option<PathBuf>,

    /// Submit a floor plan image on startup
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Inference service address
    #[arg(long)]
    api: Option<String>,

    /// Start with the model filling the window
    #[arg(long)]
    fullscreen: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Planform v{}", env!("CARGO_PKG_VERSION"));

    // Command line wins over the environment, which wins over the file
    let mut config = planform_core::load_config(&args.config)?
        .with_api_url(std::env::var(API_URL_ENV).ok())
        .with_api_url(args.api);

    if args.fullscreen {
        config.viewer.start_fullscreen = true;
    }

    info!(
        url = %config.inference.url,
        scale = config.geometry.scale,
        wall_height = config.geometry.wall_height,
        "Configuration loaded"
    );

    let initial_result = match &args.result {
        Some(path) => Some(load_result(path)?),
        None => None,
    };

    app::run(app::Launch {
        config,
        initial_result,
        initial_image: args.image,
    })
}

fn load_result(path: &Path) -> Result<FloorPlanResult> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let result = FloorPlanResult::from_json(&content)
        .with_context(|| format!("Failed to parse floor plan result {}", path.display()))?;
    let summary = result.summary();
    info!(
        path = %path.display(),
        walls = summary.walls,
        doors = summary.doors,
        windows = summary.windows,
        "Loaded floor plan result"
    );
    Ok(result)
}

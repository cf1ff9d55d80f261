//! Binary entrypoint for the photo grid viewer.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use photo_grid::{Configuration, run_grid, scan::scan_library};

#[derive(Debug, Parser)]
#[command(name = "photo-grid", version, about = "Zoomable photo grid")]
struct Cli {
    /// Path to YAML config file
    #[arg(short, long, value_name = "FILE", default_value = "config.yaml")]
    config: PathBuf,

    /// Override the photo library directory
    #[arg(long, value_name = "DIR")]
    photos: Option<PathBuf>,

    /// Override the number of columns
    #[arg(long)]
    columns: Option<u32>,

    /// Override the number of visible rows
    #[arg(long)]
    rows: Option<u32>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("photo_grid={level}").parse()?)
        .add_directive("wgpu=warn".parse()?)
        .add_directive("winit=warn".parse()?);
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut cfg = Configuration::from_yaml_file(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(photos) = cli.photos {
        cfg.photo_library_path = photos;
    }
    if let Some(columns) = cli.columns {
        cfg.columns = columns;
    }
    if let Some(rows) = cli.rows {
        cfg.rows = rows;
    }
    let mut cfg = cfg.validated().context("validating configuration")?;

    // Watch events carry absolute paths; match them against absolute scan results.
    cfg.photo_library_path = std::fs::canonicalize(&cfg.photo_library_path)
        .with_context(|| format!("resolving {}", cfg.photo_library_path.display()))?;
    let photos = scan_library(&cfg.photo_library_path)?;
    info!(count = photos.len(), root = %cfg.photo_library_path.display(), "scanned images");

    run_grid(cfg, photos)
}

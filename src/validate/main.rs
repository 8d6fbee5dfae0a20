//! Offline dataset validator.
//!
//! Loads the configured boundary and vendor layers, reports how many vendors
//! each layer contributes and lists every vendor that falls outside the city.

mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use kedai::config::Config;
use kedai::MapContext;

use crate::report::build_report;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "validate")]
#[command(about = "Check vendor layers against the city boundary")]
struct Args {
    /// Path to the TOML config naming the boundary and vendor layers
    #[arg(short, long, default_value = "kedai.toml")]
    config: PathBuf,

    /// Exit with an error if any vendor lies outside the boundary
    #[arg(long)]
    strict: bool,

    /// Log level, used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Kedai Dataset Validator");
    info!("Config: {}", args.config.display());

    let config = Config::load_from_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    if config.boundary.is_none() {
        warn!("No [boundary] configured; every vendor will be reported outside");
    }
    if config.layers.is_empty() {
        warn!("No [[layers]] configured");
    }

    let context = MapContext::from_config(&config);
    let report = build_report(&context);

    info!(
        "Boundary: {} rings, {} vendors in {} layers",
        report.boundary_rings,
        report.total(),
        report.layers.len()
    );
    if let Some(bbox) = report.boundary_bbox {
        info!(
            "Boundary extent: lon {}..{}, lat {}..{}",
            bbox.min_lon, bbox.max_lon, bbox.min_lat, bbox.max_lat
        );
    }
    for layer in &report.layers {
        info!(
            "  {}: {} vendors, {} outside",
            layer.layer, layer.total, layer.outside
        );
    }

    for vendor in &report.outside {
        warn!(
            "Outside boundary: '{}' [{}] at ({}, {})",
            vendor.props.name, vendor.props.layer, vendor.point.lat, vendor.point.lon
        );
    }

    if report.is_clean() {
        info!("All vendors are inside the boundary");
    } else if args.strict {
        anyhow::bail!(
            "{} of {} vendors are outside the boundary",
            report.outside.len(),
            report.total()
        );
    }

    Ok(())
}

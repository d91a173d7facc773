use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use netsentry::cli::Cli;
use netsentry::config::Config;
use netsentry::detector::{Artifacts, Detector};
use netsentry::output::OutputWriter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let paths = Config::discover(cli.config.as_deref())?
        .with_overrides(cli.encoder.clone(), cli.scaler.clone(), cli.models.clone())
        .artifact_paths()?;

    // Loaded once; every capture below shares them read-only.
    let artifacts = Artifacts::load(&paths).context("failed to load artifacts")?;
    info!(models = ?artifacts.models().names(), "artifacts ready");
    let detector = Detector::new(Arc::new(artifacts));

    let output_writer = OutputWriter::new(cli.output_format, cli.output_file.clone())?;

    let reports: Vec<_> = cli.captures.iter().map(|path| detector.run(path)).collect();
    output_writer.write(&reports)?;

    let failed = reports.iter().filter(|r| r.view.is_error()).count();
    if failed > 0 {
        eprintln!(
            "{}",
            format!("{} of {} capture(s) failed.", failed, reports.len()).red()
        );
        std::process::exit(1);
    }

    Ok(())
}

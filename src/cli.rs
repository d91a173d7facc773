use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::detector::ModelSource;

#[derive(Parser, Debug)]
#[command(name = "netsentry")]
#[command(author = "NetSentry")]
#[command(version = "0.1.0")]
#[command(about = "Flag intrusions in packet captures exported as CSV", long_about = None)]
pub struct Cli {
    #[arg(required = true, help = "Capture file(s) exported as CSV with Protocol, Time and Length columns")]
    pub captures: Vec<PathBuf>,

    #[arg(short = 'c', long, help = "Config file (default: <config dir>/netsentry/config.json)")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Fitted protocol encoder artifact (JSON)")]
    pub encoder: Option<PathBuf>,

    #[arg(long, help = "Fitted numeric scaler artifact (JSON)")]
    pub scaler: Option<PathBuf>,

    #[arg(
        short = 'm',
        long = "model",
        value_name = "NAME=PATH",
        help = "Fitted classifier artifact (JSON). Repeat for several models"
    )]
    pub models: Vec<ModelSource>,

    #[arg(short = 'o', long, value_enum, default_value = "human", help = "Output format")]
    pub output_format: OutputFormat,

    #[arg(short = 'f', long, help = "Output file path")]
    pub output_file: Option<PathBuf>,

    #[arg(long, help = "Disable colored output")]
    pub no_color: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum OutputFormat {
    #[value(name = "human", help = "Human-readable output")]
    Human,
    #[value(name = "json", help = "JSON output")]
    Json,
    #[value(name = "csv", help = "CSV output")]
    Csv,
}

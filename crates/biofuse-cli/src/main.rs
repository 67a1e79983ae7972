//! Biofuse CLI
//!
//! Batch harness around `biofuse-core`: calibrates fusion models from
//! labeled score observations and runs score fusion, gallery search and
//! DET evaluation against a model directory.
//!
//! # Commands
//!
//! - `calibrate`: fit a fusion model from impostor observations and write
//!   the model directory
//! - `fuse-scores`: fuse K-score rows through a loaded model
//! - `search`: enroll a gallery and rank probes against it
//! - `det`: print DET operating points for scored comparisons
//!
//! Exit codes: 0 on success, 1 on recoverable input errors, 2 on fatal
//! configuration or parse errors.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod error;

pub use error::exit_code_for;

/// Biofuse CLI - multi-algorithm fusion harness
#[derive(Parser)]
#[command(name = "biofuse")]
#[command(version = "0.1.0")]
#[command(about = "Calibrate, fuse and evaluate multi-algorithm biometric fusion schemes")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a fusion model from labeled score observations
    Calibrate(commands::calibrate::CalibrateArgs),
    /// Fuse per-algorithm verification scores through a model
    FuseScores(commands::fuse::FuseScoresArgs),
    /// Enroll a gallery and search probes against it
    Search(commands::search::SearchArgs),
    /// Compute DET operating points from scored comparisons
    Det(commands::det::DetArgs),
}

fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Calibrate(args) => commands::calibrate::run(args),
        Commands::FuseScores(args) => commands::fuse::run(args),
        Commands::Search(args) => commands::search::run(args),
        Commands::Det(args) => commands::det::run(args),
    };

    if let Err(err) = result {
        tracing::error!("{err:#}");
        std::process::exit(exit_code_for(&err));
    }
}

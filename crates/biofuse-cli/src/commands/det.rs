//! `det`: print DET operating points for scored comparisons.

use std::path::PathBuf;

use clap::Args;
use serde::Deserialize;

use biofuse_core::compute_det;

#[derive(Args)]
pub struct DetArgs {
    /// JSON Lines scored-comparison file ({"score":3.0,"genuine":true})
    #[arg(long)]
    pub scores: PathBuf,

    /// Target false-match rates, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = [0.01, 0.001])]
    pub targets: Vec<f64>,
}

#[derive(Deserialize)]
struct ScoredComparison {
    score: f64,
    genuine: bool,
}

pub fn run(args: DetArgs) -> anyhow::Result<()> {
    let records: Vec<ScoredComparison> = super::read_jsonl(&args.scores)?;
    let scores: Vec<f64> = records.iter().map(|r| r.score).collect();
    let mask: Vec<bool> = records.iter().map(|r| r.genuine).collect();

    let points = compute_det(&scores, &mask, &args.targets)?;

    println!(
        "{:>12} {:>14} {:>12} {:>12}",
        "TARGET_FMR", "THRESHOLD", "FMR", "FNMR"
    );
    for point in points {
        println!(
            "{:>12.6} {:>14.6} {:>12.6} {:>12.6}",
            point.target_fmr, point.threshold, point.fmr, point.fnmr
        );
    }
    Ok(())
}

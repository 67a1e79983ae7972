//! `fuse-scores`: fuse K-score rows through a loaded model.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use tracing::debug;

use biofuse_core::{FuserType, ScoreFuser, Status};

#[derive(Args)]
pub struct FuseScoresArgs {
    /// Model directory
    #[arg(long)]
    pub model: PathBuf,

    /// JSON file holding an array of K-score rows, e.g. [[3.5, 51.0], ...]
    #[arg(long)]
    pub scores: PathBuf,
}

/// Per-row outcome. Rows fail independently; a bad row never aborts the
/// batch, it just reports its status.
#[derive(Serialize)]
struct FusedRow {
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    fused_score: Option<f64>,
}

pub fn run(args: FuseScoresArgs) -> anyhow::Result<()> {
    let fuser = ScoreFuser::initialize(&args.model, FuserType::Verification)?;
    debug!(k = fuser.expected_inputs(), "model loaded");

    let contents = std::fs::read_to_string(&args.scores)
        .with_context(|| format!("cannot read '{}'", args.scores.display()))?;
    let rows: Vec<Vec<f64>> = serde_json::from_str(&contents)
        .with_context(|| format!("cannot parse '{}'", args.scores.display()))?;

    for row in &rows {
        let result = fuser.fuse_verification_scores(row);
        let output = FusedRow {
            status: Status::from_result(&result),
            fused_score: result.ok(),
        };
        println!("{}", serde_json::to_string(&output)?);
    }
    Ok(())
}

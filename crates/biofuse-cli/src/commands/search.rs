//! `search`: enroll a gallery of fused templates and rank probes.

use std::path::PathBuf;

use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::info;

use biofuse_core::{Action, CandidateList, Status, TemplateFuser};

#[derive(Args)]
pub struct SearchArgs {
    /// Model directory
    #[arg(long)]
    pub model: PathBuf,

    /// JSON Lines gallery file ({"identity":1,"template":[...]})
    #[arg(long)]
    pub gallery: PathBuf,

    /// JSON Lines probe file ({"template":[...]})
    #[arg(long)]
    pub probes: PathBuf,

    /// Number of candidates per probe
    #[arg(long, short = 'l', default_value_t = 20)]
    pub list_size: usize,
}

#[derive(Deserialize)]
struct GalleryRecord {
    identity: u32,
    template: Vec<f64>,
}

#[derive(Deserialize)]
struct ProbeRecord {
    template: Vec<f64>,
}

#[derive(Serialize)]
struct SearchRow {
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    candidates: Option<CandidateList>,
}

pub fn run(args: SearchArgs) -> anyhow::Result<()> {
    let mut fuser = TemplateFuser::initialize(&args.model, Action::Identify)?;

    let enrolled: Vec<GalleryRecord> = super::read_jsonl(&args.gallery)?;
    let (ids, templates): (Vec<u32>, Vec<Vec<f64>>) = enrolled
        .into_iter()
        .map(|r| (r.identity, r.template))
        .unzip();
    fuser.create_gallery(templates, ids)?;
    info!(
        size = fuser.gallery().map(|g| g.len()).unwrap_or(0),
        list_size = args.list_size,
        "gallery enrolled"
    );

    let probes: Vec<ProbeRecord> = super::read_jsonl(&args.probes)?;
    let templates: Vec<Vec<f64>> = probes.into_iter().map(|p| p.template).collect();
    for result in fuser.search_batch(&templates, args.list_size)? {
        let output = SearchRow {
            status: Status::from_result(&result),
            candidates: result.ok(),
        };
        println!("{}", serde_json::to_string(&output)?);
    }
    Ok(())
}

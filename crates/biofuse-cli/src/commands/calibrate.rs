//! `calibrate`: fit a fusion model and write the model directory.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use biofuse_core::FusionModel;

#[derive(Args)]
pub struct CalibrateArgs {
    /// Algorithm names in fusion order, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    pub algorithms: Vec<String>,

    /// JSON Lines observation file
    /// ({"identity_a":1,"identity_b":2,"scores":[...]})
    #[arg(long)]
    pub observations: PathBuf,

    /// Model directory to write
    #[arg(long)]
    pub out: PathBuf,
}

pub fn run(args: CalibrateArgs) -> anyhow::Result<()> {
    let model = FusionModel::fit_from_file(&args.algorithms, &args.observations)?;
    model.save(&args.out)?;

    info!(
        k = model.k(),
        out = %args.out.display(),
        "fusion model written"
    );
    for alg in &model.algorithms {
        println!(
            "{}: position={:.6} scale={:.6} weight={:.2}",
            alg.name, alg.position, alg.scale, alg.weight
        );
    }
    Ok(())
}

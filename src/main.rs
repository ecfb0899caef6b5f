mod cli;

use anyhow::{Context, Result};
use clap::Parser;

use tilesim::config::SimConfig;
use tilesim::engine::{ArtifactStore, SimInputs, Simulation};
use tilesim::frames::{FrameSink, MemoryFrameSink, SyntheticFrameSource};
use tilesim::logging::init_logging;
use tilesim::registry::ApproachRegistry;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity(), cli.log_file.as_deref(), cli.log_format())
        .context("Failed to initialize logging")?;

    let config = SimConfig::load(&cli.config).await?;
    let registry = ApproachRegistry::discover();
    let inputs = SimInputs::load(&config).await?;
    let frames = SyntheticFrameSource::from_config(&config);
    let mut sink = MemoryFrameSink::new();
    let save_frames = config.metric.save_result_img;

    let store = ArtifactStore::new(&config.paths.output_dir);
    let mut simulation = Simulation::new(config, registry)?.with_artifacts(store);
    let output = simulation
        .run(
            &inputs,
            &frames,
            if save_frames { Some(&mut sink as &mut dyn FrameSink) } else { None },
        )
        .await?;

    println!("{}", simulation.monitor().generate_report());
    println!(
        "avg psnr {:.3} dB, avg bandwidth {:.3} Mbps, storage {:.3} GB, gc score {:.3}",
        output.summary.avg_psnr,
        output.summary.avg_bandwidth_mbps,
        output.summary.total_storage_gb,
        output.summary.gc_score
    );
    if save_frames {
        println!("{} viewport frames rendered", sink.len());
    }
    if let Some(store) = simulation.artifacts() {
        println!("artifacts in {:?}", store.output_dir());
    }
    Ok(())
}

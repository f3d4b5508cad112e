use crate::cli::Af3JsonArgs;
use crate::config::FileConfig;
use crate::config::builder::{Af3Overrides, build_af3_config};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use tracing::{info, warn};
use wzyclust::engine::progress::ProgressReporter;
use wzyclust::workflows;

pub async fn run(
    args: Af3JsonArgs,
    file_config: &FileConfig,
    progress: &CliProgressHandler,
) -> Result<()> {
    let config = build_af3_config(&Af3Overrides::from(&args), file_config)?;
    info!(
        "AlphaFold3 settings: chain {}, seeds {:?}, dialect '{}', version {}",
        config.chain_id, config.model_seeds, config.dialect, config.version
    );

    let reporter = ProgressReporter::with_callback(progress.get_callback());
    println!(
        "Generating AlphaFold3 jobs from {} FASTA file(s)...",
        args.fastas.len()
    );

    let written = tokio::task::block_in_place(|| {
        workflows::af3::run(&args.fastas, &args.outdir, &config, &reporter)
    })?;

    if written.is_empty() {
        warn!("No AlphaFold3 jobs were written.");
        println!("Warning: no sequence records were found in the input files.");
    } else {
        println!(
            "✓ Wrote {} job file(s) to {}",
            written.len(),
            args.outdir.display()
        );
    }
    Ok(())
}

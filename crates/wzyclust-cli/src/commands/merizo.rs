use crate::cli::MerizoSubmitArgs;
use crate::config::FileConfig;
use crate::config::builder::{MerizoOverrides, build_merizo_config};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use tracing::info;
use wzyclust::engine::progress::ProgressReporter;
use wzyclust::workflows;

pub async fn run(
    args: MerizoSubmitArgs,
    file_config: &FileConfig,
    progress: &CliProgressHandler,
) -> Result<()> {
    let config = build_merizo_config(&MerizoOverrides::from(&args), file_config)?;
    info!(
        "Merizo-search settings: endpoint {}, database '{}', chain {}",
        config.api_url, config.database, config.chain_id
    );

    let reporter = ProgressReporter::with_callback(progress.get_callback());
    let outcomes = workflows::merizo::run(&args.pdbs, &config, &reporter).await?;

    if outcomes.is_empty() {
        println!("No .pdb files to submit.");
        return Ok(());
    }

    for outcome in &outcomes {
        match &outcome.result {
            Ok(reply) => println!("✓ {}: {}", outcome.path.display(), reply),
            Err(e) => println!("✗ {}: {}", outcome.path.display(), e),
        }
    }
    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    println!(
        "Submitted {} of {} structure(s).",
        succeeded,
        outcomes.len()
    );
    Ok(())
}

mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod output;
mod utils;

use crate::cli::{Cli, Commands};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use clap::Parser;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run_app().await {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default().into_hooks();
    eyre_hook.install().map_err(|e| CliError::Other(e.into()))?;
    std::panic::set_hook(Box::new(move |pi| {
        error!("{}", panic_hook.panic_report(pi));
    }));

    info!("🚀 wzyclust v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    if let Some(num_threads) = cli.threads {
        info!(
            "Setting Rayon global thread pool to {} threads.",
            num_threads
        );
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .map_err(|e| {
                CliError::Other(anyhow::anyhow!("Failed to build global thread pool: {}", e))
            })?;
    }

    let progress = if cli.quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let config_path = cli.config.as_deref();

    let command_result = match cli.command {
        Commands::Af3Json(args) => {
            info!("Dispatching to 'af3-json' command.");
            let file_config = config::load_config(config_path, &cli.set_values)?;
            commands::af3::run(args, &file_config, &progress).await
        }
        Commands::MerizoSubmit(args) => {
            info!("Dispatching to 'merizo-submit' command.");
            let file_config = config::load_config(config_path, &cli.set_values)?;
            commands::merizo::run(args, &file_config, &progress).await
        }
        Commands::Stats(args) => {
            info!("Dispatching to 'stats' command.");
            let file_config = config::load_config(config_path, &cli.set_values)?;
            commands::stats::run(args, &file_config).await
        }
        Commands::Config(args) => {
            info!("Dispatching to 'config' command.");
            commands::config::run(args, config_path, &cli.set_values).await
        }
    };

    match &command_result {
        Ok(_) => info!("✅ Command completed successfully."),
        Err(e) => error!("❌ Command failed: {}", e),
    }
    command_result
}

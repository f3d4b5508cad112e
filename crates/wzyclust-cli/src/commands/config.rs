use crate::cli::{ConfigArgs, ConfigCommands};
use crate::config::builder::effective_config;
use crate::config::{default_config_path, load_config};
use crate::error::{CliError, Result};
use std::path::Path;
use tracing::info;

pub async fn run(args: ConfigArgs, explicit: Option<&Path>, set_values: &[String]) -> Result<()> {
    match args.command {
        ConfigCommands::Path => handle_path(),
        ConfigCommands::Show => handle_show(explicit, set_values),
    }
}

fn handle_path() -> Result<()> {
    let path = default_config_path()?;
    println!("{}", path.display());
    if !path.exists() {
        info!("No configuration file exists at {:?} yet.", path);
    }
    Ok(())
}

fn handle_show(explicit: Option<&Path>, set_values: &[String]) -> Result<()> {
    let file = load_config(explicit, set_values)?;
    let effective = effective_config(&file)?;
    let text = toml::to_string_pretty(&effective)
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to render configuration: {}", e)))?;
    print!("{}", text);
    Ok(())
}

pub mod builder;
pub mod file;

pub use builder::{build_af3_config, build_merizo_config, build_stats_config, load_config};
pub use file::FileConfig;

use crate::error::{CliError, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Location of the configuration file used when `--config` is not given.
pub fn default_config_path() -> Result<PathBuf> {
    ProjectDirs::from("org", "wzyclust", "wzyclust")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
        .ok_or_else(|| CliError::Config("Could not determine config directory path.".to_string()))
}

use super::default_config_path;
use super::file::{FileAf3Config, FileConfig, FileMerizoConfig, FileStatsConfig};
use crate::cli::{Af3JsonArgs, MerizoSubmitArgs};
use crate::error::{CliError, Result};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};
use wzyclust::core::stats::correction::FdrMethod;
use wzyclust::engine::config::{
    Af3Config, Af3ConfigBuilder, MerizoConfig, MerizoConfigBuilder, StatsConfig,
    StatsConfigBuilder,
};

/// Command-line values that take precedence over everything else.
#[derive(Debug, Default, Clone)]
pub struct Af3Overrides {
    pub model_seeds: Option<Vec<u64>>,
    pub chain_id: Option<String>,
    pub pretty: bool,
}

impl From<&Af3JsonArgs> for Af3Overrides {
    fn from(args: &Af3JsonArgs) -> Self {
        Self {
            model_seeds: (!args.seeds.is_empty()).then(|| args.seeds.clone()),
            chain_id: args.chain_id.clone(),
            pretty: args.pretty,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct MerizoOverrides {
    pub api_url: Option<String>,
    pub email: Option<String>,
    pub database: Option<String>,
    pub chain_id: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl From<&MerizoSubmitArgs> for MerizoOverrides {
    fn from(args: &MerizoSubmitArgs) -> Self {
        Self {
            api_url: args.api_url.clone(),
            email: args.email.clone(),
            database: args.db.clone(),
            chain_id: args.chain.clone(),
            timeout_secs: args.timeout,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct StatsOverrides {
    pub alpha: Option<f64>,
    pub min_obs: Option<usize>,
    pub fdr_method: Option<FdrMethod>,
}

/// Reads the configuration file and applies `--set` values on top of it.
///
/// An explicit path must exist. Without one, the default location is used when a
/// file is present there, and built-in defaults otherwise.
pub fn load_config(explicit: Option<&Path>, set_values: &[String]) -> Result<FileConfig> {
    let file_config = match explicit {
        Some(path) => {
            info!("Using configuration file {:?}", path);
            FileConfig::from_file(path)?
        }
        None => match default_config_path() {
            Ok(path) if path.is_file() => {
                info!("Using configuration file {:?}", path);
                FileConfig::from_file(&path)?
            }
            _ => {
                debug!("No configuration file found; using built-in defaults.");
                FileConfig::default()
            }
        },
    };
    apply_set_values(file_config, set_values)
}

pub fn build_af3_config(overrides: &Af3Overrides, file: &FileConfig) -> Result<Af3Config> {
    let file = file.af3.clone().unwrap_or_default();
    let mut builder = Af3ConfigBuilder::new();

    if let Some(seeds) = overrides.model_seeds.clone().or(file.model_seeds) {
        builder = builder.model_seeds(seeds);
    }
    if let Some(chain_id) = overrides.chain_id.clone().or(file.chain_id) {
        builder = builder.chain_id(chain_id);
    }
    if let Some(dialect) = file.dialect {
        builder = builder.dialect(dialect);
    }
    if let Some(version) = file.version {
        builder = builder.version(version);
    }
    if overrides.pretty {
        builder = builder.pretty(true);
    } else if let Some(pretty) = file.pretty {
        builder = builder.pretty(pretty);
    }

    builder.build().map_err(|e| CliError::Config(e.to_string()))
}

pub fn build_merizo_config(overrides: &MerizoOverrides, file: &FileConfig) -> Result<MerizoConfig> {
    let file = file.merizo.clone().unwrap_or_default();
    let mut builder = MerizoConfigBuilder::new();

    if let Some(url) = overrides.api_url.clone().or(file.api_url) {
        builder = builder.api_url(url);
    }
    if let Some(email) = overrides.email.clone().or(file.email) {
        builder = builder.email(email);
    }
    if let Some(database) = overrides.database.clone().or(file.database) {
        builder = builder.database(database);
    }
    if let Some(chain_id) = overrides.chain_id.clone().or(file.chain_id) {
        builder = builder.chain_id(chain_id);
    }
    if let Some(secs) = overrides.timeout_secs.or(file.timeout_secs) {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder.build().map_err(|e| CliError::Config(e.to_string()))
}

pub fn build_stats_config(overrides: &StatsOverrides, file: &FileConfig) -> Result<StatsConfig> {
    let file = file.stats.clone().unwrap_or_default();
    let mut builder = StatsConfigBuilder::new();

    if let Some(alpha) = overrides.alpha.or(file.alpha) {
        builder = builder.alpha(alpha);
    }
    if let Some(min_obs) = overrides.min_obs.or(file.min_obs) {
        builder = builder.min_obs(min_obs);
    }
    if let Some(method) = overrides.fdr_method.or(file.fdr_method) {
        builder = builder.fdr_method(method);
    }

    builder.build().map_err(|e| CliError::Config(e.to_string()))
}

/// The fully resolved configuration, in file form, for display.
pub fn effective_config(file: &FileConfig) -> Result<FileConfig> {
    let af3 = build_af3_config(&Af3Overrides::default(), file)?;
    let merizo = build_merizo_config(&MerizoOverrides::default(), file)?;
    let stats = build_stats_config(&StatsOverrides::default(), file)?;

    Ok(FileConfig {
        af3: Some(FileAf3Config {
            model_seeds: Some(af3.model_seeds),
            dialect: Some(af3.dialect),
            version: Some(af3.version),
            chain_id: Some(af3.chain_id),
            pretty: Some(af3.pretty),
        }),
        merizo: Some(FileMerizoConfig {
            api_url: Some(merizo.api_url),
            email: Some(merizo.email),
            database: Some(merizo.database),
            chain_id: Some(merizo.chain_id),
            timeout_secs: Some(merizo.timeout.as_secs()),
        }),
        stats: Some(FileStatsConfig {
            alpha: Some(stats.alpha),
            min_obs: Some(stats.min_obs),
            fdr_method: Some(stats.fdr_method),
        }),
    })
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn parse_seeds(key: &str, value: &str) -> Result<Vec<u64>> {
    value
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_value(key, s, "integer"))
        .collect()
}

pub fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let key = key.trim();
        debug!("Applying --set {}={}", key, value_str);

        match key {
            "af3.model-seeds" => {
                config.af3.get_or_insert_with(Default::default).model_seeds =
                    Some(parse_seeds(key, value_str)?);
            }
            "af3.dialect" => {
                config.af3.get_or_insert_with(Default::default).dialect =
                    Some(value_str.trim().to_string());
            }
            "af3.version" => {
                config.af3.get_or_insert_with(Default::default).version =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "af3.chain-id" => {
                config.af3.get_or_insert_with(Default::default).chain_id =
                    Some(value_str.trim().to_string());
            }
            "af3.pretty" => {
                config.af3.get_or_insert_with(Default::default).pretty =
                    Some(parse_value(key, value_str, "boolean")?);
            }
            "merizo.api-url" => {
                config.merizo.get_or_insert_with(Default::default).api_url =
                    Some(value_str.trim().to_string());
            }
            "merizo.email" => {
                config.merizo.get_or_insert_with(Default::default).email =
                    Some(value_str.trim().to_string());
            }
            "merizo.database" => {
                config.merizo.get_or_insert_with(Default::default).database =
                    Some(value_str.trim().to_string());
            }
            "merizo.chain-id" => {
                config.merizo.get_or_insert_with(Default::default).chain_id =
                    Some(value_str.trim().to_string());
            }
            "merizo.timeout-secs" => {
                config.merizo.get_or_insert_with(Default::default).timeout_secs =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "stats.alpha" => {
                config.stats.get_or_insert_with(Default::default).alpha =
                    Some(parse_value(key, value_str, "float")?);
            }
            "stats.min-obs" => {
                config.stats.get_or_insert_with(Default::default).min_obs =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "stats.fdr-method" => {
                config.stats.get_or_insert_with(Default::default).fdr_method =
                    Some(parse_value(key, value_str, "FDR method")?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

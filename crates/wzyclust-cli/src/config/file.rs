use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use wzyclust::core::stats::correction::FdrMethod;

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileAf3Config {
    pub model_seeds: Option<Vec<u64>>,
    pub dialect: Option<String>,
    pub version: Option<u32>,
    pub chain_id: Option<String>,
    pub pretty: Option<bool>,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileMerizoConfig {
    pub api_url: Option<String>,
    pub email: Option<String>,
    pub database: Option<String>,
    pub chain_id: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileStatsConfig {
    pub alpha: Option<f64>,
    pub min_obs: Option<usize>,
    pub fdr_method: Option<FdrMethod>,
}

/// Contents of a `config.toml`; every section and key is optional.
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub af3: Option<FileAf3Config>,
    pub merizo: Option<FileMerizoConfig>,
    pub stats: Option<FileStatsConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parses_all_sections_with_kebab_case_keys() {
        let config: FileConfig = toml::from_str(
            r#"
            [af3]
            model-seeds = [1, 2]
            dialect = "alphafold3"
            version = 2
            chain-id = "B"
            pretty = true

            [merizo]
            api-url = "https://example.org/submit"
            email = "me@lab.org"
            database = "cath"
            chain-id = "A"
            timeout-secs = 30

            [stats]
            alpha = 0.01
            min-obs = 5
            fdr-method = "by"
            "#,
        )
        .unwrap();

        let af3 = config.af3.unwrap();
        assert_eq!(af3.model_seeds, Some(vec![1, 2]));
        assert_eq!(af3.pretty, Some(true));
        let merizo = config.merizo.unwrap();
        assert_eq!(merizo.timeout_secs, Some(30));
        let stats = config.stats.unwrap();
        assert_eq!(stats.fdr_method, Some(FdrMethod::By));
        assert_eq!(stats.min_obs, Some(5));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<FileConfig>("[af3]\nseeds = [1]\n").is_err());
        assert!(toml::from_str::<FileConfig>("[plots]\n").is_err());
    }

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(toml::from_str::<FileConfig>("").unwrap(), FileConfig::default());
    }

    #[test]
    fn from_file_reports_parse_errors_with_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[stats\nalpha = ").unwrap();

        match FileConfig::from_file(&path) {
            Err(CliError::FileParsing { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

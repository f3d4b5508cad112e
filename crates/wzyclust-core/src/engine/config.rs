use crate::core::models::af3::{DEFAULT_CHAIN_ID, DEFAULT_DIALECT, DEFAULT_MODEL_SEED, DEFAULT_VERSION};
use crate::core::stats::correction::FdrMethod;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MERIZO_API_URL: &str = "http://bioinf.cs.ucl.ac.uk/psipred/api/submission.json";
pub const DEFAULT_MERIZO_EMAIL: &str = "user@example.com";
pub const DEFAULT_MERIZO_DATABASE: &str = "ted";
pub const DEFAULT_MERIZO_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_ALPHA: f64 = 0.05;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

fn invalid(parameter: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        parameter,
        reason: reason.into(),
    }
}

fn validate_chain_id(chain_id: &str) -> Result<(), ConfigError> {
    if chain_id.is_empty() || !chain_id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid(
            "chain_id",
            format!("'{}' is not an alphanumeric chain identifier", chain_id),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Af3Config {
    pub chain_id: String,
    pub model_seeds: Vec<u64>,
    pub dialect: String,
    pub version: u32,
    pub pretty: bool,
}

impl Default for Af3Config {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID.to_string(),
            model_seeds: vec![DEFAULT_MODEL_SEED],
            dialect: DEFAULT_DIALECT.to_string(),
            version: DEFAULT_VERSION,
            pretty: false,
        }
    }
}

#[derive(Default)]
pub struct Af3ConfigBuilder {
    chain_id: Option<String>,
    model_seeds: Option<Vec<u64>>,
    dialect: Option<String>,
    version: Option<u32>,
    pretty: Option<bool>,
}

impl Af3ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chain_id(mut self, chain_id: impl Into<String>) -> Self {
        self.chain_id = Some(chain_id.into());
        self
    }
    pub fn model_seeds(mut self, seeds: Vec<u64>) -> Self {
        self.model_seeds = Some(seeds);
        self
    }
    pub fn dialect(mut self, dialect: impl Into<String>) -> Self {
        self.dialect = Some(dialect.into());
        self
    }
    pub fn version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = Some(pretty);
        self
    }

    pub fn build(self) -> Result<Af3Config, ConfigError> {
        let defaults = Af3Config::default();
        let config = Af3Config {
            chain_id: self.chain_id.unwrap_or(defaults.chain_id),
            model_seeds: self.model_seeds.unwrap_or(defaults.model_seeds),
            dialect: self.dialect.unwrap_or(defaults.dialect),
            version: self.version.unwrap_or(defaults.version),
            pretty: self.pretty.unwrap_or(defaults.pretty),
        };

        validate_chain_id(&config.chain_id)?;
        if config.model_seeds.is_empty() {
            return Err(invalid("model_seeds", "at least one seed is required"));
        }
        if config.dialect.trim().is_empty() {
            return Err(invalid("dialect", "must not be empty"));
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MerizoConfig {
    pub api_url: String,
    pub email: String,
    pub database: String,
    pub chain_id: String,
    pub timeout: Duration,
}

#[derive(Default)]
pub struct MerizoConfigBuilder {
    api_url: Option<String>,
    email: Option<String>,
    database: Option<String>,
    chain_id: Option<String>,
    timeout: Option<Duration>,
}

impl MerizoConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }
    pub fn chain_id(mut self, chain_id: impl Into<String>) -> Self {
        self.chain_id = Some(chain_id.into());
        self
    }
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<MerizoConfig, ConfigError> {
        let config = MerizoConfig {
            api_url: self
                .api_url
                .unwrap_or_else(|| DEFAULT_MERIZO_API_URL.to_string()),
            email: self
                .email
                .unwrap_or_else(|| DEFAULT_MERIZO_EMAIL.to_string()),
            database: self
                .database
                .unwrap_or_else(|| DEFAULT_MERIZO_DATABASE.to_string()),
            chain_id: self
                .chain_id
                .unwrap_or_else(|| DEFAULT_CHAIN_ID.to_string()),
            timeout: self.timeout.unwrap_or(DEFAULT_MERIZO_TIMEOUT),
        };

        if !(config.api_url.starts_with("http://") || config.api_url.starts_with("https://")) {
            return Err(invalid("api_url", "must be an http(s) URL"));
        }
        if !config.email.contains('@') {
            return Err(invalid(
                "email",
                format!("'{}' is not an email address", config.email),
            ));
        }
        if config.database.trim().is_empty() {
            return Err(invalid("database", "must not be empty"));
        }
        validate_chain_id(&config.chain_id)?;
        if config.timeout.is_zero() {
            return Err(invalid("timeout", "must be greater than zero"));
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsConfig {
    /// Significance level of the omnibus test that gates post-hoc comparisons.
    pub alpha: f64,
    pub fdr_method: FdrMethod,
    /// Feature levels must be observed more often than this to be tested.
    pub min_obs: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            fdr_method: FdrMethod::Bh,
            min_obs: 0,
        }
    }
}

#[derive(Default)]
pub struct StatsConfigBuilder {
    alpha: Option<f64>,
    fdr_method: Option<FdrMethod>,
    min_obs: Option<usize>,
}

impl StatsConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }
    pub fn fdr_method(mut self, method: FdrMethod) -> Self {
        self.fdr_method = Some(method);
        self
    }
    pub fn min_obs(mut self, min_obs: usize) -> Self {
        self.min_obs = Some(min_obs);
        self
    }

    pub fn build(self) -> Result<StatsConfig, ConfigError> {
        let defaults = StatsConfig::default();
        let alpha = self.alpha.unwrap_or(defaults.alpha);
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(invalid(
                "alpha",
                format!("{} is outside the open interval (0, 1)", alpha),
            ));
        }
        Ok(StatsConfig {
            alpha,
            fdr_method: self.fdr_method.unwrap_or(defaults.fdr_method),
            min_obs: self.min_obs.unwrap_or(defaults.min_obs),
        })
    }
}

use launcher::config::Config as LauncherConfig;
use segment_store::StoreConfig;
use serde::Deserialize;
use std::fs::File;
use tracing_subscriber::EnvFilter;

#[derive(Deserialize, Debug, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive. `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,
    pub sentry_dsn: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            sentry_dsn: None,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    pub metrics: Option<MetricsConfig>,
    #[serde(default)]
    pub console: LauncherConfig,
    #[serde(default)]
    pub klaviyo: klaviyo::config::Config,
    #[serde(default)]
    pub segment_store: StoreConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config: Config = serde_yaml::from_reader(file)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        EnvFilter::try_new(&self.logging.level)
            .map_err(|_| ValidationError::InvalidLogLevel(self.logging.level.clone()))?;
        if self.metrics.as_ref().is_some_and(|m| m.statsd_port == 0) {
            return Err(ValidationError::InvalidStatsdPort);
        }
        self.console.validate()?;
        self.klaviyo.validate()?;
        self.segment_store.validate()?;
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("invalid logging.level: {0}")]
    InvalidLogLevel(String),
    #[error("metrics.statsd_port cannot be 0")]
    InvalidStatsdPort,
    #[error("console: {0}")]
    Console(#[from] launcher::config::ValidationError),
    #[error("klaviyo: {0}")]
    Klaviyo(#[from] klaviyo::config::ValidationError),
    #[error("segment_store: {0}")]
    SegmentStore(#[from] segment_store::config::ValidationError),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    ValidationError(#[from] ValidationError),
}

fn default_log_level() -> String {
    "info".into()
}

fn default_metrics_prefix() -> String {
    "campaign_console".into()
}

mod config;
mod logging;
mod statsd;

use clap::{Args, Parser};
use config::{Config, ConfigError};
use klaviyo::{CampaignPlatform, ClientError, KlaviyoClient};
use launcher::errors::LauncherError;
use segment_store::StoreError;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "campaign-console", version, about = "Campaign management console")]
enum CliCommand {
    /// Serve the console API
    Serve(ConfigArgs),
    /// Load and validate the config file, then exit
    CheckConfig(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long, default_value = "config.yaml")]
    config_file: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("metrics: {0}")]
    Metrics(#[from] statsd::MetricsError),
    #[error("platform client: {0}")]
    Client(#[from] ClientError),
    #[error("segment store: {0}")]
    Store(#[from] StoreError),
    #[error("could not start runtime: {0}")]
    Runtime(std::io::Error),
    #[error(transparent)]
    Launcher(#[from] LauncherError),
}

fn main() -> ExitCode {
    let cli = CliCommand::parse();

    let result = match cli {
        CliCommand::Serve(args) => serve(&args),
        CliCommand::CheckConfig(args) => Config::from_file(&args.config_file)
            .map(|_| println!("{} is valid", args.config_file.display()))
            .map_err(CliError::from),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "campaign-console exited with an error");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn serve(args: &ConfigArgs) -> Result<(), CliError> {
    let config = Config::from_file(&args.config_file)?;

    // Held until exit so buffered events are flushed
    let _sentry = logging::init(&config.logging);
    tracing::info!(config_file = %args.config_file.display(), "starting campaign-console");

    if let Some(metrics_config) = &config.metrics {
        statsd::init(metrics_config)?;
    }

    let platform: Arc<dyn CampaignPlatform> = Arc::new(KlaviyoClient::from_env(&config.klaviyo)?);
    let store = segment_store::open(&config.segment_store)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    rt.block_on(launcher::run(config.console, platform, store))?;
    Ok(())
}

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use stay_aggregator::provider::build_adapters;
use stay_aggregator::{
    load_app_config, ErrorReporter, ProviderAggregator, RetryExecutor, SearchRequest,
    UserFacingError,
};

#[derive(Debug, Parser)]
#[command(name = "stay-search")]
#[command(about = "Search hotel listings across the configured providers")]
struct Cli {
    /// City or area to search
    #[arg(long)]
    location: String,
    /// Check-in date (YYYY-MM-DD)
    #[arg(long)]
    check_in: String,
    /// Check-out date (YYYY-MM-DD)
    #[arg(long)]
    check_out: String,
    #[arg(long, default_value_t = 1)]
    guests: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = load_app_config().context("failed to load configuration")?;
    init_tracing(&config.log_level);
    tracing::debug!(?config, "configuration loaded");

    let reporter = Arc::new(
        ErrorReporter::from_config(&config.reporter).context("failed to build error reporter")?,
    );
    let adapters = build_adapters(&config).context("failed to build provider adapters")?;
    let aggregator = ProviderAggregator::new(adapters, Arc::clone(&reporter));
    let executor = RetryExecutor::new(Arc::clone(&reporter), config.retry);

    let request = match SearchRequest::new(&cli.location, &cli.check_in, &cli.check_out, cli.guests)
    {
        Ok(request) => request,
        Err(err) => {
            tracing::debug!(error = %err, "rejected search input");
            eprintln!("{}", UserFacingError::from_internal(&err.to_string()));
            return Ok(ExitCode::FAILURE);
        }
    };

    let outcome = executor.execute(|| aggregator.search(&request)).await;

    // deliveries still in flight are cancelled when the runtime shuts down
    reporter
        .flush(Duration::from_secs(config.reporter.timeout_secs))
        .await;

    match outcome {
        Ok(listings) => {
            println!("{}", serde_json::to_string_pretty(&listings)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(user_error) => {
            eprintln!("{user_error}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

//! Alerter CLI
//!
//! Command-line interface for the delivery polling and alerting service.

use std::path::PathBuf;

use clap::Parser;
use kloom_alerter::{load_config, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "kloom-alerter")]
#[command(about = "Delivery polling and alerting service")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Delivery server base URL (overrides config file)
    #[arg(long)]
    endpoint: Option<String>,

    /// Verify an account email against the server and exit
    #[arg(long, value_name = "EMAIL")]
    verify_email: Option<String>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, endpoint={:?}, log_level={:?}",
        args.config,
        args.endpoint,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }

    if let Some(email) = &args.verify_email {
        let valid = kloom_alerter::run_verify(config, email).await?;
        println!("{}", if valid { "valid" } else { "invalid" });
        if !valid {
            std::process::exit(1);
        }
        return Ok(());
    }

    tracing::info!("Starting alerter service");
    tracing::debug!(
        "Poll every {}s after {}s, connectivity threshold {}s",
        config.poll_interval_seconds,
        config.initial_delay_seconds,
        config.connectivity_threshold_seconds
    );

    kloom_alerter::run(config).await?;

    Ok(())
}

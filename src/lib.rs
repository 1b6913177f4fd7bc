//! Kloom Alerter - delivery polling and alerting service
//!
//! Polls the delivery server for deliveries in range, raises and clears a
//! deliveries alert, and independently raises a connectivity alert when the
//! server has been unreachable too long.

pub mod config;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod io;
pub mod notifier;
pub mod probe;
pub mod scheduler;
pub mod store;

pub use config::{load_config, Config};
pub use error::{AlerterError, Result};

use std::sync::Arc;
use std::time::Duration;

use crate::engine::Engine;
use crate::fetcher::StatusFetcher;
use crate::io::{HttpClient, ReqwestHttpClient, HTTP_TIMEOUT};
use crate::notifier::LogNotifier;
use crate::probe::{ConnectivityProbe, TcpProbe};
use crate::scheduler::Scheduler;
use crate::store::{FileStore, LastSuccessStore};

fn build_fetcher(config: &Config) -> Result<Arc<StatusFetcher>> {
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new(HTTP_TIMEOUT)?);
    let probe: Arc<dyn ConnectivityProbe> = Arc::new(TcpProbe::from_endpoint(&config.endpoint)?);
    Ok(Arc::new(StatusFetcher::new(config, http, probe)))
}

/// Run the alerting service with the given configuration until ctrl-c
pub async fn run(config: Config) -> Result<()> {
    let fetcher = build_fetcher(&config)?;
    let store = LastSuccessStore::new(Arc::new(FileStore::new(config.store_path.clone())));
    let notifier = Arc::new(LogNotifier);
    let engine = Engine::new(
        store,
        notifier,
        Duration::from_secs(config.connectivity_threshold_seconds),
    );

    let mut scheduler = Scheduler::new(
        fetcher,
        engine,
        Duration::from_secs(config.poll_interval_seconds),
        Duration::from_secs(config.initial_delay_seconds),
    );

    scheduler.arm();
    tracing::info!("Alerter started, polling {}", config.endpoint);

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    scheduler.disarm().await;
    tracing::info!("Alerter stopped");

    Ok(())
}

/// One-shot account verification against the configured server
pub async fn run_verify(config: Config, email: &str) -> Result<bool> {
    let fetcher = build_fetcher(&config)?;
    Ok(fetcher.verify(email).await)
}

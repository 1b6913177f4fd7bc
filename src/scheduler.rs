//! Polling scheduler with explicit arm/disarm

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::engine::Engine;
use crate::fetcher::StatusFetcher;

/// Fires the poll-fetch-decide cycle on a fixed cadence while armed.
///
/// Arming spawns a single background task; ticks run sequentially on it,
/// so a slow fetch delays (never overlaps) the next tick and overdue
/// ticks are skipped, not queued. Disarming cancels future ticks and
/// waits for an in-flight tick to finish.
pub struct Scheduler {
    fetcher: Arc<StatusFetcher>,
    engine: Arc<Mutex<Engine>>,
    interval: Duration,
    initial_delay: Duration,
    cancel: Option<CancellationToken>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(
        fetcher: Arc<StatusFetcher>,
        engine: Engine,
        interval: Duration,
        initial_delay: Duration,
    ) -> Self {
        Self {
            fetcher,
            engine: Arc::new(Mutex::new(engine)),
            interval,
            initial_delay,
            cancel: None,
            handle: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.cancel.is_some()
    }

    /// Start ticking; a no-op when already armed
    pub fn arm(&mut self) {
        if self.cancel.is_some() {
            tracing::debug!("Scheduler already armed");
            return;
        }

        let cancel = CancellationToken::new();
        let fetcher = Arc::clone(&self.fetcher);
        let engine = Arc::clone(&self.engine);
        let interval = self.interval;
        let initial_delay = self.initial_delay;
        let task_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            tick_loop(fetcher, engine, interval, initial_delay, task_cancel).await;
        });

        self.cancel = Some(cancel);
        self.handle = Some(handle);
        tracing::info!(
            "Scheduler armed: first tick in {:?}, then every {:?}",
            self.initial_delay,
            self.interval
        );
    }

    /// Stop ticking. An in-flight tick completes before this returns.
    pub async fn disarm(&mut self) {
        let Some(cancel) = self.cancel.take() else {
            tracing::debug!("Scheduler already idle");
            return;
        };
        cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        tracing::info!("Scheduler disarmed");
    }

    /// Shared engine handle, for inspecting alert state
    pub fn engine(&self) -> Arc<Mutex<Engine>> {
        Arc::clone(&self.engine)
    }
}

async fn tick_loop(
    fetcher: Arc<StatusFetcher>,
    engine: Arc<Mutex<Engine>>,
    interval: Duration,
    initial_delay: Duration,
    cancel: CancellationToken,
) {
    let start = tokio::time::Instant::now() + initial_delay;
    let mut ticker = tokio::time::interval_at(start, interval);
    // Skip overdue ticks instead of queueing them
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel.cancelled() => {
                tracing::debug!("Polling loop cancelled");
                break;
            }
        }

        let outcome = fetcher.fetch().await;
        engine.lock().await.on_tick(outcome, current_epoch_ms()).await;
    }
}

pub(crate) fn current_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

//! Alert decision engine: turns fetch outcomes into raise/clear actions
//!
//! Two independent alert channels: deliveries (count > 0 on the last
//! successful fetch) and connectivity (too long since the last success).
//! Failed fetches never touch the deliveries channel, so a transient miss
//! cannot flap an existing alert.

use std::sync::Arc;
use std::time::Duration;

use crate::fetcher::FetchOutcome;
use crate::notifier::{Alert, Notifier, CONNECTIVITY_ALERT_ID, DELIVERIES_ALERT_ID};
use crate::store::LastSuccessStore;

/// What to do with one alert channel after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDecision {
    /// Show the alert, or update its displayed value if already shown
    Raise(i64),
    Clear,
    NoChange,
}

/// Per-channel decisions for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickDecisions {
    pub deliveries: AlertDecision,
    pub connectivity: AlertDecision,
}

/// The decision rule, kept pure so scenario tests can drive the clock.
///
/// `elapsed_ms` is time since the last successful fetch; it is only
/// consulted on failure outcomes.
pub fn decide(outcome: &FetchOutcome, elapsed_ms: i64, threshold_ms: i64) -> TickDecisions {
    match outcome {
        FetchOutcome::Success { count } => TickDecisions {
            deliveries: if *count > 0 {
                AlertDecision::Raise(*count as i64)
            } else {
                AlertDecision::Clear
            },
            connectivity: AlertDecision::Clear,
        },
        FetchOutcome::NetworkUnavailable
        | FetchOutcome::TransportError { .. }
        | FetchOutcome::ParseError { .. } => TickDecisions {
            deliveries: AlertDecision::NoChange,
            connectivity: if elapsed_ms >= threshold_ms {
                AlertDecision::Raise(elapsed_ms)
            } else {
                AlertDecision::Clear
            },
        },
    }
}

/// Tracked state of one alert channel
#[derive(Debug)]
struct ChannelState {
    id: u32,
    active: bool,
    last_value: Option<i64>,
}

impl ChannelState {
    fn new(id: u32) -> Self {
        Self {
            id,
            active: false,
            last_value: None,
        }
    }
}

/// Applies tick decisions to the notifier, tracking per-channel state so
/// that raise and clear are exactly idempotent
pub struct Engine {
    store: LastSuccessStore,
    notifier: Arc<dyn Notifier>,
    threshold_ms: i64,
    deliveries: ChannelState,
    connectivity: ChannelState,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("deliveries", &self.deliveries)
            .field("connectivity", &self.connectivity)
            .finish()
    }
}

impl Engine {
    pub fn new(store: LastSuccessStore, notifier: Arc<dyn Notifier>, threshold: Duration) -> Self {
        Self {
            store,
            notifier,
            threshold_ms: threshold.as_millis() as i64,
            deliveries: ChannelState::new(DELIVERIES_ALERT_ID),
            connectivity: ChannelState::new(CONNECTIVITY_ALERT_ID),
        }
    }

    /// Process one fetch outcome at the given wall-clock time
    pub async fn on_tick(&mut self, outcome: FetchOutcome, now_ms: i64) {
        let decisions = match &outcome {
            FetchOutcome::Success { .. } => {
                self.store.write_last_success(now_ms);
                decide(&outcome, 0, self.threshold_ms)
            }
            _ => {
                let elapsed_ms = now_ms - self.store.read_last_success(now_ms);
                tracing::debug!("{} ms since last successful fetch", elapsed_ms);
                decide(&outcome, elapsed_ms, self.threshold_ms)
            }
        };

        tracing::debug!("Tick {:?} -> {:?}", outcome, decisions);

        apply(
            &self.notifier,
            &mut self.deliveries,
            decisions.deliveries,
            deliveries_alert,
        )
        .await;
        apply(
            &self.notifier,
            &mut self.connectivity,
            decisions.connectivity,
            connectivity_alert,
        )
        .await;
    }

    pub fn deliveries_active(&self) -> bool {
        self.deliveries.active
    }

    pub fn deliveries_count(&self) -> Option<i64> {
        self.deliveries.last_value
    }

    pub fn connectivity_active(&self) -> bool {
        self.connectivity.active
    }
}

async fn apply(
    notifier: &Arc<dyn Notifier>,
    state: &mut ChannelState,
    decision: AlertDecision,
    make_alert: impl Fn(i64) -> Alert,
) {
    match decision {
        AlertDecision::Raise(value) => {
            let alert = make_alert(value);
            match notifier.raise(&alert).await {
                Ok(()) => {
                    state.active = true;
                    state.last_value = Some(value);
                }
                Err(e) => tracing::warn!("Raising alert {} failed: {}", alert.id, e),
            }
        }
        AlertDecision::Clear => {
            // Clearing an inactive channel is a no-op
            if !state.active {
                return;
            }
            match notifier.clear(state.id).await {
                Ok(()) => state.active = false,
                Err(e) => tracing::warn!("Clearing alert {} failed: {}", state.id, e),
            }
        }
        AlertDecision::NoChange => {}
    }
}

fn deliveries_alert(count: i64) -> Alert {
    Alert {
        id: DELIVERIES_ALERT_ID,
        title: "Deliveries in range".to_string(),
        message: format!("about {}", count),
        priority: 1,
    }
}

fn connectivity_alert(elapsed_ms: i64) -> Alert {
    Alert {
        id: CONNECTIVITY_ALERT_ID,
        title: "Can't connect to server".to_string(),
        message: format!("check internet connection ({} min)", elapsed_ms / 60_000),
        priority: 0,
    }
}

//! Notifier trait for raising and clearing alerts

use async_trait::async_trait;

/// Stable alert channel ids; these address raise/clear across restarts
pub const DELIVERIES_ALERT_ID: u32 = 2;
pub const CONNECTIVITY_ALERT_ID: u32 = 3;

/// An alert to be shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub id: u32,
    pub title: String,
    pub message: String,
    pub priority: i8,
}

/// Renders and clears alerts by stable id.
///
/// Raising an id that is already shown replaces its content; clearing an
/// id that is not shown is a no-op on the rendering side.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    async fn raise(&self, alert: &Alert) -> crate::Result<()>;
    async fn clear(&self, id: u32) -> crate::Result<()>;
}

/// Notifier that writes alerts to the log
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn raise(&self, alert: &Alert) -> crate::Result<()> {
        if alert.priority > 0 {
            tracing::warn!("ALERT [{}] {}: {}", alert.id, alert.title, alert.message);
        } else {
            tracing::info!("ALERT [{}] {}: {}", alert.id, alert.title, alert.message);
        }
        Ok(())
    }

    async fn clear(&self, id: u32) -> crate::Result<()> {
        tracing::info!("ALERT [{}] cleared", id);
        Ok(())
    }
}

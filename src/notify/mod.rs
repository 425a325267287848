//! Notification dispatch
//!
//! Ledger mutations publish `Notification`s after they are durably applied.
//! Delivery is best-effort: a failed delivery is logged and never undoes
//! the mutation that produced it.

use async_trait::async_trait;

use crate::domain::Notification;

/// Notification delivery errors
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Notification channel closed")]
    ChannelClosed,
}

/// Outbound channel to the notification layer
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Notifier that only writes a log line per event.
///
/// Secret payloads (one-time passcodes) are never written out.
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        if notification.is_sensitive() {
            tracing::info!(
                event_type = notification.event_type(),
                recipient = %notification.recipient(),
                "Notification dispatched (payload redacted)"
            );
        } else {
            let payload = serde_json::to_string(notification)
                .map_err(|e| NotifyError::Delivery(e.to_string()))?;
            tracing::info!(
                event_type = notification.event_type(),
                recipient = %notification.recipient(),
                payload = %payload,
                "Notification dispatched"
            );
        }
        Ok(())
    }
}

/// Deliver `notification`, logging and swallowing any failure
pub async fn dispatch(notifier: &dyn Notifier, notification: Notification) {
    if let Err(e) = notifier.notify(&notification).await {
        tracing::warn!(
            event_type = notification.event_type(),
            recipient = %notification.recipient(),
            error = %e,
            "Notification delivery failed"
        );
    }
}

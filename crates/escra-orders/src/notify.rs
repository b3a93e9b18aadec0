//! Fire-and-forget notification delivery.
//!
//! Notifications are a side effect, never part of the contract: a send
//! failure is logged at warn level and the primary operation proceeds.
//! Services call [`deliver`] rather than the sink directly so that
//! policy lives in one place.

use std::sync::RwLock;

use escra_core::UserId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// What a notification is about, for recipient-side routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderCreated,
    OrderStatusChanged,
    MilestoneSubmitted,
    MilestoneApproved,
    MilestoneRejected,
    PaymentReleased,
    DisputeOpened,
    DisputeUpdated,
    DisputeResolved,
}

/// One message to one recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

pub trait NotificationSink {
    fn send(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Send a notification, swallowing and logging any failure.
pub fn deliver(sink: &dyn NotificationSink, notification: Notification) {
    let kind = notification.kind;
    let recipient = notification.recipient;
    if let Err(err) = sink.send(notification) {
        warn!(%recipient, ?kind, %err, "notification dropped");
    }
}

/// Sink that discards everything. Useful when a caller has no delivery
/// channel configured.
pub struct NullSink;

impl NotificationSink for NullSink {
    fn send(&self, _notification: Notification) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Sink that records messages in memory, for asserting on delivery in
/// tests.
pub struct RecordingSink {
    sent: RwLock<Vec<Notification>>,
    failing: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            sent: RwLock::new(Vec::new()),
            failing: false,
        }
    }

    /// A sink whose every send fails, for exercising the swallow path.
    pub fn failing() -> Self {
        Self {
            sent: RwLock::new(Vec::new()),
            failing: true,
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.read().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for RecordingSink {
    fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        if self.failing {
            return Err(NotifyError::Delivery("sink configured to fail".into()));
        }
        self.sent
            .write()
            .map_err(|_| NotifyError::Delivery("sink lock poisoned".into()))?
            .push(notification);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(recipient: UserId) -> Notification {
        Notification {
            recipient,
            kind: NotificationKind::OrderCreated,
            title: "Order placed".into(),
            body: "A new order is waiting for you".into(),
            link: None,
        }
    }

    #[test]
    fn deliver_swallows_sink_failures() {
        let sink = RecordingSink::failing();
        // Must not panic or propagate.
        deliver(&sink, note(UserId::new()));
        assert!(sink.sent().is_empty());
    }

    #[test]
    fn recording_sink_captures_messages() {
        let sink = RecordingSink::new();
        let recipient = UserId::new();
        deliver(&sink, note(recipient));
        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, recipient);
    }
}

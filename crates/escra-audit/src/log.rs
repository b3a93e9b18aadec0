//! The event log trait and its in-memory adapter.
//!
//! Services append through [`EventLog`] and treat failures as
//! non-fatal: a write that changed entity state must not be rolled back
//! because its audit record could not be stored. Callers log the error
//! and continue. Reads surface the error so the timeline layer can fall
//! back to reconstruction.

use std::sync::RwLock;

use escra_core::{DisputeId, OrderId};
use thiserror::Error;

use crate::event::{DisputeEvent, OrderEvent};

/// Failures raised by an event log backend.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The backing store cannot be reached at all.
    #[error("audit store unavailable")]
    StoreUnavailable,

    /// The store was reachable but the operation failed.
    #[error("audit storage error: {0}")]
    Storage(String),
}

/// Append-only store for order and dispute events.
///
/// Events within one parent are returned in append order, which is also
/// chronological order because append sets the record timestamp.
pub trait EventLog {
    fn append_order_event(&self, event: OrderEvent) -> Result<(), AuditError>;
    fn append_dispute_event(&self, event: DisputeEvent) -> Result<(), AuditError>;
    fn order_events(&self, order_id: OrderId) -> Result<Vec<OrderEvent>, AuditError>;
    fn dispute_events(&self, dispute_id: DisputeId) -> Result<Vec<DisputeEvent>, AuditError>;
}

// ── In-memory adapter ────────────────────────────────────────────────────────

/// Vec-backed event log for tests and single-process deployments.
pub struct InMemoryEventLog {
    order_events: RwLock<Vec<OrderEvent>>,
    dispute_events: RwLock<Vec<DisputeEvent>>,
    available: bool,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self {
            order_events: RwLock::new(Vec::new()),
            dispute_events: RwLock::new(Vec::new()),
            available: true,
        }
    }

    /// A log whose every operation fails with [`AuditError::StoreUnavailable`].
    ///
    /// Used in tests to exercise the audit-failure and timeline-fallback
    /// paths.
    pub fn unavailable() -> Self {
        Self {
            order_events: RwLock::new(Vec::new()),
            dispute_events: RwLock::new(Vec::new()),
            available: false,
        }
    }

    fn check_available(&self) -> Result<(), AuditError> {
        if self.available {
            Ok(())
        } else {
            Err(AuditError::StoreUnavailable)
        }
    }
}

impl Default for InMemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog for InMemoryEventLog {
    fn append_order_event(&self, event: OrderEvent) -> Result<(), AuditError> {
        self.check_available()?;
        let mut events = self
            .order_events
            .write()
            .map_err(|_| AuditError::Storage("order event lock poisoned".into()))?;
        events.push(event);
        Ok(())
    }

    fn append_dispute_event(&self, event: DisputeEvent) -> Result<(), AuditError> {
        self.check_available()?;
        let mut events = self
            .dispute_events
            .write()
            .map_err(|_| AuditError::Storage("dispute event lock poisoned".into()))?;
        events.push(event);
        Ok(())
    }

    fn order_events(&self, order_id: OrderId) -> Result<Vec<OrderEvent>, AuditError> {
        self.check_available()?;
        let events = self
            .order_events
            .read()
            .map_err(|_| AuditError::Storage("order event lock poisoned".into()))?;
        Ok(events
            .iter()
            .filter(|e| e.order_id == order_id)
            .cloned()
            .collect())
    }

    fn dispute_events(&self, dispute_id: DisputeId) -> Result<Vec<DisputeEvent>, AuditError> {
        self.check_available()?;
        let events = self
            .dispute_events
            .read()
            .map_err(|_| AuditError::Storage("dispute event lock poisoned".into()))?;
        Ok(events
            .iter()
            .filter(|e| e.dispute_id == dispute_id)
            .cloned()
            .collect())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{DisputeEventType, OrderEventType};
    use escra_core::UserId;

    #[test]
    fn events_come_back_in_append_order() {
        let log = InMemoryEventLog::new();
        let order_id = OrderId::new();
        let buyer = UserId::new();

        for event_type in [
            OrderEventType::Created,
            OrderEventType::Accepted,
            OrderEventType::Started,
        ] {
            log.append_order_event(OrderEvent::new(
                order_id,
                event_type,
                event_type.as_str(),
                Some(buyer),
            ))
            .expect("append");
        }

        let events = log.order_events(order_id).expect("read");
        let kinds: Vec<_> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            kinds,
            vec![
                OrderEventType::Created,
                OrderEventType::Accepted,
                OrderEventType::Started
            ]
        );
    }

    #[test]
    fn reads_are_scoped_to_the_requested_parent() {
        let log = InMemoryEventLog::new();
        let first = OrderId::new();
        let second = OrderId::new();

        log.append_order_event(OrderEvent::new(first, OrderEventType::Created, "a", None))
            .expect("append");
        log.append_order_event(OrderEvent::new(second, OrderEventType::Created, "b", None))
            .expect("append");

        assert_eq!(log.order_events(first).expect("read").len(), 1);
        assert_eq!(log.order_events(second).expect("read").len(), 1);
        assert!(log.order_events(OrderId::new()).expect("read").is_empty());
    }

    #[test]
    fn unavailable_log_fails_every_operation() {
        let log = InMemoryEventLog::unavailable();
        let err = log
            .append_dispute_event(DisputeEvent::new(
                DisputeId::new(),
                OrderId::new(),
                DisputeEventType::Opened,
                "opened",
                None,
            ))
            .expect_err("append must fail");
        assert!(matches!(err, AuditError::StoreUnavailable));
        assert!(matches!(
            log.order_events(OrderId::new()),
            Err(AuditError::StoreUnavailable)
        ));
    }
}

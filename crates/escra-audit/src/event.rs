//! Typed audit event records.
//!
//! Events are immutable once appended. Each record carries the acting
//! user (if the change was user-initiated; automated transitions leave
//! the actor unset), a machine-readable event kind, a human-readable
//! description, and optional JSON metadata for amounts, reasons, and
//! other kind-specific detail.

use escra_core::{DisputeId, EventId, OrderId, Timestamp, UserId};
use escra_state::{DisputeStatus, OrderStatus};
use serde::{Deserialize, Serialize};

// ── Order events ─────────────────────────────────────────────────────────────

/// Kinds of events recorded against an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEventType {
    Created,
    Accepted,
    Started,
    Completed,
    Cancelled,
    Disputed,
    MilestoneSubmitted,
    MilestoneApproved,
    MilestoneRejected,
    MilestonePaid,
    EscrowReleased,
    EscrowRefunded,
    InvoiceIssued,
}

impl OrderEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Accepted => "accepted",
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Disputed => "disputed",
            Self::MilestoneSubmitted => "milestone_submitted",
            Self::MilestoneApproved => "milestone_approved",
            Self::MilestoneRejected => "milestone_rejected",
            Self::MilestonePaid => "milestone_paid",
            Self::EscrowReleased => "escrow_released",
            Self::EscrowRefunded => "escrow_refunded",
            Self::InvoiceIssued => "invoice_issued",
        }
    }

    /// The event kind recorded when an order enters `status`.
    pub fn for_status(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Pending => Self::Created,
            OrderStatus::Accepted => Self::Accepted,
            OrderStatus::InProgress => Self::Started,
            OrderStatus::Completed => Self::Completed,
            OrderStatus::Cancelled => Self::Cancelled,
            OrderStatus::Disputed => Self::Disputed,
        }
    }
}

impl std::fmt::Display for OrderEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single append-only record in an order's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    pub id: EventId,
    pub order_id: OrderId,
    pub event_type: OrderEventType,
    pub description: String,
    /// Unset for automated transitions (auto-resolution, escrow hooks).
    pub actor: Option<UserId>,
    /// Denormalized display name, captured at append time so the record
    /// survives later profile changes. Empty for system entries.
    pub actor_name: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub recorded_at: Timestamp,
}

impl OrderEvent {
    pub fn new(
        order_id: OrderId,
        event_type: OrderEventType,
        description: impl Into<String>,
        actor: Option<UserId>,
    ) -> Self {
        Self {
            id: EventId::new(),
            order_id,
            event_type,
            description: description.into(),
            actor,
            actor_name: None,
            metadata: None,
            recorded_at: Timestamp::now(),
        }
    }

    pub fn with_actor_name(mut self, name: impl Into<String>) -> Self {
        self.actor_name = Some(name.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

// ── Dispute events ───────────────────────────────────────────────────────────

/// Kinds of events recorded against a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeEventType {
    Opened,
    EvidenceAdded,
    StatusChanged,
    MediatorAssigned,
    Resolved,
    Escalated,
    Cancelled,
    AutoResolved,
}

impl DisputeEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::EvidenceAdded => "evidence_added",
            Self::StatusChanged => "status_changed",
            Self::MediatorAssigned => "mediator_assigned",
            Self::Resolved => "resolved",
            Self::Escalated => "escalated",
            Self::Cancelled => "cancelled",
            Self::AutoResolved => "auto_resolved",
        }
    }

    /// The event kind recorded when a dispute enters `status`.
    pub fn for_status(status: DisputeStatus) -> Self {
        match status {
            DisputeStatus::Open => Self::Opened,
            DisputeStatus::Resolved => Self::Resolved,
            DisputeStatus::Escalated => Self::Escalated,
            DisputeStatus::Cancelled => Self::Cancelled,
            DisputeStatus::UnderReview | DisputeStatus::Mediation | DisputeStatus::Arbitration => {
                Self::StatusChanged
            }
        }
    }
}

impl std::fmt::Display for DisputeEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single append-only record in a dispute's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisputeEvent {
    pub id: EventId,
    pub dispute_id: DisputeId,
    pub order_id: OrderId,
    pub event_type: DisputeEventType,
    pub description: String,
    pub actor: Option<UserId>,
    /// Denormalized display name, captured at append time. Empty for
    /// system entries.
    pub actor_name: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub recorded_at: Timestamp,
}

impl DisputeEvent {
    pub fn new(
        dispute_id: DisputeId,
        order_id: OrderId,
        event_type: DisputeEventType,
        description: impl Into<String>,
        actor: Option<UserId>,
    ) -> Self {
        Self {
            id: EventId::new(),
            dispute_id,
            order_id,
            event_type,
            description: description.into(),
            actor,
            actor_name: None,
            metadata: None,
            recorded_at: Timestamp::now(),
        }
    }

    pub fn with_actor_name(mut self, name: impl Into<String>) -> Self {
        self.actor_name = Some(name.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_maps_to_a_distinct_lifecycle_event() {
        assert_eq!(
            OrderEventType::for_status(OrderStatus::Accepted),
            OrderEventType::Accepted
        );
        assert_eq!(
            OrderEventType::for_status(OrderStatus::InProgress),
            OrderEventType::Started
        );
        assert_eq!(
            OrderEventType::for_status(OrderStatus::Disputed),
            OrderEventType::Disputed
        );
    }

    #[test]
    fn intermediate_dispute_statuses_share_the_status_changed_kind() {
        for status in [
            DisputeStatus::UnderReview,
            DisputeStatus::Mediation,
            DisputeStatus::Arbitration,
        ] {
            assert_eq!(
                DisputeEventType::for_status(status),
                DisputeEventType::StatusChanged
            );
        }
        assert_eq!(
            DisputeEventType::for_status(DisputeStatus::Resolved),
            DisputeEventType::Resolved
        );
    }

    #[test]
    fn metadata_round_trips_through_json() {
        let order_id = OrderId::new();
        let event = OrderEvent::new(
            order_id,
            OrderEventType::EscrowReleased,
            "escrow released to seller",
            None,
        )
        .with_metadata(json!({ "amount_minor": 45_000, "currency": "USD" }));

        let encoded = serde_json::to_string(&event).expect("serialize");
        let decoded: OrderEvent = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(decoded.order_id, order_id);
        assert_eq!(decoded.event_type, OrderEventType::EscrowReleased);
        assert_eq!(
            decoded.metadata.and_then(|m| m["amount_minor"].as_i64()),
            Some(45_000)
        );
    }

    #[test]
    fn automated_events_have_no_actor() {
        let event = DisputeEvent::new(
            DisputeId::new(),
            OrderId::new(),
            DisputeEventType::AutoResolved,
            "resolved automatically after inactivity window",
            None,
        );
        assert!(event.actor.is_none());
        assert_eq!(event.event_type.as_str(), "auto_resolved");
    }
}

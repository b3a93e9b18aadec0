//! The dispute entity.

use escra_core::{DisputeId, Money, OrderId, Timestamp, UserId};
use escra_state::DisputeStatus;
use serde::{Deserialize, Serialize};

/// An adversarial resolution process over one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispute {
    pub id: DisputeId,
    pub order_id: OrderId,
    pub raised_by: UserId,
    pub reason: String,
    pub evidence_urls: Vec<String>,
    pub status: DisputeStatus,
    /// Human-readable resolution text, set when the dispute resolves.
    pub resolution: Option<String>,
    /// The buyer refund executed at resolution, if any.
    pub resolution_amount: Option<Money>,
    /// Mediator or arbitrator the dispute is assigned to.
    pub assigned_to: Option<UserId>,
    pub created_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
}

impl Dispute {
    pub fn open(order_id: OrderId, raised_by: UserId, reason: impl Into<String>) -> Self {
        Self {
            id: DisputeId::new(),
            order_id,
            raised_by,
            reason: reason.into(),
            evidence_urls: Vec::new(),
            status: DisputeStatus::Open,
            resolution: None,
            resolution_amount: None,
            assigned_to: None,
            created_at: Timestamp::now(),
            resolved_at: None,
        }
    }

    /// Whether the dispute still blocks the order.
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_new_dispute_is_open_and_active() {
        let dispute = Dispute::open(OrderId::new(), UserId::new(), "work not delivered");
        assert_eq!(dispute.status, DisputeStatus::Open);
        assert!(dispute.is_active());
        assert!(dispute.evidence_urls.is_empty());
        assert!(dispute.resolved_at.is_none());
    }
}

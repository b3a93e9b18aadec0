//! # Order Lifecycle
//!
//! The order status machine and the escrow status that must stay
//! consistent with it.
//!
//! ## Transition Graph
//!
//! ```text
//! Pending ──▶ Accepted ──▶ InProgress ──▶ Completed (terminal)
//!    │            │            │  ▲
//!    │            │            ▼  │
//!    │            │         Disputed ──▶ Completed
//!    │            │            │
//!    ▼            ▼            ▼
//! Cancelled   Cancelled    Cancelled (terminal)
//! ```

use serde::{Deserialize, Serialize};

// ── Order Status ─────────────────────────────────────────────────────

/// The lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order placed by the buyer, awaiting seller acceptance.
    Pending,
    /// Seller has accepted; work has not started.
    Accepted,
    /// Work is underway.
    InProgress,
    /// An active dispute has paused the order.
    Disputed,
    /// Order fulfilled and settled. Terminal.
    Completed,
    /// Order cancelled by either party or by dispute resolution. Terminal.
    Cancelled,
}

impl OrderStatus {
    /// The canonical snake_case name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::InProgress => "in_progress",
            Self::Disputed => "disputed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether this status is terminal (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether a dispute may be opened while the order is in this status.
    ///
    /// Disputes are restricted to orders where money has changed hands or
    /// is about to: accepted, in-progress, or recently completed work.
    pub fn dispute_eligible(&self) -> bool {
        matches!(self, Self::Accepted | Self::InProgress | Self::Completed)
    }

    /// Valid target statuses from this status.
    pub fn valid_transitions(&self) -> &'static [OrderStatus] {
        match self {
            Self::Pending => &[Self::Accepted, Self::Cancelled],
            Self::Accepted => &[Self::InProgress, Self::Cancelled],
            Self::InProgress => &[Self::Completed, Self::Disputed, Self::Cancelled],
            Self::Disputed => &[Self::InProgress, Self::Cancelled, Self::Completed],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    /// Whether `target` appears in this status's adjacency list.
    pub fn can_transition(&self, target: OrderStatus) -> bool {
        self.valid_transitions().contains(&target)
    }

    /// All order statuses as a slice.
    pub fn all() -> &'static [OrderStatus] {
        &[
            Self::Pending,
            Self::Accepted,
            Self::InProgress,
            Self::Disputed,
            Self::Completed,
            Self::Cancelled,
        ]
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Escrow Status ────────────────────────────────────────────────────

/// Where an order's held funds currently sit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    /// Funds not yet captured.
    Pending,
    /// Funds captured and held in escrow.
    Held,
    /// Funds released to the seller.
    Released,
    /// Funds refunded to the buyer.
    Refunded,
}

impl EscrowStatus {
    /// The canonical snake_case name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Held => "held",
            Self::Released => "released",
            Self::Refunded => "refunded",
        }
    }

    /// Whether this escrow status is consistent with an order status.
    ///
    /// A completed order must have its funds settled one way or the
    /// other: `Released` or `Refunded`, never `Pending` or `Held`. Other
    /// order statuses impose no constraint.
    pub fn consistent_with(&self, order_status: OrderStatus) -> bool {
        match order_status {
            OrderStatus::Completed => matches!(self, Self::Released | Self::Refunded),
            _ => true,
        }
    }
}

impl std::fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn adjacency_matches_table() {
        assert_eq!(
            OrderStatus::Pending.valid_transitions(),
            &[OrderStatus::Accepted, OrderStatus::Cancelled]
        );
        assert_eq!(
            OrderStatus::Accepted.valid_transitions(),
            &[OrderStatus::InProgress, OrderStatus::Cancelled]
        );
        assert_eq!(
            OrderStatus::InProgress.valid_transitions(),
            &[
                OrderStatus::Completed,
                OrderStatus::Disputed,
                OrderStatus::Cancelled
            ]
        );
        assert_eq!(
            OrderStatus::Disputed.valid_transitions(),
            &[
                OrderStatus::InProgress,
                OrderStatus::Cancelled,
                OrderStatus::Completed
            ]
        );
    }

    #[test]
    fn terminal_statuses_have_no_transitions() {
        assert!(OrderStatus::Completed.valid_transitions().is_empty());
        assert!(OrderStatus::Cancelled.valid_transitions().is_empty());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
    }

    #[test]
    fn no_self_loops() {
        for status in OrderStatus::all() {
            assert!(
                !status.can_transition(*status),
                "{status} must not transition to itself"
            );
        }
    }

    #[test]
    fn cancelled_rejects_cancel_again() {
        assert!(!OrderStatus::Cancelled.can_transition(OrderStatus::Cancelled));
    }

    #[test]
    fn dispute_eligibility() {
        assert!(OrderStatus::Accepted.dispute_eligible());
        assert!(OrderStatus::InProgress.dispute_eligible());
        assert!(OrderStatus::Completed.dispute_eligible());
        assert!(!OrderStatus::Pending.dispute_eligible());
        assert!(!OrderStatus::Cancelled.dispute_eligible());
        assert!(!OrderStatus::Disputed.dispute_eligible());
    }

    #[test]
    fn escrow_consistency_for_completed_orders() {
        assert!(EscrowStatus::Released.consistent_with(OrderStatus::Completed));
        assert!(EscrowStatus::Refunded.consistent_with(OrderStatus::Completed));
        assert!(!EscrowStatus::Pending.consistent_with(OrderStatus::Completed));
        assert!(!EscrowStatus::Held.consistent_with(OrderStatus::Completed));
    }

    #[test]
    fn escrow_unconstrained_before_completion() {
        assert!(EscrowStatus::Pending.consistent_with(OrderStatus::Pending));
        assert!(EscrowStatus::Held.consistent_with(OrderStatus::InProgress));
        assert!(EscrowStatus::Refunded.consistent_with(OrderStatus::Cancelled));
    }

    #[test]
    fn status_serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(
            serde_json::from_str::<OrderStatus>("\"disputed\"").unwrap(),
            OrderStatus::Disputed
        );
        assert_eq!(
            serde_json::to_string(&EscrowStatus::Held).unwrap(),
            "\"held\""
        );
    }

    #[test]
    fn display_all_variants() {
        assert_eq!(OrderStatus::Pending.to_string(), "pending");
        assert_eq!(OrderStatus::InProgress.to_string(), "in_progress");
        assert_eq!(EscrowStatus::Released.to_string(), "released");
    }

    fn any_status() -> impl Strategy<Value = OrderStatus> {
        prop::sample::select(OrderStatus::all().to_vec())
    }

    proptest! {
        // Walking any sequence of table edges never escapes a terminal status.
        #[test]
        fn terminal_statuses_trap(targets in prop::collection::vec(any_status(), 1..20)) {
            let mut current = OrderStatus::Pending;
            for target in targets {
                if current.is_terminal() {
                    prop_assert!(!current.can_transition(target));
                } else if current.can_transition(target) {
                    current = target;
                }
            }
        }
    }
}

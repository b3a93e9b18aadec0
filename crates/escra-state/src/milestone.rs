//! # Milestone Lifecycle
//!
//! The per-milestone status machine. Milestones move forward one step at
//! a time: the seller submits, the buyer approves or rejects, and the
//! system marks an approved milestone paid once the escrow transfer
//! lands.
//!
//! ```text
//! Pending ──▶ Submitted ──▶ Approved ──▶ Paid (terminal)
//!                  │
//!                  ▼
//!              Rejected (terminal, dispute follows)
//! ```

use serde::{Deserialize, Serialize};

/// The lifecycle status of a milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    /// Created with the order; work not yet delivered.
    Pending,
    /// Seller has submitted the deliverable for buyer review.
    Submitted,
    /// Buyer approved; escrow transfer in flight.
    Approved,
    /// Funds transferred to the seller. Terminal.
    Paid,
    /// Buyer rejected the deliverable. Terminal; a dispute follows.
    Rejected,
}

impl MilestoneStatus {
    /// The canonical snake_case name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Paid => "paid",
            Self::Rejected => "rejected",
        }
    }

    /// Whether this status is terminal (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Rejected)
    }

    /// Valid target statuses from this status.
    pub fn valid_transitions(&self) -> &'static [MilestoneStatus] {
        match self {
            Self::Pending => &[Self::Submitted],
            Self::Submitted => &[Self::Approved, Self::Rejected],
            Self::Approved => &[Self::Paid],
            Self::Paid | Self::Rejected => &[],
        }
    }

    /// Whether `target` appears in this status's adjacency list.
    pub fn can_transition(&self, target: MilestoneStatus) -> bool {
        self.valid_transitions().contains(&target)
    }
}

impl std::fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_path() {
        assert!(MilestoneStatus::Pending.can_transition(MilestoneStatus::Submitted));
        assert!(MilestoneStatus::Submitted.can_transition(MilestoneStatus::Approved));
        assert!(MilestoneStatus::Submitted.can_transition(MilestoneStatus::Rejected));
        assert!(MilestoneStatus::Approved.can_transition(MilestoneStatus::Paid));
    }

    #[test]
    fn no_skipping_submission() {
        assert!(!MilestoneStatus::Pending.can_transition(MilestoneStatus::Approved));
        assert!(!MilestoneStatus::Pending.can_transition(MilestoneStatus::Paid));
    }

    #[test]
    fn no_double_approval() {
        assert!(!MilestoneStatus::Approved.can_transition(MilestoneStatus::Approved));
        assert!(!MilestoneStatus::Paid.can_transition(MilestoneStatus::Approved));
    }

    #[test]
    fn terminal_statuses() {
        assert!(MilestoneStatus::Paid.is_terminal());
        assert!(MilestoneStatus::Rejected.is_terminal());
        assert!(MilestoneStatus::Paid.valid_transitions().is_empty());
        assert!(MilestoneStatus::Rejected.valid_transitions().is_empty());
        assert!(!MilestoneStatus::Approved.is_terminal());
    }

    #[test]
    fn serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&MilestoneStatus::Submitted).unwrap(),
            "\"submitted\""
        );
    }
}

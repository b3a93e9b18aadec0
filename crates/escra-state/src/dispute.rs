//! # Dispute Lifecycle
//!
//! The dispute status machine. Disputes progress through review and
//! optional mediation/arbitration stages; `Resolved` and `Cancelled` are
//! terminal. `Escalated` disputes can only come back as `Resolved`.
//!
//! ## Transition Graph
//!
//! ```text
//! Open ──▶ UnderReview ──▶ Mediation ──▶ Arbitration
//!  │           │   │          │   │          │
//!  │           │   └──────────┼───┼──────────┼──▶ Resolved (terminal)
//!  │           │              │   │          │
//!  │           └──────────────┴───┴──────────┴──▶ Escalated ──▶ Resolved
//!  ▼
//! Cancelled (terminal)
//! ```

use serde::{Deserialize, Serialize};

/// The lifecycle status of a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    /// Dispute raised by a party; awaiting triage.
    Open,
    /// An arbiter is reviewing the filing and evidence.
    UnderReview,
    /// Parties are in assisted mediation.
    Mediation,
    /// A binding arbitration decision is being prepared.
    Arbitration,
    /// Dispute resolved; financial resolution executed. Terminal.
    Resolved,
    /// Escalated beyond the normal flow (e.g. to senior staff).
    Escalated,
    /// Withdrawn by the raising party before any resolution. Terminal.
    Cancelled,
}

impl DisputeStatus {
    /// The canonical snake_case name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::UnderReview => "under_review",
            Self::Mediation => "mediation",
            Self::Arbitration => "arbitration",
            Self::Resolved => "resolved",
            Self::Escalated => "escalated",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether this status is terminal (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Cancelled)
    }

    /// Valid target statuses from this status.
    pub fn valid_transitions(&self) -> &'static [DisputeStatus] {
        match self {
            Self::Open => &[Self::UnderReview, Self::Cancelled],
            Self::UnderReview => &[Self::Mediation, Self::Resolved, Self::Escalated],
            Self::Mediation => &[Self::Resolved, Self::Arbitration, Self::Escalated],
            Self::Arbitration => &[Self::Resolved, Self::Escalated],
            Self::Escalated => &[Self::Resolved],
            Self::Resolved | Self::Cancelled => &[],
        }
    }

    /// Whether `target` appears in this status's adjacency list.
    pub fn can_transition(&self, target: DisputeStatus) -> bool {
        self.valid_transitions().contains(&target)
    }
}

impl std::fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

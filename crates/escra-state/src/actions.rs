//! # Role-Gated Actions
//!
//! Derives the UI actions permitted for an order status and role, and
//! maps status-changing actions to their target status. Both functions
//! are pure lookups with no persistence effect: the services re-validate
//! every transition against the tables before writing.

use serde::{Deserialize, Serialize};

use crate::order::OrderStatus;

// ── Role ─────────────────────────────────────────────────────────────

/// The role an actor plays with respect to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The buyer who placed the order.
    Buyer,
    /// The seller fulfilling the order.
    Seller,
    /// Platform staff with arbitration powers.
    Admin,
}

impl Role {
    /// The canonical snake_case name of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Actions ──────────────────────────────────────────────────────────

/// A UI action a party may take on an order.
///
/// Some actions change the order status ([`status_for_action`] maps
/// those); others (`Message`, milestone actions) act on sub-entities or
/// side channels and leave the order status untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    /// Seller accepts a pending order.
    Accept,
    /// Seller declines a pending order (cancels it).
    Decline,
    /// Seller starts work on an accepted order.
    Start,
    /// Mark the order completed.
    Complete,
    /// Cancel the order.
    Cancel,
    /// Open a dispute over the order.
    OpenDispute,
    /// Admin resumes a disputed order back into progress.
    Resume,
    /// Seller submits a milestone deliverable.
    SubmitMilestone,
    /// Buyer approves a submitted milestone, releasing its funds.
    ApproveMilestone,
    /// Send a message on the order thread.
    Message,
}

impl OrderAction {
    /// The canonical snake_case name of this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Decline => "decline",
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
            Self::OpenDispute => "open_dispute",
            Self::Resume => "resume",
            Self::SubmitMilestone => "submit_milestone",
            Self::ApproveMilestone => "approve_milestone",
            Self::Message => "message",
        }
    }
}

impl std::fmt::Display for OrderAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actions permitted for `role` on an order in `status`.
///
/// Purely derived; has no persistence effect. Every non-terminal status
/// offers [`Message`](OrderAction::Message) to all roles. `OpenDispute`
/// is suppressed while a dispute is already open.
pub fn available_actions(status: OrderStatus, role: Role, dispute_open: bool) -> Vec<OrderAction> {
    use OrderAction::*;
    use OrderStatus::*;

    if status.is_terminal() {
        return Vec::new();
    }

    let mut actions = match (status, role) {
        (Pending, Role::Buyer) => vec![Cancel],
        (Pending, Role::Seller) => vec![Accept, Decline],
        (Pending, Role::Admin) => vec![Cancel],

        (Accepted, Role::Buyer) => vec![Cancel, OpenDispute],
        (Accepted, Role::Seller) => vec![Start, Cancel, OpenDispute],
        (Accepted, Role::Admin) => vec![Cancel],

        (InProgress, Role::Buyer) => vec![Complete, ApproveMilestone, Cancel, OpenDispute],
        (InProgress, Role::Seller) => vec![SubmitMilestone, Cancel, OpenDispute],
        (InProgress, Role::Admin) => vec![Complete, Cancel],

        // Parties can only talk while a dispute runs; admins arbitrate.
        (Disputed, Role::Buyer | Role::Seller) => vec![],
        (Disputed, Role::Admin) => vec![Resume, Complete, Cancel],

        (Completed | Cancelled, _) => vec![],
    };

    if dispute_open {
        actions.retain(|a| *a != OpenDispute);
    }
    actions.push(Message);
    actions
}

/// The order status resulting from `action` taken in `current`.
///
/// Returns `None` for actions that do not change the order status
/// (`Message`, milestone actions, disputes on orders that stay in
/// place), and for combinations the transition table forbids.
pub fn status_for_action(action: OrderAction, current: OrderStatus) -> Option<OrderStatus> {
    let target = match action {
        OrderAction::Accept => OrderStatus::Accepted,
        OrderAction::Decline | OrderAction::Cancel => OrderStatus::Cancelled,
        OrderAction::Start | OrderAction::Resume => OrderStatus::InProgress,
        OrderAction::Complete => OrderStatus::Completed,
        OrderAction::OpenDispute => OrderStatus::Disputed,
        OrderAction::SubmitMilestone | OrderAction::ApproveMilestone | OrderAction::Message => {
            return None;
        }
    };
    current.can_transition(target).then_some(target)
}

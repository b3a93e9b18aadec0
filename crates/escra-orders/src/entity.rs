//! Order and milestone entities.
//!
//! Amounts are integer minor units ([`Money`]); the VAT and platform
//! fee are stored denormalized on the order so the charged amounts
//! survive later rate changes. Status fields only ever move along the
//! transition tables in `escra-state`, and the services enforce that
//! before every write.

use escra_core::{
    ListingId, MilestoneId, Money, OrderId, OrderNumber, Percent, Timestamp, UserId,
};
use escra_state::{EscrowStatus, MilestoneStatus, OrderStatus};
use serde::{Deserialize, Serialize};

/// How the order's payment is structured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Single payment released on completion.
    OneOff,
    /// Payment partitioned into independently approvable milestones.
    Milestoned,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneOff => "one_off",
            Self::Milestoned => "milestoned",
        }
    }
}

/// A buyer/seller transaction with escrowed funds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub listing_id: Option<ListingId>,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub escrow_status: EscrowStatus,
    pub total_amount: Money,
    pub platform_fee: Money,
    pub vat_amount: Money,
    pub vat_rate: Percent,
    /// Reference into the payment provider; set once the intent is created.
    pub payment_intent_id: Option<String>,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
}

impl Order {
    /// Whether `user` is the buyer or the seller on this order.
    pub fn is_party(&self, user: UserId) -> bool {
        self.buyer_id == user || self.seller_id == user
    }

    /// The other party, given one side of the order.
    ///
    /// Returns `None` when `user` is not a party at all.
    pub fn counterparty(&self, user: UserId) -> Option<UserId> {
        if user == self.buyer_id {
            Some(self.seller_id)
        } else if user == self.seller_id {
            Some(self.buyer_id)
        } else {
            None
        }
    }
}

/// A partitioned, independently approvable slice of an order's total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub id: MilestoneId,
    pub order_id: OrderId,
    pub title: String,
    pub description: Option<String>,
    pub amount: Money,
    pub due_date: Option<Timestamp>,
    pub status: MilestoneStatus,
    pub submitted_at: Option<Timestamp>,
    pub approved_at: Option<Timestamp>,
}

// ── Creation parameters ──────────────────────────────────────────────────────

/// Caller-supplied parameters for a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub seller_id: UserId,
    pub listing_id: Option<ListingId>,
    pub total_amount: Money,
    /// Empty for a one-off order. Amounts must sum to `total_amount`.
    pub milestones: Vec<NewMilestone>,
}

/// Caller-supplied parameters for one milestone of a new order.
#[derive(Debug, Clone)]
pub struct NewMilestone {
    pub title: String,
    pub description: Option<String>,
    pub amount: Money,
    pub due_date: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use escra_core::Currency;

    fn order() -> Order {
        let id = OrderId::new();
        Order {
            id,
            order_number: OrderNumber::for_order(&id),
            buyer_id: UserId::new(),
            seller_id: UserId::new(),
            listing_id: None,
            order_type: OrderType::OneOff,
            status: OrderStatus::Pending,
            escrow_status: EscrowStatus::Pending,
            total_amount: Money::from_minor(100_000, Currency::Usd),
            platform_fee: Money::from_minor(5_000, Currency::Usd),
            vat_amount: Money::from_minor(20_000, Currency::Usd),
            vat_rate: Percent::from_const(20),
            payment_intent_id: None,
            created_at: Timestamp::now(),
            completed_at: None,
            cancelled_at: None,
        }
    }

    #[test]
    fn parties_and_counterparties() {
        let order = order();
        assert!(order.is_party(order.buyer_id));
        assert!(order.is_party(order.seller_id));
        assert_eq!(order.counterparty(order.buyer_id), Some(order.seller_id));
        assert_eq!(order.counterparty(order.seller_id), Some(order.buyer_id));

        let stranger = UserId::new();
        assert!(!order.is_party(stranger));
        assert_eq!(order.counterparty(stranger), None);
    }
}

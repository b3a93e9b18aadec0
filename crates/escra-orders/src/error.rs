//! Error taxonomy for the order and milestone services.

use escra_core::{CoreError, MilestoneId, Money, OrderId, UserId};
use escra_state::{MilestoneStatus, OrderStatus};
use thiserror::Error;

use crate::payments::PaymentError;
use crate::store::StoreError;

/// Failures surfaced by order and milestone operations.
///
/// Every service function returns one of these rather than panicking;
/// the caller decides how to present it. Notification and audit-log
/// failures never appear here because they never fail the primary
/// operation.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    #[error("milestone {0} not found")]
    MilestoneNotFound(MilestoneId),

    #[error("user {user} is not a party to order {order}")]
    NotAParty { order: OrderId, user: UserId },

    #[error("invalid order transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("invalid milestone transition: {from} -> {to}")]
    InvalidMilestoneTransition {
        from: MilestoneStatus,
        to: MilestoneStatus,
    },

    #[error("milestone amounts sum to {actual}, order total is {expected}")]
    MilestoneSumMismatch { expected: Money, actual: Money },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("payment collaborator failed: {0}")]
    Payment(#[from] PaymentError),
}

//! The payment collaborator boundary.
//!
//! The services treat the payment provider as a black box: single-call
//! operations that either succeed or fail, with no internal retry and
//! no distributed transaction around multi-step flows. Errors propagate
//! to the caller as a failed operation.

use std::collections::HashMap;
use std::sync::RwLock;

use escra_core::{Currency, Money, OrderId, Percent};
use thiserror::Error;

/// Platform fee rate applied to every release.
pub const PLATFORM_FEE_RATE: Percent = Percent::from_const(5);

/// Failures raised by the payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment declined: {0}")]
    Declined(String),

    #[error("payment provider unavailable")]
    Unavailable,

    #[error("insufficient escrow: requested {requested}, available {available}")]
    InsufficientEscrow { requested: Money, available: Money },

    #[error("no payment intent exists for order {0}")]
    NoIntent(OrderId),
}

/// Escrow and transfer primitives of the payment provider.
pub trait PaymentGateway {
    /// Create a payment intent for the order total. Returns the
    /// provider-side intent reference.
    fn create_payment_intent(&self, order_id: OrderId, amount: Money)
        -> Result<String, PaymentError>;

    /// Capture the intent and move the funds into escrow.
    fn hold_payment(&self, order_id: OrderId) -> Result<(), PaymentError>;

    /// Transfer `amount` from the order's escrow to the seller.
    fn release_escrow(&self, order_id: OrderId, amount: Money) -> Result<(), PaymentError>;

    /// Return `amount` from the order's escrow to the buyer.
    fn process_refund(&self, order_id: OrderId, amount: Money) -> Result<(), PaymentError>;

    /// Funds still held in escrow for the order.
    fn escrow_balance(&self, order_id: OrderId) -> Result<Money, PaymentError>;

    /// The platform's cut of `amount`, floor-rounded.
    fn calculate_platform_fee(&self, amount: Money) -> Money {
        amount.percentage(PLATFORM_FEE_RATE)
    }
}

// ── In-memory adapter ────────────────────────────────────────────────────────

/// Ledger-backed fake gateway for tests and single-process runs.
///
/// Tracks one escrow balance per order and debits it on release and
/// refund. Configurable failure switches exercise the partial-failure
/// paths of milestone approval and dispute resolution.
pub struct InMemoryPaymentGateway {
    balances: RwLock<HashMap<OrderId, Money>>,
    currency: Currency,
    fail_releases: RwLock<bool>,
    fail_refunds: RwLock<bool>,
}

impl InMemoryPaymentGateway {
    pub fn new(currency: Currency) -> Self {
        Self {
            balances: RwLock::new(HashMap::new()),
            currency,
            fail_releases: RwLock::new(false),
            fail_refunds: RwLock::new(false),
        }
    }

    /// Make every subsequent release fail with `Unavailable`.
    pub fn set_fail_releases(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_releases.write() {
            *flag = fail;
        }
    }

    /// Make every subsequent refund fail with `Unavailable`.
    pub fn set_fail_refunds(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_refunds.write() {
            *flag = fail;
        }
    }

    /// Seed an escrow balance directly, bypassing intent/hold.
    pub fn seed_escrow(&self, order_id: OrderId, amount: Money) {
        if let Ok(mut balances) = self.balances.write() {
            balances.insert(order_id, amount);
        }
    }

    fn poisoned() -> PaymentError {
        PaymentError::Declined("gateway state poisoned".into())
    }

    fn debit(&self, order_id: OrderId, amount: Money) -> Result<(), PaymentError> {
        let mut balances = self.balances.write().map_err(|_| Self::poisoned())?;
        let balance = balances
            .get(&order_id)
            .copied()
            .unwrap_or_else(|| Money::zero(self.currency));
        if amount.minor() > balance.minor() {
            return Err(PaymentError::InsufficientEscrow {
                requested: amount,
                available: balance,
            });
        }
        let remaining = balance
            .checked_sub(amount)
            .map_err(|e| PaymentError::Declined(e.to_string()))?;
        balances.insert(order_id, remaining);
        Ok(())
    }
}

impl PaymentGateway for InMemoryPaymentGateway {
    fn create_payment_intent(
        &self,
        order_id: OrderId,
        amount: Money,
    ) -> Result<String, PaymentError> {
        if amount.currency() != self.currency {
            return Err(PaymentError::Declined(format!(
                "unsupported currency {}",
                amount.currency()
            )));
        }
        let mut balances = self.balances.write().map_err(|_| Self::poisoned())?;
        // Intent created but funds not yet held; hold_payment moves them.
        balances.entry(order_id).or_insert(Money::zero(self.currency));
        Ok(format!("pi_{}", order_id.as_uuid().simple()))
    }

    fn hold_payment(&self, order_id: OrderId) -> Result<(), PaymentError> {
        let mut balances = self.balances.write().map_err(|_| Self::poisoned())?;
        match balances.get_mut(&order_id) {
            Some(_) => Ok(()),
            None => Err(PaymentError::NoIntent(order_id)),
        }
    }

    fn release_escrow(&self, order_id: OrderId, amount: Money) -> Result<(), PaymentError> {
        let failing = *self.fail_releases.read().map_err(|_| Self::poisoned())?;
        if failing {
            return Err(PaymentError::Unavailable);
        }
        self.debit(order_id, amount)
    }

    fn process_refund(&self, order_id: OrderId, amount: Money) -> Result<(), PaymentError> {
        let failing = *self.fail_refunds.read().map_err(|_| Self::poisoned())?;
        if failing {
            return Err(PaymentError::Unavailable);
        }
        self.debit(order_id, amount)
    }

    fn escrow_balance(&self, order_id: OrderId) -> Result<Money, PaymentError> {
        let balances = self.balances.read().map_err(|_| Self::poisoned())?;
        Ok(balances
            .get(&order_id)
            .copied()
            .unwrap_or_else(|| Money::zero(self.currency)))
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

//! Resolution terms and the arithmetic behind them.
//!
//! A resolution names a financial split of the order total: either an
//! explicit buyer refund amount (seller receives the remainder) or a
//! pair of percentages. The split is validated before any payment call
//! is made; execution lives in the service.

use escra_core::{Money, Percent};
use escra_state::{EscrowStatus, OrderStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Terms of a dispute resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DisputeResolution {
    /// Refund a fixed amount to the buyer; the seller receives the
    /// remainder of the total.
    Refund { amount: Money, note: String },
    /// Percentage split of the order total. The percentages may sum to
    /// less than 100; the remainder stays unallocated in escrow.
    Split {
        buyer_refund: Percent,
        seller_payment: Percent,
        note: String,
    },
}

impl DisputeResolution {
    pub fn note(&self) -> &str {
        match self {
            Self::Refund { note, .. } | Self::Split { note, .. } => note,
        }
    }
}

/// Concrete amounts computed from resolution terms and an order total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionAmounts {
    pub buyer_refund: Money,
    pub seller_payment: Money,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("refund {refund} exceeds order total {total}")]
    RefundExceedsTotal { refund: Money, total: Money },

    #[error("refund must be non-negative, got {0}")]
    NegativeRefund(Money),

    #[error("refund currency {refund} does not match order currency {total}")]
    CurrencyMismatch { refund: Money, total: Money },

    #[error("split percentages sum to {sum}%, above 100%")]
    OverAllocated { sum: u32 },
}

impl DisputeResolution {
    /// Compute the concrete refund and seller payment for an order
    /// total, rejecting splits that over-allocate it.
    ///
    /// Percentage amounts floor-round, so a percentage split never
    /// exceeds the total even when both sides round.
    pub fn amounts(&self, total: Money) -> Result<ResolutionAmounts, ResolutionError> {
        match self {
            Self::Refund { amount, .. } => {
                if amount.currency() != total.currency() {
                    return Err(ResolutionError::CurrencyMismatch {
                        refund: *amount,
                        total,
                    });
                }
                if amount.minor() < 0 {
                    return Err(ResolutionError::NegativeRefund(*amount));
                }
                if amount.minor() > total.minor() {
                    return Err(ResolutionError::RefundExceedsTotal {
                        refund: *amount,
                        total,
                    });
                }
                let seller_payment = Money::from_minor(
                    total.minor() - amount.minor(),
                    total.currency(),
                );
                Ok(ResolutionAmounts {
                    buyer_refund: *amount,
                    seller_payment,
                })
            }
            Self::Split {
                buyer_refund,
                seller_payment,
                ..
            } => {
                let sum = u32::from(buyer_refund.value()) + u32::from(seller_payment.value());
                if sum > 100 {
                    return Err(ResolutionError::OverAllocated { sum });
                }
                Ok(ResolutionAmounts {
                    buyer_refund: total.percentage(*buyer_refund),
                    seller_payment: total.percentage(*seller_payment),
                })
            }
        }
    }
}

/// The order state a resolution settles into, derived from where the
/// funds actually went.
///
/// A full refund cancels the order; a zero refund completes it with
/// escrow released. Any split completes the order, with the escrow
/// status following the side that received funds on the seller leg
/// (`released` is the amount actually transferred, which may be zero
/// when the release leg failed or the balance was exhausted).
pub fn derived_order_state(
    total: Money,
    refund: Money,
    released: Money,
) -> (OrderStatus, EscrowStatus) {
    if refund == total {
        (OrderStatus::Cancelled, EscrowStatus::Refunded)
    } else if refund.is_zero() {
        (OrderStatus::Completed, EscrowStatus::Released)
    } else if released.is_positive() {
        (OrderStatus::Completed, EscrowStatus::Released)
    } else {
        (OrderStatus::Completed, EscrowStatus::Refunded)
    }
}

/// What a resolution actually executed.
///
/// The refund and release legs run sequentially with no surrounding
/// transaction; `pending_manual_release` is the explicit record of the
/// partial-failure window where the refund succeeded but the seller
/// release did not. Operations teams settle that amount by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionOutcome {
    pub order_status: OrderStatus,
    pub escrow_status: EscrowStatus,
    pub refunded: Money,
    pub released: Money,
    /// Seller amount still owed after a failed release leg.
    pub pending_manual_release: Option<Money>,
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use escra_core::Currency;
    use proptest::prelude::*;

    fn usd(minor: i64) -> Money {
        Money::from_minor(minor, Currency::Usd)
    }

    fn pct(value: u32) -> Percent {
        Percent::new(value).expect("valid percent")
    }

    #[test]
    fn explicit_refund_gives_the_seller_the_remainder() {
        let resolution = DisputeResolution::Refund {
            amount: usd(30_000),
            note: "partial delivery".into(),
        };
        let amounts = resolution.amounts(usd(100_000)).expect("valid");
        assert_eq!(amounts.buyer_refund, usd(30_000));
        assert_eq!(amounts.seller_payment, usd(70_000));
    }

    #[test]
    fn refund_above_the_total_is_rejected() {
        let resolution = DisputeResolution::Refund {
            amount: usd(100_001),
            note: String::new(),
        };
        assert!(matches!(
            resolution.amounts(usd(100_000)),
            Err(ResolutionError::RefundExceedsTotal { .. })
        ));
    }

    #[test]
    fn split_percentages_above_one_hundred_are_rejected() {
        let resolution = DisputeResolution::Split {
            buyer_refund: pct(60),
            seller_payment: pct(60),
            note: String::new(),
        };
        assert_eq!(
            resolution.amounts(usd(100_000)),
            Err(ResolutionError::OverAllocated { sum: 120 })
        );
    }

    #[test]
    fn under_allocated_split_leaves_a_remainder() {
        let resolution = DisputeResolution::Split {
            buyer_refund: pct(30),
            seller_payment: pct(50),
            note: String::new(),
        };
        let amounts = resolution.amounts(usd(10_000)).expect("valid");
        assert_eq!(amounts.buyer_refund, usd(3_000));
        assert_eq!(amounts.seller_payment, usd(5_000));
    }

    #[test]
    fn full_refund_cancels_and_refunds() {
        let (status, escrow) = derived_order_state(usd(100), usd(100), usd(0));
        assert_eq!(status, OrderStatus::Cancelled);
        assert_eq!(escrow, EscrowStatus::Refunded);
    }

    #[test]
    fn zero_refund_completes_and_releases() {
        let (status, escrow) = derived_order_state(usd(100), usd(0), usd(95));
        assert_eq!(status, OrderStatus::Completed);
        assert_eq!(escrow, EscrowStatus::Released);
    }

    #[test]
    fn partial_split_completes_following_the_funded_side() {
        let (status, escrow) = derived_order_state(usd(100), usd(40), usd(60));
        assert_eq!(status, OrderStatus::Completed);
        assert_eq!(escrow, EscrowStatus::Released);

        // Release leg failed: funds only went to the buyer.
        let (status, escrow) = derived_order_state(usd(100), usd(40), usd(0));
        assert_eq!(status, OrderStatus::Completed);
        assert_eq!(escrow, EscrowStatus::Refunded);
    }

    proptest! {
        #[test]
        fn valid_splits_never_allocate_more_than_the_total(
            total in 1i64..10_000_000,
            refund_pct in 0u32..=100,
        ) {
            let seller_pct = 100 - refund_pct;
            let resolution = DisputeResolution::Split {
                buyer_refund: pct(refund_pct),
                seller_payment: pct(seller_pct),
                note: String::new(),
            };
            let amounts = resolution.amounts(usd(total)).expect("valid split");
            prop_assert!(
                amounts.buyer_refund.minor() + amounts.seller_payment.minor() <= total
            );
        }
    }
}

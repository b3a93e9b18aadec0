//! # Monetary Types — Integer Minor Units
//!
//! Defines [`Money`], the single representation for every amount in the
//! escra stack: order totals, milestone slices, platform fees, VAT,
//! refunds, and escrow releases.
//!
//! ## Invariant
//!
//! Financial amounts are never floating point. Amounts are stored as
//! `i64` minor units (cents for the supported currencies) and all
//! arithmetic is checked. Percentage splits use an `i128` intermediate
//! and floor rounding, so a refund plus a seller payment computed from
//! the same total can never exceed that total.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ── Currency ─────────────────────────────────────────────────────────

/// Currencies the marketplace settles in.
///
/// All three use a minor-unit exponent of 2 (ISO 4217).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// United States dollar.
    Usd,
    /// Euro.
    Eur,
    /// Pound sterling.
    Gbp,
}

impl Currency {
    /// The ISO 4217 alphabetic code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Percent ──────────────────────────────────────────────────────────

/// A whole-number percentage in the 0..=100 range.
///
/// Used for resolution splits (buyer refund / seller payment) and the
/// fixed platform rates. Values outside the range are rejected at
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Percent(u8);

impl Percent {
    /// Zero percent.
    pub const ZERO: Percent = Percent(0);
    /// One hundred percent.
    pub const FULL: Percent = Percent(100);

    /// Const constructor for statically known rates.
    ///
    /// Evaluating this in a `const` with a value above 100 is a
    /// compile-time error.
    pub const fn from_const(value: u8) -> Percent {
        assert!(value <= 100);
        Percent(value)
    }

    /// Construct a percentage, rejecting values above 100.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPercent`] for values above 100.
    pub fn new(value: u32) -> Result<Self, CoreError> {
        if value > 100 {
            return Err(CoreError::InvalidPercent(value));
        }
        Ok(Self(value as u8))
    }

    /// The raw percentage value.
    pub fn value(&self) -> u8 {
        self.0
    }

    /// The complementary percentage (`100 - self`).
    pub fn complement(&self) -> Percent {
        Percent(100 - self.0)
    }

    /// Whether this is exactly 0%.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Whether this is exactly 100%.
    pub fn is_full(&self) -> bool {
        self.0 == 100
    }
}

impl std::fmt::Display for Percent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

// ── Money ────────────────────────────────────────────────────────────

/// A monetary amount in integer minor units with an explicit currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in minor units (cents).
    minor: i64,
    /// The currency of the amount.
    currency: Currency,
}

impl Money {
    /// Construct an amount from minor units (e.g. `12345` = 123.45).
    pub fn from_minor(minor: i64, currency: Currency) -> Self {
        Self { minor, currency }
    }

    /// A zero amount in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self { minor: 0, currency }
    }

    /// The amount in minor units.
    pub fn minor(&self) -> i64 {
        self.minor
    }

    /// The currency of the amount.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Whether the amount is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.minor == 0
    }

    /// Whether the amount is greater than zero.
    pub fn is_positive(&self) -> bool {
        self.minor > 0
    }

    /// Checked addition.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CurrencyMismatch`] if the currencies differ,
    /// or [`CoreError::AmountOverflow`] on `i64` overflow.
    pub fn checked_add(&self, other: Money) -> Result<Money, CoreError> {
        self.require_same_currency(&other)?;
        let minor = self
            .minor
            .checked_add(other.minor)
            .ok_or(CoreError::AmountOverflow)?;
        Ok(Money {
            minor,
            currency: self.currency,
        })
    }

    /// Checked subtraction.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CurrencyMismatch`] if the currencies differ,
    /// or [`CoreError::AmountOverflow`] on `i64` overflow.
    pub fn checked_sub(&self, other: Money) -> Result<Money, CoreError> {
        self.require_same_currency(&other)?;
        let minor = self
            .minor
            .checked_sub(other.minor)
            .ok_or(CoreError::AmountOverflow)?;
        Ok(Money {
            minor,
            currency: self.currency,
        })
    }

    /// Compute a whole-number percentage of this amount.
    ///
    /// Uses an `i128` intermediate and floor rounding, so for any total
    /// `t` and split `p`, `t.percentage(p) + t.percentage(p.complement())
    /// <= t`.
    pub fn percentage(&self, percent: Percent) -> Money {
        let scaled = i128::from(self.minor) * i128::from(percent.value());
        let minor = scaled.div_euclid(100);
        // A value scaled by at most 100 and divided by 100 fits back in i64.
        Money {
            minor: minor as i64,
            currency: self.currency,
        }
    }

    /// The smaller of two same-currency amounts.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CurrencyMismatch`] if the currencies differ.
    pub fn min(&self, other: Money) -> Result<Money, CoreError> {
        self.require_same_currency(&other)?;
        Ok(if self.minor <= other.minor {
            *self
        } else {
            other
        })
    }

    fn require_same_currency(&self, other: &Money) -> Result<(), CoreError> {
        if self.currency != other.currency {
            return Err(CoreError::CurrencyMismatch {
                left: self.currency.as_str().to_string(),
                right: other.currency.as_str().to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.minor < 0 { "-" } else { "" };
        let abs = self.minor.unsigned_abs();
        write!(
            f,
            "{sign}{}.{:02} {}",
            abs / 100,
            abs % 100,
            self.currency
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn usd(minor: i64) -> Money {
        Money::from_minor(minor, Currency::Usd)
    }

    #[test]
    fn percent_bounds() {
        assert!(Percent::new(0).is_ok());
        assert!(Percent::new(100).is_ok());
        assert!(Percent::new(101).is_err());
        assert!(Percent::new(500).is_err());
    }

    #[test]
    fn percent_complement() {
        let p = Percent::new(30).unwrap();
        assert_eq!(p.complement().value(), 70);
        assert_eq!(Percent::ZERO.complement(), Percent::FULL);
    }

    #[test]
    fn checked_add_same_currency() {
        let sum = usd(400_00).checked_add(usd(600_00)).unwrap();
        assert_eq!(sum.minor(), 1000_00);
    }

    #[test]
    fn checked_add_rejects_currency_mismatch() {
        let result = usd(100).checked_add(Money::from_minor(100, Currency::Eur));
        assert!(matches!(result, Err(CoreError::CurrencyMismatch { .. })));
    }

    #[test]
    fn checked_add_overflow() {
        let result = usd(i64::MAX).checked_add(usd(1));
        assert_eq!(result, Err(CoreError::AmountOverflow));
    }

    #[test]
    fn checked_sub() {
        let diff = usd(1000_00).checked_sub(usd(50_00)).unwrap();
        assert_eq!(diff.minor(), 950_00);
    }

    #[test]
    fn percentage_of_total() {
        let total = usd(1000_00);
        assert_eq!(total.percentage(Percent::new(20).unwrap()).minor(), 200_00);
        assert_eq!(total.percentage(Percent::new(5).unwrap()).minor(), 50_00);
        assert_eq!(total.percentage(Percent::ZERO).minor(), 0);
        assert_eq!(total.percentage(Percent::FULL), total);
    }

    #[test]
    fn percentage_floors() {
        // 33% of 1.00 is 0.33, not 0.34.
        assert_eq!(usd(100).percentage(Percent::new(33).unwrap()).minor(), 33);
        // 50% of 0.01 floors to zero.
        assert_eq!(usd(1).percentage(Percent::new(50).unwrap()).minor(), 0);
    }

    #[test]
    fn min_picks_smaller() {
        assert_eq!(usd(300).min(usd(500)).unwrap(), usd(300));
        assert_eq!(usd(500).min(usd(300)).unwrap(), usd(300));
    }

    #[test]
    fn display_formats_minor_units() {
        assert_eq!(usd(123_45).to_string(), "123.45 USD");
        assert_eq!(usd(5).to_string(), "0.05 USD");
        assert_eq!(usd(-250).to_string(), "-2.50 USD");
        assert_eq!(
            Money::from_minor(99_99, Currency::Gbp).to_string(),
            "99.99 GBP"
        );
    }

    #[test]
    fn serde_roundtrip() {
        let amount = usd(1000_00);
        let json = serde_json::to_string(&amount).unwrap();
        let parsed: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, amount);
    }

    proptest! {
        // A split of any non-negative total never pays out more than the total.
        #[test]
        fn split_never_exceeds_total(minor in 0i64..=1_000_000_000_000, pct in 0u32..=100) {
            let total = usd(minor);
            let p = Percent::new(pct).unwrap();
            let refund = total.percentage(p);
            let payment = total.percentage(p.complement());
            let paid_out = refund.checked_add(payment).unwrap();
            prop_assert!(paid_out.minor() <= total.minor());
        }

        #[test]
        fn full_percent_is_identity(minor in 0i64..=1_000_000_000_000) {
            prop_assert_eq!(usd(minor).percentage(Percent::FULL), usd(minor));
        }
    }
}

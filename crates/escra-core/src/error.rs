//! # Error Types
//!
//! Errors produced by the foundational types. All errors use `thiserror`
//! for derive-based `Display` and `Error` implementations. Service-level
//! crates define their own error enums and wrap these where needed.

use thiserror::Error;

/// Errors from constructing or combining core primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// An identifier string failed validation.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A percentage was outside the 0..=100 range.
    #[error("invalid percentage: {0} (must be 0..=100)")]
    InvalidPercent(u32),

    /// Arithmetic across two different currencies.
    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch {
        /// Currency of the left operand.
        left: String,
        /// Currency of the right operand.
        right: String,
    },

    /// A monetary operation overflowed the minor-unit range.
    #[error("amount overflow in monetary arithmetic")]
    AmountOverflow,

    /// A timestamp string failed parsing or was not UTC.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

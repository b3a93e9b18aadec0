//! # escra-core — Foundational Types for the Escra Stack
//!
//! This crate is the bedrock of the escra marketplace rules engine. It
//! defines the primitives every other crate in the workspace builds on;
//! it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain identifiers.** `OrderId`,
//!    `MilestoneId`, `DisputeId`, `UserId` — all newtypes over `Uuid`.
//!    No bare strings or loose UUIDs cross a service boundary, so an
//!    order id cannot be passed where a dispute id is expected.
//!
//! 2. **Integer minor-unit money.** [`Money`] stores amounts as `i64`
//!    minor units (cents) with an explicit [`Currency`]. Monetary values
//!    are never floating point; split and fee arithmetic goes through
//!    checked operations with deterministic rounding.
//!
//! 3. **UTC-only timestamps.** [`Timestamp`] enforces UTC with Z suffix
//!    and seconds precision. Non-UTC inputs are rejected at construction.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `escra-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod error;
pub mod identity;
pub mod money;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use error::CoreError;
pub use identity::{
    DisputeId, EventId, ListingId, MilestoneId, OrderId, OrderNumber, ProviderId, UserId,
};
pub use money::{Currency, Money, Percent};
pub use temporal::Timestamp;

//! # escra-state — Status Machines
//!
//! Pure lookup tables for every lifecycle in the escra stack. This crate
//! performs no I/O and holds no state: each module exposes a status enum
//! with a fixed adjacency table, and the services validate every mutation
//! against these tables before persisting anything.
//!
//! - **Order** ([`order`]): order lifecycle and escrow status, with the
//!   escrow-consistency check.
//!
//! - **Milestone** ([`milestone`]): per-milestone lifecycle from
//!   submission through payment.
//!
//! - **Dispute** ([`dispute`]): dispute lifecycle from filing through
//!   mediation, arbitration, and resolution.
//!
//! - **Actions** ([`actions`]): role-gated derivation of the UI actions
//!   permitted for an order status, and the action → status mapping.
//!
//! ## Design Choice: Validated Enum over Typestate
//!
//! Statuses are runtime-validated enums rather than typestate types.
//! Orders and disputes are loaded from a store where the status is not
//! known at compile time, and the action-derivation functions need to
//! enumerate transitions dynamically; a table-driven enum serializes
//! directly via serde and keeps the adjacency in one place.
//!
//! ## Failure Semantics
//!
//! Every function in this crate is total: invalid combinations return
//! `false`, `None`, or an empty list, never a panic or an error. Callers
//! are responsible for surfacing rejections as user-facing errors.

pub mod actions;
pub mod dispute;
pub mod milestone;
pub mod order;

// Re-export primary types for ergonomic imports.
pub use actions::{available_actions, status_for_action, OrderAction, Role};
pub use dispute::DisputeStatus;
pub use milestone::MilestoneStatus;
pub use order::{EscrowStatus, OrderStatus};

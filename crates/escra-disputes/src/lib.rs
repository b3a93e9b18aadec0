//! # escra-disputes
//!
//! Dispute arbitration over escrowed orders.
//!
//! A dispute rides alongside its order: at most one non-terminal
//! dispute per order, opened by a party while the order is active, and
//! progressed through review states by an admin. Resolution is the
//! financially consequential step: it executes the refund and the
//! remaining release sequentially against the payment gateway (no
//! distributed transaction) and derives the order's final status from
//! where the funds went. The partial-failure window between the two
//! payment calls is surfaced explicitly in [`ResolutionOutcome`] rather
//! than hidden.
//!
//! Auto-resolution of stalled disputes is a pure decision function; an
//! external scheduler is expected to poll it and act on its advice.

pub mod auto;
pub mod entity;
pub mod resolution;
pub mod service;
pub mod store;

pub use auto::{check_auto_resolution, AutoResolutionDecision, DisputeSnapshot};
pub use entity::Dispute;
pub use resolution::{
    derived_order_state, DisputeResolution, ResolutionAmounts, ResolutionError, ResolutionOutcome,
};
pub use service::{DisputeError, DisputeService};
pub use store::{DisputeStore, InMemoryDisputeStore};

//! # escra-audit
//!
//! Append-only audit trail for order and dispute lifecycles.
//!
//! The crate has three pieces:
//!
//! - [`event`]: typed event records. Every status change and side effect
//!   that the order and dispute services perform is captured as an
//!   [`OrderEvent`] or [`DisputeEvent`] with an actor, a machine-readable
//!   kind, and free-form JSON metadata.
//! - [`log`]: the [`EventLog`] trait that services write through, plus an
//!   [`InMemoryEventLog`] adapter. Append failures are reported to the
//!   caller but by policy never block the write path that produced them.
//! - [`timeline`]: a read-side view that presents an order's history in
//!   chronological order. When the log store is unavailable the timeline
//!   is reconstructed from entity timestamps instead, and each entry says
//!   which source it came from.

pub mod event;
pub mod log;
pub mod timeline;

pub use event::{DisputeEvent, DisputeEventType, OrderEvent, OrderEventType};
pub use log::{AuditError, EventLog, InMemoryEventLog};
pub use timeline::{
    build_order_timeline, DisputeStamps, MilestoneStamps, OrderStamps, TimelineEntry,
    TimelineSource,
};

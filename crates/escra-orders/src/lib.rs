//! # escra-orders
//!
//! Order and milestone services: the write path of the marketplace
//! order lifecycle.
//!
//! Every mutating operation follows the same shape: read the entity,
//! validate the requested transition against `escra-state`, persist the
//! change, append an audit event, and fire any notifications. Audit and
//! notification failures never roll back the primary write; payment
//! failures do (see [`milestones::MilestoneService::approve_milestone`]
//! for the one compensating rollback).
//!
//! External collaborators (payments, notifications, invoicing, profile
//! lookup) are traits so services stay testable without a payment
//! provider in the loop. In-memory adapters for the store and gateway
//! live alongside the traits.

pub mod entity;
pub mod error;
pub mod invoice;
pub mod milestones;
pub mod notify;
pub mod payments;
pub mod service;
pub mod store;

pub use entity::{Milestone, NewMilestone, NewOrder, Order, OrderType};
pub use error::OrderError;
pub use invoice::{
    FailingInvoiceGenerator, InvoiceError, InvoiceGenerator, InvoiceRef, NullInvoiceGenerator,
};
pub use milestones::MilestoneService;
pub use notify::{
    deliver, Notification, NotificationKind, NotificationSink, NotifyError, NullSink,
    RecordingSink,
};
pub use payments::{InMemoryPaymentGateway, PaymentError, PaymentGateway, PLATFORM_FEE_RATE};
pub use service::{CompletionOutcome, OrderQuery, OrderService, Page, Paged, VAT_RATE};
pub use store::{
    InMemoryOrderStore, InMemoryProfileDirectory, OrderFilter, OrderStore, ProfileDirectory,
    StoreError,
};

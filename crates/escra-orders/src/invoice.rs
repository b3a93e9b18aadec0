//! Invoice generation boundary.
//!
//! Invoicing runs after an order completes and is best-effort: a
//! failure is reported alongside the successful completion, never in
//! place of it.

use thiserror::Error;

use crate::entity::Order;

/// Provider-side reference to a generated invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceRef(pub String);

#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("invoice generation failed: {0}")]
    Generation(String),
}

pub trait InvoiceGenerator {
    fn generate(&self, order: &Order) -> Result<InvoiceRef, InvoiceError>;
}

/// Generator for deployments without invoicing configured.
pub struct NullInvoiceGenerator;

impl InvoiceGenerator for NullInvoiceGenerator {
    fn generate(&self, order: &Order) -> Result<InvoiceRef, InvoiceError> {
        Ok(InvoiceRef(format!("inv-{}", order.order_number)))
    }
}

/// Generator whose every call fails, for exercising the best-effort
/// completion path in tests.
pub struct FailingInvoiceGenerator;

impl InvoiceGenerator for FailingInvoiceGenerator {
    fn generate(&self, _order: &Order) -> Result<InvoiceRef, InvoiceError> {
        Err(InvoiceError::Generation("renderer offline".into()))
    }
}

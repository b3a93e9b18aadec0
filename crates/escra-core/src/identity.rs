//! # Domain Identity Newtypes
//!
//! Newtype wrappers for all domain identifiers in the escra stack.
//! Type-level distinction between identifier namespaces prevents
//! cross-namespace confusion: you cannot pass an `OrderId` where a
//! `DisputeId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an identifier from an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a buyer/seller order.
    OrderId,
    "order"
);

uuid_id!(
    /// Unique identifier for a milestone within an order.
    MilestoneId,
    "milestone"
);

uuid_id!(
    /// Unique identifier for a dispute proceeding.
    DisputeId,
    "dispute"
);

uuid_id!(
    /// Unique identifier for an audit event.
    EventId,
    "event"
);

uuid_id!(
    /// Unique identifier for a platform user (buyer, seller, or admin).
    UserId,
    "user"
);

uuid_id!(
    /// Unique identifier for a seller's provider profile.
    ProviderId,
    "provider"
);

uuid_id!(
    /// Unique identifier for a marketplace listing an order was placed
    /// against. Orders placed directly carry no listing.
    ListingId,
    "listing"
);

// ── Order Number ─────────────────────────────────────────────────────

/// Human-facing order reference (e.g. `ORD-9F2C41A8`).
///
/// Derived from the order's UUID so it is unique without a counter, and
/// short enough to quote in support conversations. Free-text order
/// searches match against this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Derive the order number for an order identifier.
    pub fn for_order(id: &OrderId) -> Self {
        let (head, ..) = id.as_uuid().as_fields();
        Self(format!("ORD-{head:08X}"))
    }

    /// Construct from a raw string (e.g. loaded from a store).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidIdentifier`] if the string is empty.
    pub fn from_raw(raw: impl Into<String>) -> Result<Self, CoreError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(CoreError::InvalidIdentifier(
                "order number must be non-empty".to_string(),
            ));
        }
        Ok(Self(raw))
    }

    /// The order number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

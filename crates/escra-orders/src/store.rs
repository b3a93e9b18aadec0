//! Persistence traits and in-memory adapters.
//!
//! The services never touch a database client directly; they go through
//! [`OrderStore`] and [`ProfileDirectory`]. The in-memory adapters back
//! tests and single-process deployments, and are also where the store
//! failure modes are exercised.

use std::collections::HashMap;
use std::sync::RwLock;

use escra_core::{MilestoneId, OrderId, ProviderId, UserId};
use escra_state::OrderStatus;
use thiserror::Error;

use crate::entity::{Milestone, Order};

/// Failures raised by a persistence backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable")]
    Unavailable,

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Filter for role-scoped order listings.
///
/// `buyer` and `seller` are party constraints; leaving both unset lists
/// every order (the admin view). `number_contains` is a free-text match
/// against the human-facing order number.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub buyer: Option<UserId>,
    pub seller: Option<UserId>,
    pub status: Option<OrderStatus>,
    pub number_contains: Option<String>,
}

impl OrderFilter {
    fn matches(&self, order: &Order) -> bool {
        if let Some(buyer) = self.buyer {
            if order.buyer_id != buyer {
                return false;
            }
        }
        if let Some(seller) = self.seller {
            if order.seller_id != seller {
                return false;
            }
        }
        if let Some(status) = self.status {
            if order.status != status {
                return false;
            }
        }
        if let Some(needle) = &self.number_contains {
            if !order
                .order_number
                .as_str()
                .to_ascii_uppercase()
                .contains(&needle.to_ascii_uppercase())
            {
                return false;
            }
        }
        true
    }
}

/// Row-level CRUD over orders and their milestones.
///
/// Updates are whole-entity writes keyed by id; whatever atomicity a
/// single-row update has in the backend is all the atomicity callers
/// get.
pub trait OrderStore {
    fn insert_order(&self, order: Order) -> Result<(), StoreError>;
    fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;
    fn update_order(&self, order: Order) -> Result<(), StoreError>;
    fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, StoreError>;

    fn insert_milestone(&self, milestone: Milestone) -> Result<(), StoreError>;
    fn get_milestone(&self, id: MilestoneId) -> Result<Option<Milestone>, StoreError>;
    fn update_milestone(&self, milestone: Milestone) -> Result<(), StoreError>;
    fn milestones_for_order(&self, order_id: OrderId) -> Result<Vec<Milestone>, StoreError>;
}

/// Lookup of seller provider profiles and display names.
pub trait ProfileDirectory {
    /// The provider profile backing a user's seller role, if any.
    fn provider_for_user(&self, user: UserId) -> Result<Option<ProviderId>, StoreError>;

    /// Denormalized display name for audit records and notifications.
    fn display_name(&self, user: UserId) -> Result<Option<String>, StoreError>;
}

// ── In-memory adapters ───────────────────────────────────────────────────────

/// HashMap-backed order store for tests and single-process deployments.
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
    milestones: RwLock<HashMap<MilestoneId, Milestone>>,
    fail_milestone_inserts: bool,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            milestones: RwLock::new(HashMap::new()),
            fail_milestone_inserts: false,
        }
    }

    /// A store whose milestone inserts fail, for exercising the
    /// best-effort milestone path of order creation.
    pub fn failing_milestone_inserts() -> Self {
        Self {
            fail_milestone_inserts: true,
            ..Self::new()
        }
    }

    fn poisoned(what: &str) -> StoreError {
        StoreError::Backend(format!("{what} lock poisoned"))
    }
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderStore for InMemoryOrderStore {
    fn insert_order(&self, order: Order) -> Result<(), StoreError> {
        let mut orders = self.orders.write().map_err(|_| Self::poisoned("orders"))?;
        orders.insert(order.id, order);
        Ok(())
    }

    fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let orders = self.orders.read().map_err(|_| Self::poisoned("orders"))?;
        Ok(orders.get(&id).cloned())
    }

    fn update_order(&self, order: Order) -> Result<(), StoreError> {
        let mut orders = self.orders.write().map_err(|_| Self::poisoned("orders"))?;
        if !orders.contains_key(&order.id) {
            return Err(StoreError::Backend(format!(
                "update of unknown order {}",
                order.id
            )));
        }
        orders.insert(order.id, order);
        Ok(())
    }

    fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().map_err(|_| Self::poisoned("orders"))?;
        let mut matched: Vec<Order> = orders.values().filter(|o| filter.matches(o)).cloned().collect();
        // Newest first, stabilized by id for equal timestamps.
        matched.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        Ok(matched)
    }

    fn insert_milestone(&self, milestone: Milestone) -> Result<(), StoreError> {
        if self.fail_milestone_inserts {
            return Err(StoreError::Backend("milestone insert rejected".into()));
        }
        let mut milestones = self
            .milestones
            .write()
            .map_err(|_| Self::poisoned("milestones"))?;
        milestones.insert(milestone.id, milestone);
        Ok(())
    }

    fn get_milestone(&self, id: MilestoneId) -> Result<Option<Milestone>, StoreError> {
        let milestones = self
            .milestones
            .read()
            .map_err(|_| Self::poisoned("milestones"))?;
        Ok(milestones.get(&id).cloned())
    }

    fn update_milestone(&self, milestone: Milestone) -> Result<(), StoreError> {
        let mut milestones = self
            .milestones
            .write()
            .map_err(|_| Self::poisoned("milestones"))?;
        if !milestones.contains_key(&milestone.id) {
            return Err(StoreError::Backend(format!(
                "update of unknown milestone {}",
                milestone.id
            )));
        }
        milestones.insert(milestone.id, milestone);
        Ok(())
    }

    fn milestones_for_order(&self, order_id: OrderId) -> Result<Vec<Milestone>, StoreError> {
        let milestones = self
            .milestones
            .read()
            .map_err(|_| Self::poisoned("milestones"))?;
        let mut matched: Vec<Milestone> = milestones
            .values()
            .filter(|m| m.order_id == order_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.title.cmp(&b.title)));
        Ok(matched)
    }
}

/// HashMap-backed profile directory.
pub struct InMemoryProfileDirectory {
    providers: RwLock<HashMap<UserId, ProviderId>>,
    names: RwLock<HashMap<UserId, String>>,
}

impl InMemoryProfileDirectory {
    pub fn new() -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            names: RwLock::new(HashMap::new()),
        }
    }

    pub fn register_provider(&self, user: UserId, provider: ProviderId) {
        if let Ok(mut providers) = self.providers.write() {
            providers.insert(user, provider);
        }
    }

    pub fn register_name(&self, user: UserId, name: impl Into<String>) {
        if let Ok(mut names) = self.names.write() {
            names.insert(user, name.into());
        }
    }
}

impl Default for InMemoryProfileDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileDirectory for InMemoryProfileDirectory {
    fn provider_for_user(&self, user: UserId) -> Result<Option<ProviderId>, StoreError> {
        let providers = self
            .providers
            .read()
            .map_err(|_| StoreError::Backend("providers lock poisoned".into()))?;
        Ok(providers.get(&user).copied())
    }

    fn display_name(&self, user: UserId) -> Result<Option<String>, StoreError> {
        let names = self
            .names
            .read()
            .map_err(|_| StoreError::Backend("names lock poisoned".into()))?;
        Ok(names.get(&user).cloned())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use escra_core::{Currency, Money, OrderNumber, Percent, Timestamp};
    use escra_state::EscrowStatus;

    fn order(buyer: UserId, seller: UserId) -> Order {
        let id = OrderId::new();
        Order {
            id,
            order_number: OrderNumber::for_order(&id),
            buyer_id: buyer,
            seller_id: seller,
            listing_id: None,
            order_type: crate::entity::OrderType::OneOff,
            status: OrderStatus::Pending,
            escrow_status: EscrowStatus::Pending,
            total_amount: Money::from_minor(50_000, Currency::Eur),
            platform_fee: Money::from_minor(2_500, Currency::Eur),
            vat_amount: Money::from_minor(10_000, Currency::Eur),
            vat_rate: Percent::from_const(20),
            payment_intent_id: None,
            created_at: Timestamp::now(),
            completed_at: None,
            cancelled_at: None,
        }
    }

    #[test]
    fn filter_scopes_by_party_and_status() {
        let store = InMemoryOrderStore::new();
        let buyer = UserId::new();
        let seller = UserId::new();
        let mine = order(buyer, seller);
        let theirs = order(UserId::new(), UserId::new());
        store.insert_order(mine.clone()).expect("insert");
        store.insert_order(theirs).expect("insert");

        let listed = store
            .list_orders(&OrderFilter {
                buyer: Some(buyer),
                ..OrderFilter::default()
            })
            .expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, mine.id);

        let none = store
            .list_orders(&OrderFilter {
                buyer: Some(buyer),
                status: Some(OrderStatus::Completed),
                ..OrderFilter::default()
            })
            .expect("list");
        assert!(none.is_empty());
    }

    #[test]
    fn order_number_search_is_case_insensitive() {
        let store = InMemoryOrderStore::new();
        let o = order(UserId::new(), UserId::new());
        let fragment = o.order_number.as_str()[4..10].to_ascii_lowercase();
        store.insert_order(o.clone()).expect("insert");

        let listed = store
            .list_orders(&OrderFilter {
                number_contains: Some(fragment),
                ..OrderFilter::default()
            })
            .expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, o.id);
    }

    #[test]
    fn updating_a_missing_order_is_a_backend_error() {
        let store = InMemoryOrderStore::new();
        let err = store
            .update_order(order(UserId::new(), UserId::new()))
            .expect_err("must fail");
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[test]
    fn directory_returns_none_for_unknown_users() {
        let directory = InMemoryProfileDirectory::new();
        let user = UserId::new();
        assert!(directory.provider_for_user(user).expect("lookup").is_none());

        let provider = ProviderId::new();
        directory.register_provider(user, provider);
        assert_eq!(
            directory.provider_for_user(user).expect("lookup"),
            Some(provider)
        );
    }
}

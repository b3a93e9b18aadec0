//! Dispute persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use escra_core::{DisputeId, OrderId};
use escra_orders::StoreError;

use crate::entity::Dispute;

/// Row-level CRUD over disputes.
pub trait DisputeStore {
    fn insert_dispute(&self, dispute: Dispute) -> Result<(), StoreError>;
    fn get_dispute(&self, id: DisputeId) -> Result<Option<Dispute>, StoreError>;
    fn update_dispute(&self, dispute: Dispute) -> Result<(), StoreError>;
    fn disputes_for_order(&self, order_id: OrderId) -> Result<Vec<Dispute>, StoreError>;

    /// The single non-terminal dispute on an order, if one exists.
    fn active_dispute_for_order(&self, order_id: OrderId) -> Result<Option<Dispute>, StoreError> {
        Ok(self
            .disputes_for_order(order_id)?
            .into_iter()
            .find(|d| d.is_active()))
    }
}

/// HashMap-backed dispute store for tests and single-process runs.
pub struct InMemoryDisputeStore {
    disputes: RwLock<HashMap<DisputeId, Dispute>>,
}

impl InMemoryDisputeStore {
    pub fn new() -> Self {
        Self {
            disputes: RwLock::new(HashMap::new()),
        }
    }

    fn poisoned() -> StoreError {
        StoreError::Backend("disputes lock poisoned".into())
    }
}

impl Default for InMemoryDisputeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DisputeStore for InMemoryDisputeStore {
    fn insert_dispute(&self, dispute: Dispute) -> Result<(), StoreError> {
        let mut disputes = self.disputes.write().map_err(|_| Self::poisoned())?;
        disputes.insert(dispute.id, dispute);
        Ok(())
    }

    fn get_dispute(&self, id: DisputeId) -> Result<Option<Dispute>, StoreError> {
        let disputes = self.disputes.read().map_err(|_| Self::poisoned())?;
        Ok(disputes.get(&id).cloned())
    }

    fn update_dispute(&self, dispute: Dispute) -> Result<(), StoreError> {
        let mut disputes = self.disputes.write().map_err(|_| Self::poisoned())?;
        if !disputes.contains_key(&dispute.id) {
            return Err(StoreError::Backend(format!(
                "update of unknown dispute {}",
                dispute.id
            )));
        }
        disputes.insert(dispute.id, dispute);
        Ok(())
    }

    fn disputes_for_order(&self, order_id: OrderId) -> Result<Vec<Dispute>, StoreError> {
        let disputes = self.disputes.read().map_err(|_| Self::poisoned())?;
        let mut matched: Vec<Dispute> = disputes
            .values()
            .filter(|d| d.order_id == order_id)
            .cloned()
            .collect();
        matched.sort_by_key(|d| d.created_at);
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use escra_core::UserId;
    use escra_state::DisputeStatus;

    #[test]
    fn active_lookup_skips_terminal_disputes() {
        let store = InMemoryDisputeStore::new();
        let order_id = OrderId::new();

        let mut settled = Dispute::open(order_id, UserId::new(), "first round");
        settled.status = DisputeStatus::Cancelled;
        store.insert_dispute(settled).expect("insert");
        assert!(store
            .active_dispute_for_order(order_id)
            .expect("lookup")
            .is_none());

        let live = Dispute::open(order_id, UserId::new(), "second round");
        let live_id = live.id;
        store.insert_dispute(live).expect("insert");
        let found = store
            .active_dispute_for_order(order_id)
            .expect("lookup")
            .expect("active exists");
        assert_eq!(found.id, live_id);
    }
}

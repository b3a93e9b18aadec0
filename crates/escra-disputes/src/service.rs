//! Dispute orchestration and resolution execution.

use escra_audit::{DisputeEvent, DisputeEventType, EventLog, OrderEvent, OrderEventType};
use escra_core::{CoreError, DisputeId, Money, OrderId, Timestamp, UserId};
use escra_state::{DisputeStatus, EscrowStatus, OrderStatus};
use escra_orders::{
    deliver, Notification, NotificationKind, NotificationSink, Order, OrderStore, PaymentError,
    PaymentGateway, ProfileDirectory, StoreError,
};
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::entity::Dispute;
use crate::resolution::{derived_order_state, DisputeResolution, ResolutionError, ResolutionOutcome};
use crate::store::DisputeStore;

/// Failures surfaced by dispute operations.
#[derive(Debug, Error)]
pub enum DisputeError {
    #[error("dispute {0} not found")]
    DisputeNotFound(DisputeId),

    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    #[error("user {user} is not a party to order {order}")]
    NotAParty { order: OrderId, user: UserId },

    #[error("order in status {0} cannot be disputed")]
    OrderNotDisputable(OrderStatus),

    #[error("active dispute already exists for order {0}")]
    ActiveDisputeExists(OrderId),

    #[error("invalid dispute transition: {from} -> {to}")]
    InvalidTransition {
        from: DisputeStatus,
        to: DisputeStatus,
    },

    #[error("dispute can only reach {0} through resolution")]
    ResolutionRequired(DisputeStatus),

    #[error("escrow already released for order {0}; manual intervention required")]
    EscrowAlreadyReleased(OrderId),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("payment collaborator failed: {0}")]
    Payment(#[from] PaymentError),
}

/// Orchestrates the dispute lifecycle and executes resolutions.
pub struct DisputeService<'a> {
    disputes: &'a dyn DisputeStore,
    orders: &'a dyn OrderStore,
    payments: &'a dyn PaymentGateway,
    notifications: &'a dyn NotificationSink,
    profiles: &'a dyn ProfileDirectory,
    audit: &'a dyn EventLog,
}

impl<'a> DisputeService<'a> {
    pub fn new(
        disputes: &'a dyn DisputeStore,
        orders: &'a dyn OrderStore,
        payments: &'a dyn PaymentGateway,
        notifications: &'a dyn NotificationSink,
        profiles: &'a dyn ProfileDirectory,
        audit: &'a dyn EventLog,
    ) -> Self {
        Self {
            disputes,
            orders,
            payments,
            notifications,
            profiles,
            audit,
        }
    }

    /// Open a dispute on an active order.
    ///
    /// The caller must be a party; the order must be in a
    /// dispute-eligible status; and only one non-terminal dispute may
    /// exist per order. An in-progress order moves to `disputed`;
    /// accepted and completed orders keep their status, with the open
    /// dispute carried on the dispute record alone.
    pub fn create_dispute(
        &self,
        actor: UserId,
        order_id: OrderId,
        reason: impl Into<String>,
        evidence_urls: Vec<String>,
    ) -> Result<Dispute, DisputeError> {
        let order = self.load_order(order_id)?;
        if !order.is_party(actor) {
            return Err(DisputeError::NotAParty {
                order: order_id,
                user: actor,
            });
        }
        // The active-dispute lookup runs first: a disputed order is not
        // itself dispute-eligible, and the caller should hear about the
        // existing dispute, not the status it caused.
        if self.disputes.active_dispute_for_order(order_id)?.is_some() {
            return Err(DisputeError::ActiveDisputeExists(order_id));
        }
        if !order.status.dispute_eligible() {
            return Err(DisputeError::OrderNotDisputable(order.status));
        }

        let mut dispute = Dispute::open(order_id, actor, reason);
        dispute.evidence_urls = evidence_urls;
        self.disputes.insert_dispute(dispute.clone())?;

        if order.status.can_transition(OrderStatus::Disputed) {
            let mut order = order.clone();
            order.status = OrderStatus::Disputed;
            self.orders.update_order(order)?;
            self.record_order(
                OrderEvent::new(order_id, OrderEventType::Disputed, "order disputed", Some(actor))
                    .with_metadata(json!({ "dispute": dispute.id.to_string() })),
            );
        }

        self.record_dispute(DisputeEvent::new(
            dispute.id,
            order_id,
            DisputeEventType::Opened,
            format!("dispute opened: {}", dispute.reason),
            Some(actor),
        ));
        if let Some(other) = order.counterparty(actor) {
            deliver(
                self.notifications,
                Notification {
                    recipient: other,
                    kind: NotificationKind::DisputeOpened,
                    title: "Dispute opened".into(),
                    body: format!("A dispute was opened on order {}", order.order_number),
                    link: None,
                },
            );
        }
        info!(dispute = %dispute.id, order = %order_id, "dispute opened");
        Ok(dispute)
    }

    /// Attach an evidence URL to an active dispute.
    pub fn add_evidence(
        &self,
        dispute_id: DisputeId,
        actor: UserId,
        url: impl Into<String>,
    ) -> Result<Dispute, DisputeError> {
        let mut dispute = self.load_dispute(dispute_id)?;
        let order = self.load_order(dispute.order_id)?;
        if !order.is_party(actor) {
            return Err(DisputeError::NotAParty {
                order: order.id,
                user: actor,
            });
        }
        if !dispute.is_active() {
            return Err(DisputeError::InvalidTransition {
                from: dispute.status,
                to: dispute.status,
            });
        }

        let url = url.into();
        dispute.evidence_urls.push(url.clone());
        self.disputes.update_dispute(dispute.clone())?;
        self.record_dispute(
            DisputeEvent::new(
                dispute.id,
                dispute.order_id,
                DisputeEventType::EvidenceAdded,
                "evidence added",
                Some(actor),
            )
            .with_metadata(json!({ "url": url })),
        );
        Ok(dispute)
    }

    /// Assign a mediator, moving the dispute into review.
    pub fn assign_mediator(
        &self,
        dispute_id: DisputeId,
        admin: UserId,
        mediator: UserId,
    ) -> Result<Dispute, DisputeError> {
        let mut dispute = self.load_dispute(dispute_id)?;
        self.check_transition(&dispute, DisputeStatus::UnderReview)?;

        dispute.status = DisputeStatus::UnderReview;
        dispute.assigned_to = Some(mediator);
        self.disputes.update_dispute(dispute.clone())?;
        self.record_dispute(
            DisputeEvent::new(
                dispute.id,
                dispute.order_id,
                DisputeEventType::MediatorAssigned,
                "mediator assigned; dispute under review",
                Some(admin),
            )
            .with_metadata(json!({ "mediator": mediator.to_string() })),
        );
        Ok(dispute)
    }

    /// Move a dispute between review states.
    ///
    /// `resolved` and `cancelled` are unreachable here: resolution
    /// executes money and must go through [`Self::resolve_dispute`];
    /// cancellation goes through [`Self::cancel_dispute`] so the order
    /// can resume.
    pub fn update_status(
        &self,
        dispute_id: DisputeId,
        new_status: DisputeStatus,
        admin: UserId,
    ) -> Result<Dispute, DisputeError> {
        if matches!(new_status, DisputeStatus::Resolved | DisputeStatus::Cancelled) {
            return Err(DisputeError::ResolutionRequired(new_status));
        }
        let mut dispute = self.load_dispute(dispute_id)?;
        self.check_transition(&dispute, new_status)?;

        let previous = dispute.status;
        dispute.status = new_status;
        self.disputes.update_dispute(dispute.clone())?;
        self.record_dispute(DisputeEvent::new(
            dispute.id,
            dispute.order_id,
            DisputeEventType::for_status(new_status),
            format!("dispute {previous} -> {new_status}"),
            Some(admin),
        ));
        if let Ok(order) = self.load_order(dispute.order_id) {
            for recipient in [order.buyer_id, order.seller_id] {
                deliver(
                    self.notifications,
                    Notification {
                        recipient,
                        kind: NotificationKind::DisputeUpdated,
                        title: "Dispute update".into(),
                        body: format!(
                            "The dispute on order {} is now {new_status}",
                            order.order_number
                        ),
                        link: None,
                    },
                );
            }
        }
        Ok(dispute)
    }

    /// Withdraw an open dispute.
    ///
    /// Only the raiser can cancel, and only from `open`. A disputed
    /// order resumes work.
    pub fn cancel_dispute(
        &self,
        dispute_id: DisputeId,
        actor: UserId,
    ) -> Result<Dispute, DisputeError> {
        let mut dispute = self.load_dispute(dispute_id)?;
        if actor != dispute.raised_by {
            return Err(DisputeError::NotAParty {
                order: dispute.order_id,
                user: actor,
            });
        }
        self.check_transition(&dispute, DisputeStatus::Cancelled)?;

        dispute.status = DisputeStatus::Cancelled;
        self.disputes.update_dispute(dispute.clone())?;

        let order = self.load_order(dispute.order_id)?;
        if order.status == OrderStatus::Disputed {
            let mut order = order;
            order.status = OrderStatus::InProgress;
            self.orders.update_order(order)?;
            self.record_order(OrderEvent::new(
                dispute.order_id,
                OrderEventType::Started,
                "dispute withdrawn; work resumed",
                Some(actor),
            ));
        }
        self.record_dispute(DisputeEvent::new(
            dispute.id,
            dispute.order_id,
            DisputeEventType::Cancelled,
            "dispute withdrawn",
            Some(actor),
        ));
        info!(dispute = %dispute.id, "dispute cancelled");
        Ok(dispute)
    }

    /// Resolve a dispute, executing its financial split.
    ///
    /// Four steps, sequential, with no surrounding transaction:
    ///
    /// 1. Fail fast when a buyer refund is due but escrow has already
    ///    been fully released to the seller.
    /// 2. Execute the refund; a failure here aborts with no state
    ///    change.
    /// 3. Release `min(seller payment, remaining balance)` to the
    ///    seller; a failure here is recorded as
    ///    [`ResolutionOutcome::pending_manual_release`] and does not
    ///    roll back the refund.
    /// 4. Mark the dispute resolved and derive the order's final
    ///    status and escrow state from where the funds went.
    pub fn resolve_dispute(
        &self,
        dispute_id: DisputeId,
        admin: UserId,
        resolution: DisputeResolution,
    ) -> Result<(Dispute, ResolutionOutcome), DisputeError> {
        let mut dispute = self.load_dispute(dispute_id)?;
        self.check_transition(&dispute, DisputeStatus::Resolved)?;
        let mut order = self.load_order(dispute.order_id)?;

        let amounts = resolution.amounts(order.total_amount)?;
        let refund = amounts.buyer_refund;
        let seller_payment = amounts.seller_payment;

        // Step 1: never risk a double payment.
        if refund.is_positive() && order.escrow_status == EscrowStatus::Released {
            return Err(DisputeError::EscrowAlreadyReleased(order.id));
        }

        // Step 2: refund leg. A failure aborts the whole resolution.
        if refund.is_positive() {
            self.payments.process_refund(order.id, refund)?;
        }

        // Step 3: release leg, bounded by the remaining balance.
        let mut released = Money::zero(order.total_amount.currency());
        let mut pending_manual_release = None;
        if seller_payment.is_positive() {
            match self
                .payments
                .escrow_balance(order.id)
                .and_then(|balance| {
                    let to_release = seller_payment.min(balance).map_err(|e| {
                        PaymentError::Declined(e.to_string())
                    })?;
                    if to_release.is_positive() {
                        self.payments.release_escrow(order.id, to_release)?;
                    }
                    Ok(to_release)
                }) {
                Ok(to_release) => released = to_release,
                Err(err) => {
                    warn!(
                        dispute = %dispute.id,
                        order = %order.id,
                        owed = seller_payment.minor(),
                        %err,
                        "seller release failed after refund; flagged for manual settlement"
                    );
                    pending_manual_release = Some(seller_payment);
                }
            }
        }

        // Step 4: settle the records.
        dispute.status = DisputeStatus::Resolved;
        dispute.resolution = Some(resolution.note().to_string());
        dispute.resolution_amount = Some(refund);
        dispute.resolved_at = Some(Timestamp::now());
        self.disputes.update_dispute(dispute.clone())?;

        let (order_status, escrow_status) =
            derived_order_state(order.total_amount, refund, released);
        if order.status != order_status {
            if order.status.can_transition(order_status) {
                order.status = order_status;
                match order_status {
                    OrderStatus::Completed => order.completed_at = Some(Timestamp::now()),
                    OrderStatus::Cancelled => order.cancelled_at = Some(Timestamp::now()),
                    _ => {}
                }
            } else {
                // Disputes on orders that never left accepted/completed
                // settle funds without rewriting the order status.
                warn!(
                    order = %order.id,
                    from = %order.status,
                    to = %order_status,
                    "derived status not reachable; keeping order status"
                );
            }
        }
        order.escrow_status = escrow_status;
        debug_assert!(order.escrow_status.consistent_with(order.status));
        self.orders.update_order(order.clone())?;

        self.record_dispute(
            DisputeEvent::new(
                dispute.id,
                order.id,
                DisputeEventType::Resolved,
                format!("dispute resolved: {}", resolution.note()),
                Some(admin),
            )
            .with_metadata(json!({
                "refunded_minor": refund.minor(),
                "released_minor": released.minor(),
                "pending_manual_release_minor": pending_manual_release.map(|m| m.minor()),
            })),
        );
        if refund.is_positive() {
            self.record_order(
                OrderEvent::new(
                    order.id,
                    OrderEventType::EscrowRefunded,
                    "escrow refunded to buyer",
                    None,
                )
                .with_metadata(json!({ "amount_minor": refund.minor() })),
            );
        }
        if released.is_positive() {
            self.record_order(
                OrderEvent::new(
                    order.id,
                    OrderEventType::EscrowReleased,
                    "escrow released to seller",
                    None,
                )
                .with_metadata(json!({ "amount_minor": released.minor() })),
            );
        }

        for recipient in [order.buyer_id, order.seller_id] {
            deliver(
                self.notifications,
                Notification {
                    recipient,
                    kind: NotificationKind::DisputeResolved,
                    title: "Dispute resolved".into(),
                    body: format!("The dispute on order {} has been resolved", order.order_number),
                    link: None,
                },
            );
        }
        info!(
            dispute = %dispute.id,
            refunded = refund.minor(),
            released = released.minor(),
            "dispute resolved"
        );
        Ok((
            dispute,
            ResolutionOutcome {
                order_status: order.status,
                escrow_status,
                refunded: refund,
                released,
                pending_manual_release,
            },
        ))
    }

    fn load_dispute(&self, dispute_id: DisputeId) -> Result<Dispute, DisputeError> {
        self.disputes
            .get_dispute(dispute_id)?
            .ok_or(DisputeError::DisputeNotFound(dispute_id))
    }

    fn load_order(&self, order_id: OrderId) -> Result<Order, DisputeError> {
        self.orders
            .get_order(order_id)?
            .ok_or(DisputeError::OrderNotFound(order_id))
    }

    fn check_transition(
        &self,
        dispute: &Dispute,
        target: DisputeStatus,
    ) -> Result<(), DisputeError> {
        if dispute.status.can_transition(target) {
            Ok(())
        } else {
            Err(DisputeError::InvalidTransition {
                from: dispute.status,
                to: target,
            })
        }
    }

    fn display_name(&self, user: Option<UserId>) -> Option<String> {
        user.and_then(|u| self.profiles.display_name(u).ok().flatten())
    }

    fn record_dispute(&self, event: DisputeEvent) {
        let event = match self.display_name(event.actor) {
            Some(name) => event.with_actor_name(name),
            None => event,
        };
        if let Err(err) = self.audit.append_dispute_event(event) {
            warn!(%err, "audit append failed; operation stands");
        }
    }

    fn record_order(&self, event: OrderEvent) {
        let event = match self.display_name(event.actor) {
            Some(name) => event.with_actor_name(name),
            None => event,
        };
        if let Err(err) = self.audit.append_order_event(event) {
            warn!(%err, "audit append failed; operation stands");
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

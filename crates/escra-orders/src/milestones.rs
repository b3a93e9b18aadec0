//! Milestone lifecycle and payment release.
//!
//! Sellers submit, buyers approve or reject. Approval triggers the
//! fund transfer, and it is the one place with an explicit compensating
//! action: when the transfer fails, the milestone is rolled back to
//! `submitted` and the error is returned. Rejection only moves the
//! milestone; opening the resulting dispute is the caller's next step.

use escra_audit::{EventLog, OrderEvent, OrderEventType};
use escra_core::{MilestoneId, Timestamp, UserId};
use escra_state::MilestoneStatus;
use serde_json::json;
use tracing::{info, warn};

use crate::entity::{Milestone, Order};
use crate::error::OrderError;
use crate::notify::{deliver, Notification, NotificationKind, NotificationSink};
use crate::payments::PaymentGateway;
use crate::store::{OrderStore, ProfileDirectory};

/// Orchestrates the milestone state machine and its fund releases.
pub struct MilestoneService<'a> {
    store: &'a dyn OrderStore,
    payments: &'a dyn PaymentGateway,
    notifications: &'a dyn NotificationSink,
    profiles: &'a dyn ProfileDirectory,
    audit: &'a dyn EventLog,
}

impl<'a> MilestoneService<'a> {
    pub fn new(
        store: &'a dyn OrderStore,
        payments: &'a dyn PaymentGateway,
        notifications: &'a dyn NotificationSink,
        profiles: &'a dyn ProfileDirectory,
        audit: &'a dyn EventLog,
    ) -> Self {
        Self {
            store,
            payments,
            notifications,
            profiles,
            audit,
        }
    }

    /// Seller submits a pending milestone for buyer review.
    pub fn submit_milestone(
        &self,
        milestone_id: MilestoneId,
        seller: UserId,
    ) -> Result<Milestone, OrderError> {
        let (mut milestone, order) = self.load(milestone_id)?;
        if order.seller_id != seller {
            return Err(OrderError::NotAParty {
                order: order.id,
                user: seller,
            });
        }
        self.check_transition(&milestone, MilestoneStatus::Submitted)?;

        milestone.status = MilestoneStatus::Submitted;
        milestone.submitted_at = Some(Timestamp::now());
        self.store.update_milestone(milestone.clone())?;

        self.record(
            OrderEvent::new(
                order.id,
                OrderEventType::MilestoneSubmitted,
                format!("milestone submitted: {}", milestone.title),
                Some(seller),
            )
            .with_metadata(json!({ "milestone": milestone.id.to_string() })),
        );
        deliver(
            self.notifications,
            Notification {
                recipient: order.buyer_id,
                kind: NotificationKind::MilestoneSubmitted,
                title: "Milestone submitted".into(),
                body: format!("\"{}\" is ready for your review", milestone.title),
                link: None,
            },
        );
        info!(milestone = %milestone.id, order = %order.id, "milestone submitted");
        Ok(milestone)
    }

    /// Buyer approves a submitted milestone, releasing its funds.
    ///
    /// The milestone is written `approved` before the transfer so the
    /// timestamps reflect the decision. If the transfer then fails the
    /// status is rolled back to `submitted`, the approval timestamp is
    /// cleared, and the payment error is returned. On success the
    /// milestone moves on to `paid`.
    pub fn approve_milestone(
        &self,
        milestone_id: MilestoneId,
        buyer: UserId,
    ) -> Result<Milestone, OrderError> {
        let (mut milestone, order) = self.load(milestone_id)?;
        if order.buyer_id != buyer {
            return Err(OrderError::NotAParty {
                order: order.id,
                user: buyer,
            });
        }
        self.check_transition(&milestone, MilestoneStatus::Approved)?;

        milestone.status = MilestoneStatus::Approved;
        milestone.approved_at = Some(Timestamp::now());
        self.store.update_milestone(milestone.clone())?;

        let fee = self.payments.calculate_platform_fee(milestone.amount);
        let payout = milestone.amount.checked_sub(fee)?;
        if let Err(err) = self.payments.release_escrow(order.id, payout) {
            // Compensating rollback: undo the approval before surfacing
            // the payment failure.
            milestone.status = MilestoneStatus::Submitted;
            milestone.approved_at = None;
            if let Err(store_err) = self.store.update_milestone(milestone.clone()) {
                warn!(
                    milestone = %milestone.id,
                    %store_err,
                    "rollback write failed after payment failure"
                );
            }
            return Err(OrderError::Payment(err));
        }

        milestone.status = MilestoneStatus::Paid;
        self.store.update_milestone(milestone.clone())?;

        self.record(
            OrderEvent::new(
                order.id,
                OrderEventType::MilestoneApproved,
                format!("milestone approved: {}", milestone.title),
                Some(buyer),
            )
            .with_metadata(json!({ "milestone": milestone.id.to_string() })),
        );
        self.record(
            OrderEvent::new(
                order.id,
                OrderEventType::MilestonePaid,
                format!("milestone paid: {}", milestone.title),
                None,
            )
            .with_metadata(json!({
                "payout_minor": payout.minor(),
                "fee_minor": fee.minor(),
            })),
        );
        deliver(
            self.notifications,
            Notification {
                recipient: order.seller_id,
                kind: NotificationKind::MilestoneApproved,
                title: "Milestone approved".into(),
                body: format!("\"{}\" was approved; {payout} released", milestone.title),
                link: None,
            },
        );
        info!(milestone = %milestone.id, payout = payout.minor(), "milestone paid");
        Ok(milestone)
    }

    /// Buyer rejects a submitted milestone.
    ///
    /// The rejection is terminal for the milestone; disputing the
    /// order is a separate follow-up through the dispute service.
    pub fn reject_milestone(
        &self,
        milestone_id: MilestoneId,
        buyer: UserId,
        reason: Option<String>,
    ) -> Result<Milestone, OrderError> {
        let (mut milestone, order) = self.load(milestone_id)?;
        if order.buyer_id != buyer {
            return Err(OrderError::NotAParty {
                order: order.id,
                user: buyer,
            });
        }
        self.check_transition(&milestone, MilestoneStatus::Rejected)?;

        milestone.status = MilestoneStatus::Rejected;
        self.store.update_milestone(milestone.clone())?;

        let mut event = OrderEvent::new(
            order.id,
            OrderEventType::MilestoneRejected,
            format!("milestone rejected: {}", milestone.title),
            Some(buyer),
        );
        if let Some(reason) = &reason {
            event = event.with_metadata(json!({ "reason": reason }));
        }
        self.record(event);
        deliver(
            self.notifications,
            Notification {
                recipient: order.seller_id,
                kind: NotificationKind::MilestoneRejected,
                title: "Milestone rejected".into(),
                body: format!("\"{}\" was rejected", milestone.title),
                link: None,
            },
        );
        info!(milestone = %milestone.id, order = %order.id, "milestone rejected");
        Ok(milestone)
    }

    fn load(&self, milestone_id: MilestoneId) -> Result<(Milestone, Order), OrderError> {
        let milestone = self
            .store
            .get_milestone(milestone_id)?
            .ok_or(OrderError::MilestoneNotFound(milestone_id))?;
        let order = self
            .store
            .get_order(milestone.order_id)?
            .ok_or(OrderError::OrderNotFound(milestone.order_id))?;
        Ok((milestone, order))
    }

    fn check_transition(
        &self,
        milestone: &Milestone,
        target: MilestoneStatus,
    ) -> Result<(), OrderError> {
        if milestone.status.can_transition(target) {
            Ok(())
        } else {
            Err(OrderError::InvalidMilestoneTransition {
                from: milestone.status,
                to: target,
            })
        }
    }

    fn record(&self, event: OrderEvent) {
        let name = event
            .actor
            .and_then(|actor| self.profiles.display_name(actor).ok().flatten());
        let event = match name {
            Some(name) => event.with_actor_name(name),
            None => event,
        };
        if let Err(err) = self.audit.append_order_event(event) {
            warn!(%err, "audit append failed; operation stands");
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

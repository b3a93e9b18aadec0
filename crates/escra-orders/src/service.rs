//! Order orchestration.
//!
//! Each operation wraps a read, a transition check against the status
//! tables, a write, and an audit append. Audit and notification
//! failures are logged and swallowed; store and payment failures
//! propagate. There is no optimistic-concurrency token: two racing
//! writers on one order resolve last-write-wins at the store.

use escra_audit::{EventLog, OrderEvent, OrderEventType};
use escra_core::{Money, OrderId, OrderNumber, Percent, Timestamp, UserId};
use escra_state::{EscrowStatus, OrderStatus, Role};
use serde_json::json;
use tracing::{info, warn};

use crate::entity::{Milestone, NewOrder, Order, OrderType};
use crate::error::OrderError;
use crate::invoice::{InvoiceGenerator, InvoiceRef};
use crate::notify::{deliver, Notification, NotificationKind, NotificationSink};
use crate::payments::PaymentGateway;
use crate::store::{OrderFilter, OrderStore, ProfileDirectory};

/// VAT rate applied at order creation.
pub const VAT_RATE: Percent = Percent::from_const(20);

/// Result of completing an order.
///
/// Invoice generation is best-effort; when it fails the completion
/// still stands and the failure rides along here.
#[derive(Debug)]
pub struct CompletionOutcome {
    pub order: Order,
    pub invoice: Option<InvoiceRef>,
    pub invoice_error: Option<String>,
}

/// One page of a listing.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    /// 1-based page number.
    pub number: usize,
    pub size: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: 1,
            size: 20,
        }
    }
}

/// A page of results plus the total match count.
#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

impl<T> Paged<T> {
    fn empty(page: Page) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: page.number,
            page_size: page.size,
        }
    }
}

/// Listing query for [`OrderService::get_orders`].
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub number_contains: Option<String>,
    pub page: Page,
}

/// Orchestrates order reads and writes against the store, payment
/// gateway, and audit log.
pub struct OrderService<'a> {
    store: &'a dyn OrderStore,
    payments: &'a dyn PaymentGateway,
    notifications: &'a dyn NotificationSink,
    invoices: &'a dyn InvoiceGenerator,
    profiles: &'a dyn ProfileDirectory,
    audit: &'a dyn EventLog,
}

impl<'a> OrderService<'a> {
    pub fn new(
        store: &'a dyn OrderStore,
        payments: &'a dyn PaymentGateway,
        notifications: &'a dyn NotificationSink,
        invoices: &'a dyn InvoiceGenerator,
        profiles: &'a dyn ProfileDirectory,
        audit: &'a dyn EventLog,
    ) -> Self {
        Self {
            store,
            payments,
            notifications,
            invoices,
            profiles,
            audit,
        }
    }

    /// Create an order in `pending`/`pending` escrow.
    ///
    /// VAT and platform fee are computed from the total at the fixed
    /// rates and stored denormalized. Milestone amounts, when supplied,
    /// must sum exactly to the total; a mismatch rejects creation up
    /// front. Milestone row inserts after the order insert are
    /// best-effort: a failed insert is logged and the order stands.
    pub fn create_order(&self, buyer: UserId, params: NewOrder) -> Result<Order, OrderError> {
        if !params.total_amount.is_positive() {
            return Err(OrderError::Validation(
                "order total must be positive".into(),
            ));
        }
        if buyer == params.seller_id {
            return Err(OrderError::Validation(
                "buyer and seller must be different users".into(),
            ));
        }
        if !params.milestones.is_empty() {
            let mut sum = Money::zero(params.total_amount.currency());
            for milestone in &params.milestones {
                sum = sum.checked_add(milestone.amount)?;
            }
            if sum != params.total_amount {
                return Err(OrderError::MilestoneSumMismatch {
                    expected: params.total_amount,
                    actual: sum,
                });
            }
        }

        let id = OrderId::new();
        let intent = self.payments.create_payment_intent(id, params.total_amount)?;
        let order = Order {
            id,
            order_number: OrderNumber::for_order(&id),
            buyer_id: buyer,
            seller_id: params.seller_id,
            listing_id: params.listing_id,
            order_type: if params.milestones.is_empty() {
                OrderType::OneOff
            } else {
                OrderType::Milestoned
            },
            status: OrderStatus::Pending,
            escrow_status: EscrowStatus::Pending,
            total_amount: params.total_amount,
            platform_fee: self.payments.calculate_platform_fee(params.total_amount),
            vat_amount: params.total_amount.percentage(VAT_RATE),
            vat_rate: VAT_RATE,
            payment_intent_id: Some(intent),
            created_at: Timestamp::now(),
            completed_at: None,
            cancelled_at: None,
        };
        self.store.insert_order(order.clone())?;

        for new_milestone in params.milestones {
            let milestone = Milestone {
                id: escra_core::MilestoneId::new(),
                order_id: order.id,
                title: new_milestone.title,
                description: new_milestone.description,
                amount: new_milestone.amount,
                due_date: new_milestone.due_date,
                status: escra_state::MilestoneStatus::Pending,
                submitted_at: None,
                approved_at: None,
            };
            if let Err(err) = self.store.insert_milestone(milestone) {
                warn!(order = %order.id, %err, "milestone insert failed; order stands");
            }
        }

        self.record(
            OrderEvent::new(order.id, OrderEventType::Created, "order placed", Some(buyer))
                .with_metadata(json!({
                    "total_minor": order.total_amount.minor(),
                    "currency": order.total_amount.currency().as_str(),
                })),
        );
        deliver(
            self.notifications,
            Notification {
                recipient: order.seller_id,
                kind: NotificationKind::OrderCreated,
                title: "New order".into(),
                body: format!("Order {} is awaiting your response", order.order_number),
                link: None,
            },
        );
        info!(order = %order.id, number = %order.order_number, "order created");
        Ok(order)
    }

    /// Move an order to `new_status` after validating the transition.
    ///
    /// An illegal transition returns an error and leaves the order
    /// untouched. Only buyer, seller, or an admin may move an order.
    pub fn update_order_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
        actor: UserId,
        role: Role,
        reason: Option<String>,
    ) -> Result<Order, OrderError> {
        let mut order = self.load(order_id)?;
        if role != Role::Admin && !order.is_party(actor) {
            return Err(OrderError::NotAParty {
                order: order_id,
                user: actor,
            });
        }
        if !order.status.can_transition(new_status) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: new_status,
            });
        }

        let previous = order.status;
        // Acceptance captures the payment intent into escrow; a capture
        // failure leaves the order pending.
        if new_status == OrderStatus::Accepted {
            self.payments.hold_payment(order.id)?;
            order.escrow_status = EscrowStatus::Held;
        }
        order.status = new_status;
        match new_status {
            OrderStatus::Completed => order.completed_at = Some(Timestamp::now()),
            OrderStatus::Cancelled => order.cancelled_at = Some(Timestamp::now()),
            _ => {}
        }
        self.store.update_order(order.clone())?;

        let mut event = OrderEvent::new(
            order.id,
            OrderEventType::for_status(new_status),
            format!("status {previous} -> {new_status}"),
            Some(actor),
        );
        if let Some(reason) = &reason {
            event = event.with_metadata(json!({ "reason": reason }));
        }
        self.record(event);
        self.notify_counterparty(&order, actor, NotificationKind::OrderStatusChanged, new_status);
        info!(order = %order.id, from = %previous, to = %new_status, "order status changed");
        Ok(order)
    }

    /// Seller accepts a pending order.
    pub fn accept_order(&self, order_id: OrderId, seller: UserId) -> Result<Order, OrderError> {
        self.update_order_status(order_id, OrderStatus::Accepted, seller, Role::Seller, None)
    }

    /// Seller starts work on an accepted order.
    pub fn start_order(&self, order_id: OrderId, seller: UserId) -> Result<Order, OrderError> {
        self.update_order_status(order_id, OrderStatus::InProgress, seller, Role::Seller, None)
    }

    /// Cancel an order from any non-terminal status that permits it.
    pub fn cancel_order(
        &self,
        order_id: OrderId,
        actor: UserId,
        role: Role,
        reason: Option<String>,
    ) -> Result<Order, OrderError> {
        self.update_order_status(order_id, OrderStatus::Cancelled, actor, role, reason)
    }

    /// Complete an order: release the escrowed funds to the seller,
    /// mark the order `completed`/`released`, and generate the invoice.
    ///
    /// The escrow release happens before any state is written, so a
    /// payment failure leaves the order untouched. Invoice failures are
    /// reported alongside success rather than failing the completion.
    pub fn complete_order(
        &self,
        order_id: OrderId,
        actor: UserId,
        role: Role,
    ) -> Result<CompletionOutcome, OrderError> {
        let mut order = self.load(order_id)?;
        if role != Role::Admin && !order.is_party(actor) {
            return Err(OrderError::NotAParty {
                order: order_id,
                user: actor,
            });
        }
        if !order.status.can_transition(OrderStatus::Completed) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Completed,
            });
        }

        let balance = self.payments.escrow_balance(order.id)?;
        let payout = order
            .total_amount
            .checked_sub(order.platform_fee)?
            .min(balance)?;
        if payout.is_positive() {
            self.payments.release_escrow(order.id, payout)?;
        }

        order.status = OrderStatus::Completed;
        order.escrow_status = EscrowStatus::Released;
        order.completed_at = Some(Timestamp::now());
        debug_assert!(order.escrow_status.consistent_with(order.status));
        self.store.update_order(order.clone())?;

        self.record(
            OrderEvent::new(order.id, OrderEventType::Completed, "order completed", Some(actor)),
        );
        self.record(
            OrderEvent::new(
                order.id,
                OrderEventType::EscrowReleased,
                "escrow released to seller",
                Some(actor),
            )
            .with_metadata(json!({ "amount_minor": payout.minor() })),
        );

        let (invoice, invoice_error) = match self.invoices.generate(&order) {
            Ok(invoice) => {
                self.record(OrderEvent::new(
                    order.id,
                    OrderEventType::InvoiceIssued,
                    format!("invoice {} issued", invoice.0),
                    None,
                ));
                (Some(invoice), None)
            }
            Err(err) => {
                warn!(order = %order.id, %err, "invoice generation failed; completion stands");
                (None, Some(err.to_string()))
            }
        };

        self.notify_counterparty(&order, actor, NotificationKind::PaymentReleased, order.status);
        info!(order = %order.id, payout = payout.minor(), "order completed");
        Ok(CompletionOutcome {
            order,
            invoice,
            invoice_error,
        })
    }

    /// Role-scoped, filtered, paginated order listing.
    ///
    /// Buyers see orders they placed; sellers see orders on their
    /// provider profile, and a seller without one silently sees an
    /// empty page; admins see everything.
    pub fn get_orders(
        &self,
        user: UserId,
        role: Role,
        query: &OrderQuery,
    ) -> Result<Paged<Order>, OrderError> {
        let mut filter = OrderFilter {
            status: query.status,
            number_contains: query.number_contains.clone(),
            ..OrderFilter::default()
        };
        match role {
            Role::Buyer => filter.buyer = Some(user),
            Role::Seller => {
                if self.profiles.provider_for_user(user)?.is_none() {
                    return Ok(Paged::empty(query.page));
                }
                filter.seller = Some(user);
            }
            Role::Admin => {}
        }

        let matched = self.store.list_orders(&filter)?;
        let total = matched.len();
        let size = query.page.size.max(1);
        let start = query.page.number.saturating_sub(1).saturating_mul(size);
        let items = matched.into_iter().skip(start).take(size).collect();
        Ok(Paged {
            items,
            total,
            page: query.page.number,
            page_size: size,
        })
    }

    fn load(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.store
            .get_order(order_id)?
            .ok_or(OrderError::OrderNotFound(order_id))
    }

    fn record(&self, event: OrderEvent) {
        // Denormalize the actor's display name at append time.
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

    fn notify_counterparty(
        &self,
        order: &Order,
        actor: UserId,
        kind: NotificationKind,
        status: OrderStatus,
    ) {
        let recipients: Vec<UserId> = match order.counterparty(actor) {
            Some(other) => vec![other],
            // Admin actions notify both parties.
            None => vec![order.buyer_id, order.seller_id],
        };
        for recipient in recipients {
            deliver(
                self.notifications,
                Notification {
                    recipient,
                    kind,
                    title: "Order update".into(),
                    body: format!("Order {} is now {status}", order.order_number),
                    link: None,
                },
            );
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

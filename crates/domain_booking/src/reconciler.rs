//! Webhook reconciliation
//!
//! Gateway events arrive out of order, repeated, and sometimes for orders
//! this system no longer recognizes. The reconciler turns each event into
//! at most one atomic settlement: the order transition, the linked party
//! transition, invoice creation or voiding, and the idempotency mark all
//! commit together through [`BookingStore::commit_settlement`].
//!
//! Anything that is wrong with the event itself (missing metadata, unknown
//! order, state precondition not met) is warn-logged and acknowledged so
//! the gateway stops retrying; those cases stay out of the processed-event
//! ledger and can be reconciled by hand later. Only datastore failures
//! propagate as errors.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use core_kernel::{Clock, Money, OrderId, PartyId};
use domain_billing::{
    ChargePayload, CheckoutSessionPayload, GatewayEvent, GatewayEventKind, Invoice, InvoiceDraft,
    InvoiceType, LineItem, PaymentPurpose,
};
use domain_orders::{Order, OrderEvent};
use domain_party::Party;

use crate::error::BookingError;
use crate::ports::{
    BookingStore, NotificationSender, PaymentReceiptNotice, SettlementCommit, SettlementUpdate,
};

/// What a settlement changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementAction {
    /// Deposit received; order and party confirmed
    DepositConfirmed { order_id: OrderId },
    /// Balance received; order completed
    OrderCompleted { order_id: OrderId },
    /// Checkout lapsed unpaid; order cancelled
    CheckoutCancelled { order_id: OrderId },
    /// Refund recorded; `full` means the order was cancelled
    RefundApplied { order_id: OrderId, full: bool },
}

/// Why an event was acknowledged without a settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The session carried no usable order correlation
    MissingMetadata,
    /// The correlated order does not exist here
    UnknownOrder,
    /// The order was not in the state the event expects
    PreconditionFailed,
    /// A payment failure note; nothing to settle
    PaymentFailureNoted,
    /// An event type this system does not act on
    UnrecognizedEvent,
}

/// Result of processing one gateway event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A settlement was committed
    Applied(SettlementAction),
    /// The event id was already in the ledger
    Duplicate,
    /// Acknowledged without effect
    Logged(SkipReason),
}

enum PartyTransition {
    Confirm,
    Complete,
    Cancel,
}

/// Service that settles gateway webhook events
pub struct WebhookReconciler {
    store: Arc<dyn BookingStore>,
    notifier: Arc<dyn NotificationSender>,
    clock: Arc<dyn Clock>,
}

impl WebhookReconciler {
    /// Creates a new reconciler
    pub fn new(
        store: Arc<dyn BookingStore>,
        notifier: Arc<dyn NotificationSender>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
        }
    }

    /// Processes one gateway event
    ///
    /// Safe to call with the same event any number of times: the first
    /// delivery settles, every replay reports `Duplicate`.
    ///
    /// # Errors
    ///
    /// Only store failures surface here; event-level problems come back as
    /// `Logged` outcomes
    #[instrument(skip(self, event), fields(event_id = %event.id, event_type = event.kind_name()))]
    pub async fn process(&self, event: &GatewayEvent) -> Result<ReconcileOutcome, BookingError> {
        if self.store.is_event_processed(&event.id).await? {
            debug!("Event already in the ledger");
            return Ok(ReconcileOutcome::Duplicate);
        }

        match &event.kind {
            GatewayEventKind::CheckoutCompleted(session) => {
                self.settle_checkout(event, session).await
            }
            GatewayEventKind::CheckoutExpired(session) => {
                self.settle_expiry(event, session).await
            }
            GatewayEventKind::PaymentFailed(intent) => {
                warn!(intent_id = %intent.intent_id, "Payment attempt failed");
                Ok(ReconcileOutcome::Logged(SkipReason::PaymentFailureNoted))
            }
            GatewayEventKind::ChargeRefunded(charge) => self.settle_refund(event, charge).await,
            GatewayEventKind::Unrecognized { event_type } => {
                debug!(event_type, "Ignoring unhandled event type");
                Ok(ReconcileOutcome::Logged(SkipReason::UnrecognizedEvent))
            }
        }
    }

    /// Settles a completed checkout session for either installment
    async fn settle_checkout(
        &self,
        event: &GatewayEvent,
        session: &CheckoutSessionPayload,
    ) -> Result<ReconcileOutcome, BookingError> {
        let (Some(order_id), Some(purpose)) = (
            session.metadata.parsed_order_id(),
            session.metadata.parsed_purpose(),
        ) else {
            warn!("Checkout session carries no usable order metadata");
            return Ok(ReconcileOutcome::Logged(SkipReason::MissingMetadata));
        };
        let Some(mut order) = self.fetch_order(order_id).await? else {
            return Ok(ReconcileOutcome::Logged(SkipReason::UnknownOrder));
        };

        let now = self.clock.now();
        let (action, draft) = match purpose {
            PaymentPurpose::Deposit => {
                if let Err(err) = order.confirm_deposit(
                    session.session_id.clone(),
                    session.payment_intent.clone(),
                    now,
                ) {
                    warn!(order_id = %order_id, error = %err, "Deposit settlement skipped");
                    return Ok(ReconcileOutcome::Logged(SkipReason::PreconditionFailed));
                }
                let amount = order.pricing().deposit;
                let draft = self.invoice_draft(&order, InvoiceType::Deposit, amount, now);
                (SettlementAction::DepositConfirmed { order_id }, draft)
            }
            PaymentPurpose::FullPayment => {
                if let Err(err) = order.complete_payment(
                    session.session_id.clone(),
                    session.payment_intent.clone(),
                    now,
                ) {
                    warn!(order_id = %order_id, error = %err, "Balance settlement skipped");
                    return Ok(ReconcileOutcome::Logged(SkipReason::PreconditionFailed));
                }
                let amount = order.pricing().balance_due()?;
                let draft = self.invoice_draft(&order, InvoiceType::Final, amount, now);
                (SettlementAction::OrderCompleted { order_id }, draft)
            }
        };

        let transition = match purpose {
            PaymentPurpose::Deposit => PartyTransition::Confirm,
            PaymentPurpose::FullPayment => PartyTransition::Complete,
        };
        let party = match order.party_id() {
            Some(party_id) => self.move_party(party_id, transition, now).await?,
            None => None,
        };

        let events = order.take_events();
        let update = SettlementUpdate {
            event_id: event.id.clone(),
            processed_at: now,
            order,
            party,
            invoice: Some(draft),
            void_invoices: false,
        };
        match self.store.commit_settlement(&update).await? {
            SettlementCommit::AlreadyProcessed => Ok(ReconcileOutcome::Duplicate),
            SettlementCommit::Applied { invoice } => {
                log_events(&events);
                if let Some(invoice) = invoice {
                    self.send_receipt(&update.order, &invoice).await;
                }
                Ok(ReconcileOutcome::Applied(action))
            }
        }
    }

    /// Cancels an order whose checkout session lapsed unpaid
    async fn settle_expiry(
        &self,
        event: &GatewayEvent,
        session: &CheckoutSessionPayload,
    ) -> Result<ReconcileOutcome, BookingError> {
        let Some(order_id) = session.metadata.parsed_order_id() else {
            warn!("Expired session carries no usable order metadata");
            return Ok(ReconcileOutcome::Logged(SkipReason::MissingMetadata));
        };
        let Some(mut order) = self.fetch_order(order_id).await? else {
            return Ok(ReconcileOutcome::Logged(SkipReason::UnknownOrder));
        };

        let now = self.clock.now();
        if let Err(err) = order.expire_checkout(now) {
            // A balance session expiring on a confirmed order lands here
            warn!(order_id = %order_id, error = %err, "Expiry skipped");
            return Ok(ReconcileOutcome::Logged(SkipReason::PreconditionFailed));
        }

        let events = order.take_events();
        let update = SettlementUpdate {
            event_id: event.id.clone(),
            processed_at: now,
            order,
            party: None,
            invoice: None,
            void_invoices: false,
        };
        match self.store.commit_settlement(&update).await? {
            SettlementCommit::AlreadyProcessed => Ok(ReconcileOutcome::Duplicate),
            SettlementCommit::Applied { .. } => {
                log_events(&events);
                Ok(ReconcileOutcome::Applied(SettlementAction::CheckoutCancelled { order_id }))
            }
        }
    }

    /// Records a refund, cancelling the order when it covers the charge
    async fn settle_refund(
        &self,
        event: &GatewayEvent,
        charge: &ChargePayload,
    ) -> Result<ReconcileOutcome, BookingError> {
        let Some(payment_intent) = charge.payment_intent.as_deref() else {
            warn!(charge_id = %charge.charge_id, "Refunded charge has no payment intent");
            return Ok(ReconcileOutcome::Logged(SkipReason::MissingMetadata));
        };
        let Some(mut order) = self.store.find_order_by_payment_intent(payment_intent).await?
        else {
            warn!(payment_intent, "No order matches the refunded payment intent");
            return Ok(ReconcileOutcome::Logged(SkipReason::UnknownOrder));
        };

        let currency = order.pricing().total.currency();
        let charged = Money::from_minor(charge.amount, currency);
        let refunded = Money::from_minor(charge.amount_refunded, currency);
        let full = Money::is_full_refund(&charged, &refunded);

        let now = self.clock.now();
        let order_id = order.id();
        if let Err(err) = order.apply_refund(refunded, full, now) {
            warn!(order_id = %order_id, error = %err, "Refund skipped");
            return Ok(ReconcileOutcome::Logged(SkipReason::PreconditionFailed));
        }

        let party = match (full, order.party_id()) {
            (true, Some(party_id)) => {
                self.move_party(party_id, PartyTransition::Cancel, now).await?
            }
            _ => None,
        };

        let events = order.take_events();
        let update = SettlementUpdate {
            event_id: event.id.clone(),
            processed_at: now,
            order,
            party,
            invoice: None,
            void_invoices: full,
        };
        match self.store.commit_settlement(&update).await? {
            SettlementCommit::AlreadyProcessed => Ok(ReconcileOutcome::Duplicate),
            SettlementCommit::Applied { .. } => {
                log_events(&events);
                Ok(ReconcileOutcome::Applied(SettlementAction::RefundApplied {
                    order_id,
                    full,
                }))
            }
        }
    }

    /// Loads an order, flattening not-found into `None`
    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, BookingError> {
        match self.store.get_order(order_id).await {
            Ok(order) => Ok(Some(order)),
            Err(err) if err.is_not_found() => {
                warn!(order_id = %order_id, "Event references an unknown order");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Applies a party transition, tolerating everything except store loss
    ///
    /// A missing party or a refused transition never blocks the order
    /// settlement; the party is simply left out of the update.
    async fn move_party(
        &self,
        party_id: PartyId,
        transition: PartyTransition,
        now: DateTime<Utc>,
    ) -> Result<Option<Party>, BookingError> {
        let mut party = match self.store.get_party(party_id).await {
            Ok(party) => party,
            Err(err) if err.is_not_found() => {
                warn!(party_id = %party_id, "Order references a missing party");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        let moved = match transition {
            PartyTransition::Confirm => party.confirm(now),
            PartyTransition::Complete => party.complete(now),
            PartyTransition::Cancel => party.cancel(now),
        };
        match moved {
            Ok(()) => Ok(Some(party)),
            Err(err) => {
                warn!(party_id = %party_id, error = %err, "Party transition skipped");
                Ok(None)
            }
        }
    }

    fn invoice_draft(
        &self,
        order: &Order,
        invoice_type: InvoiceType,
        amount: Money,
        now: DateTime<Utc>,
    ) -> InvoiceDraft {
        let label = match invoice_type {
            InvoiceType::Deposit => format!("Deposit for order {}", order.order_number()),
            _ => format!("Balance for order {}", order.order_number()),
        };
        InvoiceDraft::new(
            order.id(),
            order.customer_id(),
            invoice_type,
            vec![LineItem::new(label, amount)],
            amount,
            now,
        )
    }

    /// Sends the payment receipt; failures are logged, never propagated
    async fn send_receipt(&self, order: &Order, invoice: &Invoice) {
        let customer = match self.store.get_customer(order.customer_id()).await {
            Ok(customer) => customer,
            Err(err) => {
                warn!(error = %err, "Could not load customer for receipt");
                return;
            }
        };
        let purpose = match invoice.invoice_type {
            InvoiceType::Deposit => PaymentPurpose::Deposit,
            _ => PaymentPurpose::FullPayment,
        };
        let notice = PaymentReceiptNotice {
            to: customer.email,
            invoice_number: invoice.invoice_number.to_string(),
            amount: invoice.total,
            purpose,
        };
        if let Err(err) = self.notifier.send_payment_receipt(&notice).await {
            warn!(error = %err, "Failed to send payment receipt");
        }
    }
}

fn log_events(events: &[OrderEvent]) {
    for event in events {
        info!(event = event.name(), order_id = %event.order_id(), "Domain event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use core_kernel::{Currency, CustomerId, FixedClock, PortError, Timezone};
    use domain_orders::{OrderItem, OrderNumber, OrderStatus, Package, Pricing};
    use domain_party::{ChildInfo, Customer, PartyDetails, PartyStatus};
    use serde_json::json;

    use crate::memory::MemoryBookingStore;
    use crate::ports::mock::MockNotificationSender;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 14, 10, 30, 0).unwrap()
    }

    fn aud(minor: i64) -> Money {
        Money::from_minor(minor, Currency::AUD)
    }

    struct Harness {
        store: Arc<MemoryBookingStore>,
        notifier: Arc<MockNotificationSender>,
        reconciler: WebhookReconciler,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryBookingStore::new());
        let notifier = Arc::new(MockNotificationSender::new());
        let reconciler = WebhookReconciler::new(
            store.clone(),
            notifier.clone(),
            Arc::new(FixedClock::new(now())),
        );
        Harness {
            store,
            notifier,
            reconciler,
        }
    }

    async fn seed_booking(store: &MemoryBookingStore) -> (Order, Party) {
        let customer = Customer::new("kim@example.com", "Kim", "0400", Currency::AUD, now());
        let details = PartyDetails {
            date: chrono::NaiveDate::from_ymd_opt(2025, 8, 2).unwrap(),
            start_time: chrono::NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            venue: "Main Hall".to_string(),
            guest_count: 12,
            special_requests: None,
        };
        let child = ChildInfo {
            child_name: "Ruby".to_string(),
            child_age: 7,
            allergies: None,
            special_needs: None,
        };
        let party = Party::new(
            customer.id,
            details,
            child,
            "Sam 0400 333 444",
            &Timezone::default(),
            now(),
        );
        let package = Package {
            id: "pkg_superhero".to_string(),
            name: "Superhero Spectacular".to_string(),
            price: aud(450_000),
        };
        let number: OrderNumber = "PP2507-K4T9ZA".parse().unwrap();
        let mut order = Order::new(
            customer.id,
            Some(party.id),
            number,
            vec![OrderItem::from(&package)],
            Pricing::from_total(aud(450_000), 30),
            now(),
        );
        order.take_events();

        store.insert_customer(customer).await;
        store.insert_party(party.clone()).await;
        store.insert_order(order.clone()).await;
        (order, party)
    }

    fn checkout_completed(event_id: &str, order_id: OrderId, purpose: &str) -> GatewayEvent {
        let body = json!({
            "id": event_id,
            "type": "checkout.session.completed",
            "data": { "object": {
                "id": format!("cs_{event_id}"),
                "payment_intent": format!("pi_{event_id}"),
                "amount_total": 135_000,
                "currency": "aud",
                "metadata": { "orderId": order_id.to_string(), "type": purpose }
            }}
        });
        GatewayEvent::from_json(body.to_string().as_bytes()).unwrap()
    }

    fn checkout_expired(event_id: &str, order_id: OrderId) -> GatewayEvent {
        let body = json!({
            "id": event_id,
            "type": "checkout.session.expired",
            "data": { "object": {
                "id": format!("cs_{event_id}"),
                "metadata": { "orderId": order_id.to_string(), "type": "deposit" }
            }}
        });
        GatewayEvent::from_json(body.to_string().as_bytes()).unwrap()
    }

    fn charge_refunded(event_id: &str, intent: &str, amount: i64, refunded: i64) -> GatewayEvent {
        let body = json!({
            "id": event_id,
            "type": "charge.refunded",
            "data": { "object": {
                "id": format!("ch_{event_id}"),
                "payment_intent": intent,
                "amount": amount,
                "amount_refunded": refunded,
                "currency": "aud"
            }}
        });
        GatewayEvent::from_json(body.to_string().as_bytes()).unwrap()
    }

    #[tokio::test]
    async fn test_deposit_settlement_confirms_order_party_and_invoices() {
        let h = harness();
        let (order, party) = seed_booking(&h.store).await;

        let event = checkout_completed("evt_1", order.id(), "deposit");
        let outcome = h.reconciler.process(&event).await.unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Applied(SettlementAction::DepositConfirmed {
                order_id: order.id()
            })
        );

        let settled = h.store.order(order.id()).await.unwrap();
        assert_eq!(settled.status(), OrderStatus::Confirmed);
        assert_eq!(settled.pricing().deposit_paid_at, Some(now()));
        assert_eq!(
            settled.pricing().checkout_session_id.as_deref(),
            Some("cs_evt_1")
        );
        assert_eq!(
            settled.pricing().payment_intent_id.as_deref(),
            Some("pi_evt_1")
        );

        let party = h.store.party(party.id).await.unwrap();
        assert_eq!(party.status, PartyStatus::Confirmed);

        let invoices = h.store.invoices().await;
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].invoice_type, InvoiceType::Deposit);
        assert_eq!(invoices[0].total, aud(135_000));
        assert_eq!(invoices[0].line_items[0].description, "Deposit for order PP2507-K4T9ZA");

        let receipts = h.notifier.receipts().await;
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].to, "kim@example.com");
        assert_eq!(receipts[0].amount, aud(135_000));
        assert_eq!(receipts[0].purpose, PaymentPurpose::Deposit);
    }

    #[tokio::test]
    async fn test_replayed_event_settles_once() {
        let h = harness();
        let (order, _) = seed_booking(&h.store).await;

        let event = checkout_completed("evt_1", order.id(), "deposit");
        h.reconciler.process(&event).await.unwrap();
        let replay = h.reconciler.process(&event).await.unwrap();

        assert_eq!(replay, ReconcileOutcome::Duplicate);
        assert_eq!(h.store.invoices().await.len(), 1);
        assert_eq!(h.notifier.receipts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_full_payment_completes_order_and_party() {
        let h = harness();
        let (order, party) = seed_booking(&h.store).await;
        h.reconciler
            .process(&checkout_completed("evt_1", order.id(), "deposit"))
            .await
            .unwrap();

        let outcome = h.reconciler
            .process(&checkout_completed("evt_2", order.id(), "full_payment"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Applied(SettlementAction::OrderCompleted {
                order_id: order.id()
            })
        );
        let settled = h.store.order(order.id()).await.unwrap();
        assert_eq!(settled.status(), OrderStatus::Completed);
        assert_eq!(settled.pricing().paid_at, Some(now()));
        // The balance session's intent supersedes the deposit's
        assert_eq!(settled.pricing().payment_intent_id.as_deref(), Some("pi_evt_2"));

        assert_eq!(h.store.party(party.id).await.unwrap().status, PartyStatus::Completed);

        let invoices = h.store.invoices().await;
        assert_eq!(invoices.len(), 2);
        assert_eq!(invoices[1].invoice_type, InvoiceType::Final);
        assert_eq!(invoices[1].total, aud(315_000));
        assert_eq!(invoices[1].invoice_number.to_string(), "PP-INV-2025-002");
    }

    #[tokio::test]
    async fn test_out_of_order_balance_before_deposit_is_acknowledged() {
        let h = harness();
        let (order, party) = seed_booking(&h.store).await;

        let outcome = h.reconciler
            .process(&checkout_completed("evt_1", order.id(), "full_payment"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Logged(SkipReason::PreconditionFailed)
        );
        // Nothing changed and the event can still be reconciled by hand
        let untouched = h.store.order(order.id()).await.unwrap();
        assert_eq!(untouched.status(), OrderStatus::New);
        assert_eq!(h.store.party(party.id).await.unwrap().status, PartyStatus::Inquiry);
        assert!(h.store.invoices().await.is_empty());
        assert!(!h.store.is_event_processed("evt_1").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_metadata_is_logged_not_failed() {
        let h = harness();
        let body = json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": { "object": { "id": "cs_1", "metadata": {} } }
        });
        let event = GatewayEvent::from_json(body.to_string().as_bytes()).unwrap();

        let outcome = h.reconciler.process(&event).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::Logged(SkipReason::MissingMetadata));
    }

    #[tokio::test]
    async fn test_unknown_order_is_logged_not_failed() {
        let h = harness();
        let event = checkout_completed("evt_1", OrderId::new(), "deposit");

        let outcome = h.reconciler.process(&event).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::Logged(SkipReason::UnknownOrder));
    }

    #[tokio::test]
    async fn test_expired_session_cancels_new_order_only() {
        let h = harness();
        let (order, party) = seed_booking(&h.store).await;

        let outcome = h.reconciler
            .process(&checkout_expired("evt_1", order.id()))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Applied(SettlementAction::CheckoutCancelled {
                order_id: order.id()
            })
        );
        assert_eq!(
            h.store.order(order.id()).await.unwrap().status(),
            OrderStatus::Cancelled
        );
        // The party keeps its slot until someone decides otherwise
        assert_eq!(h.store.party(party.id).await.unwrap().status, PartyStatus::Inquiry);
        assert!(h.store.invoices().await.is_empty());
    }

    #[tokio::test]
    async fn test_expiry_after_confirmation_is_acknowledged() {
        let h = harness();
        let (order, _) = seed_booking(&h.store).await;
        h.reconciler
            .process(&checkout_completed("evt_1", order.id(), "deposit"))
            .await
            .unwrap();

        let outcome = h.reconciler
            .process(&checkout_expired("evt_2", order.id()))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Logged(SkipReason::PreconditionFailed)
        );
        assert_eq!(
            h.store.order(order.id()).await.unwrap().status(),
            OrderStatus::Confirmed
        );
    }

    #[tokio::test]
    async fn test_payment_failure_is_noted_only() {
        let h = harness();
        let body = json!({
            "id": "evt_1",
            "type": "payment_intent.payment_failed",
            "data": { "object": { "id": "pi_1" } }
        });
        let event = GatewayEvent::from_json(body.to_string().as_bytes()).unwrap();

        let outcome = h.reconciler.process(&event).await.unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Logged(SkipReason::PaymentFailureNoted)
        );
        assert!(!h.store.is_event_processed("evt_1").await.unwrap());
    }

    #[tokio::test]
    async fn test_partial_refund_keeps_booking_alive() {
        let h = harness();
        let (order, party) = seed_booking(&h.store).await;
        h.reconciler
            .process(&checkout_completed("evt_1", order.id(), "deposit"))
            .await
            .unwrap();

        // Deposit-only refund against the full charge amount
        let outcome = h.reconciler
            .process(&charge_refunded("evt_2", "pi_evt_1", 450_000, 135_000))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Applied(SettlementAction::RefundApplied {
                order_id: order.id(),
                full: false
            })
        );
        let settled = h.store.order(order.id()).await.unwrap();
        assert_eq!(settled.status(), OrderStatus::Confirmed);
        assert_eq!(settled.pricing().refund_amount, Some(aud(135_000)));
        assert_eq!(settled.pricing().refunded_at, Some(now()));
        assert_eq!(h.store.party(party.id).await.unwrap().status, PartyStatus::Confirmed);
        // No invoice was voided
        assert!(h.store.invoices().await.iter().all(|i| i.voided_at.is_none()));
    }

    #[tokio::test]
    async fn test_full_refund_of_deposit_cancels_booking_and_voids_invoice() {
        let h = harness();
        let (order, party) = seed_booking(&h.store).await;
        h.reconciler
            .process(&checkout_completed("evt_1", order.id(), "deposit"))
            .await
            .unwrap();

        // The deposit charge refunded in its entirety
        let outcome = h.reconciler
            .process(&charge_refunded("evt_2", "pi_evt_1", 135_000, 135_000))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Applied(SettlementAction::RefundApplied {
                order_id: order.id(),
                full: true
            })
        );
        let settled = h.store.order(order.id()).await.unwrap();
        assert_eq!(settled.status(), OrderStatus::Cancelled);
        assert_eq!(settled.pricing().refund_amount, Some(aud(135_000)));
        assert_eq!(h.store.party(party.id).await.unwrap().status, PartyStatus::Cancelled);

        let invoices = h.store.invoices().await;
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].voided_at, Some(now()));
    }

    #[tokio::test]
    async fn test_full_refund_after_completion_voids_both_invoices() {
        let h = harness();
        let (order, party) = seed_booking(&h.store).await;
        h.reconciler
            .process(&checkout_completed("evt_1", order.id(), "deposit"))
            .await
            .unwrap();
        h.reconciler
            .process(&checkout_completed("evt_2", order.id(), "full_payment"))
            .await
            .unwrap();

        let outcome = h.reconciler
            .process(&charge_refunded("evt_3", "pi_evt_2", 450_000, 450_000))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Applied(SettlementAction::RefundApplied {
                order_id: order.id(),
                full: true
            })
        );
        let settled = h.store.order(order.id()).await.unwrap();
        assert_eq!(settled.status(), OrderStatus::Cancelled);
        assert_eq!(settled.pricing().refund_amount, Some(aud(450_000)));
        // A completed party has already happened; it cannot be cancelled
        assert_eq!(h.store.party(party.id).await.unwrap().status, PartyStatus::Completed);

        let invoices = h.store.invoices().await;
        assert_eq!(invoices.len(), 2);
        assert!(invoices.iter().all(|i| i.voided_at == Some(now())));
        // Refunds carry no receipt
        assert_eq!(h.notifier.receipts().await.len(), 2);
    }

    #[tokio::test]
    async fn test_refund_for_unknown_intent_is_logged() {
        let h = harness();
        seed_booking(&h.store).await;

        let outcome = h.reconciler
            .process(&charge_refunded("evt_1", "pi_unknown", 450_000, 450_000))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Logged(SkipReason::UnknownOrder));
    }

    #[tokio::test]
    async fn test_unrecognized_event_type_is_ignored() {
        let h = harness();
        let body = json!({
            "id": "evt_1",
            "type": "customer.subscription.updated",
            "data": { "object": {} }
        });
        let event = GatewayEvent::from_json(body.to_string().as_bytes()).unwrap();

        let outcome = h.reconciler.process(&event).await.unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Logged(SkipReason::UnrecognizedEvent)
        );
    }

    #[tokio::test]
    async fn test_store_outage_propagates_as_error() {
        let h = harness();
        let (order, _) = seed_booking(&h.store).await;
        h.store.fail_with(PortError::connection("connection refused")).await;

        let err = h.reconciler
            .process(&checkout_completed("evt_1", order.id(), "deposit"))
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::Transient(_)));
    }

    #[tokio::test]
    async fn test_receipt_failure_does_not_undo_settlement() {
        let h = harness();
        let (order, _) = seed_booking(&h.store).await;
        h.notifier.set_failing(true).await;

        let outcome = h.reconciler
            .process(&checkout_completed("evt_1", order.id(), "deposit"))
            .await
            .unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Applied(_)));
        assert!(h.store.is_event_processed("evt_1").await.unwrap());
        assert!(h.notifier.receipts().await.is_empty());
    }

    #[tokio::test]
    async fn test_order_without_party_settles_alone() {
        let h = harness();
        let customer = Customer::new("kim@example.com", "Kim", "0400", Currency::AUD, now());
        let number: OrderNumber = "PP2507-ZZZZZZ".parse().unwrap();
        let package = Package {
            id: "pkg_superhero".to_string(),
            name: "Superhero Spectacular".to_string(),
            price: aud(450_000),
        };
        let mut order = Order::new(
            customer.id,
            None,
            number,
            vec![OrderItem::from(&package)],
            Pricing::from_total(aud(450_000), 30),
            now(),
        );
        order.take_events();
        h.store.insert_customer(customer).await;
        h.store.insert_order(order.clone()).await;

        let outcome = h.reconciler
            .process(&checkout_completed("evt_1", order.id(), "deposit"))
            .await
            .unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Applied(_)));
        assert_eq!(
            h.store.order(order.id()).await.unwrap().status(),
            OrderStatus::Confirmed
        );
    }
}

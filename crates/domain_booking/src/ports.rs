//! Booking Orchestration Ports
//!
//! This module defines the two port interfaces the booking services need
//! from the outside world: durable storage and outbound notifications.
//!
//! # Architecture
//!
//! The `BookingStore` trait is the single coordination point for all
//! booking state. Its two composite operations, [`BookingStore::create_booking`]
//! and [`BookingStore::commit_settlement`], are transactional contracts:
//! implementations must apply them entirely or not at all, because the
//! services above them rely on that atomicity for idempotent webhook
//! replay and for the all-or-nothing intake write.
//!
//! - **Postgres adapter**: transactions over a connection pool (infra_db)
//! - **Memory adapter**: a single write lock over all tables
//!   ([`crate::memory::MemoryBookingStore`])
//!
//! The `NotificationSender` trait covers the five outbound notices. Sends
//! are best-effort at every call site: a failed send is logged and the
//! business flow continues.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_booking::ports::BookingStore;
//! use std::sync::Arc;
//!
//! pub struct CheckoutService {
//!     store: Arc<dyn BookingStore>,
//! }
//!
//! impl CheckoutService {
//!     pub async fn order(&self, id: OrderId) -> Result<Order, PortError> {
//!         self.store.get_order(id).await
//!     }
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{
    Currency, CustomerId, DomainPort, HealthCheckable, Money, OrderId, PartyId, PortError,
};
use domain_billing::{Invoice, InvoiceDraft, PaymentPurpose};
use domain_orders::{Activity, Order, Package};
use domain_party::{Customer, Party, SafetyChecklist};

// ============================================================================
// Storage Port
// ============================================================================

/// The atomic unit written at intake
///
/// The customer row already exists (upserted beforehand). The store bumps
/// its aggregate counters relative to the stored row, from the order's
/// total and the party's date, together with the three new rows.
#[derive(Debug, Clone)]
pub struct NewBooking {
    /// Customer as upserted; the store applies the booking counters
    pub customer: Customer,
    /// The scheduled party, status `inquiry`
    pub party: Party,
    /// The order, status `new`
    pub order: Order,
    /// Safety snapshot linking the two
    pub checklist: SafetyChecklist,
}

/// The atomic unit written when a webhook settles
///
/// Everything a single gateway event changes: the mutated order, an
/// optional party transition, an optional new invoice, and optionally the
/// voiding of the order's existing invoices. The `event_id` is the
/// idempotency mark; implementations must refuse the whole update if the
/// event was already recorded.
#[derive(Debug, Clone)]
pub struct SettlementUpdate {
    /// Gateway event id, recorded as processed with the mutation
    pub event_id: String,
    /// Instant the event was applied; stamps voided invoices
    pub processed_at: DateTime<Utc>,
    /// Order aggregate after its transition
    pub order: Order,
    /// Party after its transition, when the event moved it
    pub party: Option<Party>,
    /// Invoice to number and create, for payment settlements
    pub invoice: Option<InvoiceDraft>,
    /// Void all existing invoices of this order (full refund)
    pub void_invoices: bool,
}

/// Result of attempting to commit a settlement
#[derive(Debug, Clone)]
pub enum SettlementCommit {
    /// The update was applied; carries the created invoice, if any
    Applied { invoice: Option<Invoice> },
    /// The event id was already recorded; nothing changed
    AlreadyProcessed,
}

/// Port for all durable booking state
#[async_trait]
pub trait BookingStore: DomainPort + HealthCheckable {
    // ========================================================================
    // Customers
    // ========================================================================

    /// Fetches the customer for the email or creates one, atomically
    ///
    /// The email is normalized before matching. Concurrent calls with the
    /// same email must converge on one row.
    ///
    /// # Arguments
    ///
    /// * `email` - Contact email, matched case-insensitively
    /// * `name` - Parent name, used when creating
    /// * `phone` - Contact phone, used when creating
    /// * `currency` - Currency for the zeroed spend aggregate
    /// * `now` - Creation timestamp
    async fn upsert_customer(
        &self,
        email: &str,
        name: &str,
        phone: &str,
        currency: Currency,
        now: DateTime<Utc>,
    ) -> Result<Customer, PortError>;

    /// Fetches a customer by id
    async fn get_customer(&self, id: CustomerId) -> Result<Customer, PortError>;

    // ========================================================================
    // Intake
    // ========================================================================

    /// Persists a booking as one atomic unit
    ///
    /// Bumps the customer's booking counters in the same unit of work,
    /// relative to the stored row rather than the snapshot in `booking`.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate { field: "order_number" }` when the generated
    /// order number is already taken; callers regenerate and retry
    async fn create_booking(&self, booking: &NewBooking) -> Result<(), PortError>;

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Looks up a package by its catalog id
    async fn get_package(&self, id: &str) -> Result<Option<Package>, PortError>;

    /// Looks up activities by catalog id; unknown ids are simply absent
    async fn find_activities(&self, ids: &[String]) -> Result<Vec<Activity>, PortError>;

    // ========================================================================
    // Settlement
    // ========================================================================

    /// Fetches an order by id
    async fn get_order(&self, id: OrderId) -> Result<Order, PortError>;

    /// Fetches a party by id
    async fn get_party(&self, id: PartyId) -> Result<Party, PortError>;

    /// Finds the order whose latest payment intent matches
    async fn find_order_by_payment_intent(
        &self,
        payment_intent: &str,
    ) -> Result<Option<Order>, PortError>;

    /// Returns all invoices for an order, oldest first
    async fn invoices_for_order(&self, id: OrderId) -> Result<Vec<Invoice>, PortError>;

    /// Returns whether a gateway event id has already been applied
    ///
    /// Fast-path read; [`BookingStore::commit_settlement`] re-checks
    /// atomically and remains the authority under races.
    async fn is_event_processed(&self, event_id: &str) -> Result<bool, PortError>;

    /// Applies a settlement and its idempotency mark in one transaction
    ///
    /// Assigns the next per-year invoice number when the update carries an
    /// invoice draft. Returns `AlreadyProcessed` if the event id was
    /// recorded by a concurrent or earlier delivery.
    async fn commit_settlement(
        &self,
        update: &SettlementUpdate,
    ) -> Result<SettlementCommit, PortError>;

    // ========================================================================
    // Scheduler scans
    // ========================================================================

    /// Confirmed parties starting within `[from, to)` with no reminder sent
    async fn parties_needing_reminder(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Party>, PortError>;

    /// Confirmed or completed parties that started within `[from, to)`
    /// with no feedback request sent
    async fn parties_needing_feedback(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Party>, PortError>;

    /// Orders still owing money whose party starts within `[from, to)`
    ///
    /// Owing means status is neither `completed` nor `cancelled`.
    async fn orders_due_for_balance(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<(Order, Party)>, PortError>;

    /// Sets the party's reminder guard so the next scan skips it
    async fn record_reminder_sent(
        &self,
        id: PartyId,
        at: DateTime<Utc>,
    ) -> Result<(), PortError>;

    /// Sets the party's feedback guard so the next scan skips it
    async fn record_feedback_sent(
        &self,
        id: PartyId,
        at: DateTime<Utc>,
    ) -> Result<(), PortError>;
}

// ============================================================================
// Notification Port
// ============================================================================

/// How a best-effort send ended
///
/// Returned alongside business results so callers can see deliverability
/// without it ever failing the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationOutcome {
    /// The sender accepted the notice
    Sent,
    /// The send failed; logged, never fatal
    Failed,
}

/// Booking confirmation, sent right after intake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmationNotice {
    pub to: String,
    pub parent_name: String,
    pub order_number: String,
    pub party_date: NaiveDate,
    pub venue: String,
    pub total: Money,
    pub deposit: Money,
}

/// Payment receipt, sent after each settled installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceiptNotice {
    pub to: String,
    pub invoice_number: String,
    pub amount: Money,
    pub purpose: PaymentPurpose,
}

/// Day-before party reminder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyReminderNotice {
    pub to: String,
    pub parent_name: String,
    pub party_date: NaiveDate,
    pub start_time: NaiveTime,
    pub venue: String,
}

/// Post-event feedback request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequestNotice {
    pub to: String,
    pub parent_name: String,
    pub child_name: String,
}

/// Outstanding balance reminder ahead of the party
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceDueNotice {
    pub to: String,
    pub parent_name: String,
    pub order_number: String,
    pub outstanding: Money,
    pub due_date: NaiveDate,
}

/// Port for outbound customer notifications
#[async_trait]
pub trait NotificationSender: DomainPort + HealthCheckable {
    /// Sends the post-intake booking confirmation
    async fn send_booking_confirmation(
        &self,
        notice: &BookingConfirmationNotice,
    ) -> Result<(), PortError>;

    /// Sends a receipt for a settled payment
    async fn send_payment_receipt(&self, notice: &PaymentReceiptNotice)
        -> Result<(), PortError>;

    /// Sends the day-before party reminder
    async fn send_party_reminder(&self, notice: &PartyReminderNotice) -> Result<(), PortError>;

    /// Sends the post-event feedback request
    async fn send_feedback_request(
        &self,
        notice: &FeedbackRequestNotice,
    ) -> Result<(), PortError>;

    /// Sends the outstanding balance reminder
    async fn send_balance_due(&self, notice: &BalanceDueNotice) -> Result<(), PortError>;
}

/// Mock implementation of NotificationSender for testing
///
/// Records every notice by channel and can be scripted to fail, so the
/// best-effort contract of each service is testable.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::{AdapterHealth, HealthCheckResult};

    /// In-memory mock implementation of NotificationSender
    #[derive(Debug, Default)]
    pub struct MockNotificationSender {
        confirmations: Arc<RwLock<Vec<BookingConfirmationNotice>>>,
        receipts: Arc<RwLock<Vec<PaymentReceiptNotice>>>,
        reminders: Arc<RwLock<Vec<PartyReminderNotice>>>,
        feedback_requests: Arc<RwLock<Vec<FeedbackRequestNotice>>>,
        balance_notices: Arc<RwLock<Vec<BalanceDueNotice>>>,
        failing: Arc<RwLock<bool>>,
    }

    impl MockNotificationSender {
        /// Creates a new mock sender
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every send fail until switched back
        pub async fn set_failing(&self, failing: bool) {
            *self.failing.write().await = failing;
        }

        pub async fn confirmations(&self) -> Vec<BookingConfirmationNotice> {
            self.confirmations.read().await.clone()
        }

        pub async fn receipts(&self) -> Vec<PaymentReceiptNotice> {
            self.receipts.read().await.clone()
        }

        pub async fn reminders(&self) -> Vec<PartyReminderNotice> {
            self.reminders.read().await.clone()
        }

        pub async fn feedback_requests(&self) -> Vec<FeedbackRequestNotice> {
            self.feedback_requests.read().await.clone()
        }

        pub async fn balance_notices(&self) -> Vec<BalanceDueNotice> {
            self.balance_notices.read().await.clone()
        }

        async fn deliver<T: Clone>(
            &self,
            sink: &RwLock<Vec<T>>,
            notice: &T,
        ) -> Result<(), PortError> {
            if *self.failing.read().await {
                return Err(PortError::ServiceUnavailable {
                    service: "notification-sender".to_string(),
                });
            }
            sink.write().await.push(notice.clone());
            Ok(())
        }
    }

    impl DomainPort for MockNotificationSender {}

    #[async_trait]
    impl HealthCheckable for MockNotificationSender {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "mock-notification-sender".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("Mock adapter always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl NotificationSender for MockNotificationSender {
        async fn send_booking_confirmation(
            &self,
            notice: &BookingConfirmationNotice,
        ) -> Result<(), PortError> {
            self.deliver(&self.confirmations, notice).await
        }

        async fn send_payment_receipt(
            &self,
            notice: &PaymentReceiptNotice,
        ) -> Result<(), PortError> {
            self.deliver(&self.receipts, notice).await
        }

        async fn send_party_reminder(
            &self,
            notice: &PartyReminderNotice,
        ) -> Result<(), PortError> {
            self.deliver(&self.reminders, notice).await
        }

        async fn send_feedback_request(
            &self,
            notice: &FeedbackRequestNotice,
        ) -> Result<(), PortError> {
            self.deliver(&self.feedback_requests, notice).await
        }

        async fn send_balance_due(&self, notice: &BalanceDueNotice) -> Result<(), PortError> {
            self.deliver(&self.balance_notices, notice).await
        }
    }
}

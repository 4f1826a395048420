//! In-memory booking store
//!
//! Backs service and integration tests without a database. All tables live
//! behind one write lock, which makes the composite operations atomic the
//! same way the Postgres adapter's transactions do. Failure scripting lets
//! tests exercise the retry and abort paths of the services.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use tokio::sync::RwLock;

use core_kernel::{
    AdapterHealth, Currency, CustomerId, DomainPort, HealthCheckResult, HealthCheckable,
    InvoiceId, OrderId, PartyId, PortError,
};
use domain_billing::{Invoice, InvoiceNumber};
use domain_orders::{Activity, Order, OrderStatus, Package};
use domain_party::{normalize_email, Customer, Party, PartyStatus, SafetyChecklist};

use crate::ports::{BookingStore, NewBooking, SettlementCommit, SettlementUpdate};

#[derive(Default)]
struct Inner {
    customers: HashMap<CustomerId, Customer>,
    parties: HashMap<PartyId, Party>,
    orders: HashMap<OrderId, Order>,
    checklists: Vec<SafetyChecklist>,
    invoices: Vec<Invoice>,
    packages: HashMap<String, Package>,
    activities: HashMap<String, Activity>,
    invoice_counters: BTreeMap<i32, u32>,
    processed_events: HashSet<String>,
    order_numbers: HashSet<String>,
    reject_bookings: u32,
}

/// In-memory implementation of [`BookingStore`]
#[derive(Default)]
pub struct MemoryBookingStore {
    inner: Arc<RwLock<Inner>>,
    fail_next: Arc<RwLock<Option<PortError>>>,
}

impl MemoryBookingStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with a catalog
    pub fn with_catalog(packages: Vec<Package>, activities: Vec<Activity>) -> Self {
        let mut inner = Inner::default();
        for package in packages {
            inner.packages.insert(package.id.clone(), package);
        }
        for activity in activities {
            inner.activities.insert(activity.id.clone(), activity);
        }
        Self {
            inner: Arc::new(RwLock::new(inner)),
            fail_next: Arc::default(),
        }
    }

    /// Makes the next store call fail with the given error
    pub async fn fail_with(&self, error: PortError) {
        *self.fail_next.write().await = Some(error);
    }

    /// Makes the next `count` booking writes report a duplicate order number
    pub async fn reject_next_bookings(&self, count: u32) {
        self.inner.write().await.reject_bookings = count;
    }

    pub async fn insert_customer(&self, customer: Customer) {
        self.inner.write().await.customers.insert(customer.id, customer);
    }

    pub async fn insert_party(&self, party: Party) {
        self.inner.write().await.parties.insert(party.id, party);
    }

    pub async fn insert_order(&self, order: Order) {
        let mut inner = self.inner.write().await;
        inner.order_numbers.insert(order.order_number().to_string());
        inner.orders.insert(order.id(), order);
    }

    /// Seeds an invoice, keeping the per-year counter ahead of its sequence
    pub async fn insert_invoice(&self, invoice: Invoice) {
        let mut inner = self.inner.write().await;
        let year = invoice.invoice_number.year();
        let sequence = invoice.invoice_number.sequence();
        let counter = inner.invoice_counters.entry(year).or_insert(0);
        *counter = (*counter).max(sequence);
        inner.invoices.push(invoice);
    }

    pub async fn order(&self, id: OrderId) -> Option<Order> {
        self.inner.read().await.orders.get(&id).cloned()
    }

    pub async fn party(&self, id: PartyId) -> Option<Party> {
        self.inner.read().await.parties.get(&id).cloned()
    }

    pub async fn customers(&self) -> Vec<Customer> {
        self.inner.read().await.customers.values().cloned().collect()
    }

    pub async fn invoices(&self) -> Vec<Invoice> {
        self.inner.read().await.invoices.clone()
    }

    pub async fn checklists(&self) -> Vec<SafetyChecklist> {
        self.inner.read().await.checklists.clone()
    }

    async fn scripted_failure(&self) -> Result<(), PortError> {
        match self.fail_next.write().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl DomainPort for MemoryBookingStore {}

#[async_trait]
impl HealthCheckable for MemoryBookingStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "memory-booking-store".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: Some("Mock adapter always healthy".to_string()),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn upsert_customer(
        &self,
        email: &str,
        name: &str,
        phone: &str,
        currency: Currency,
        now: DateTime<Utc>,
    ) -> Result<Customer, PortError> {
        self.scripted_failure().await?;
        let mut inner = self.inner.write().await;
        let key = normalize_email(email);
        if let Some(existing) = inner.customers.values().find(|c| c.email == key) {
            return Ok(existing.clone());
        }
        let customer = Customer::new(email, name, phone, currency, now);
        inner.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Customer, PortError> {
        self.scripted_failure().await?;
        self.inner
            .read()
            .await
            .customers
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Customer", id))
    }

    async fn create_booking(&self, booking: &NewBooking) -> Result<(), PortError> {
        self.scripted_failure().await?;
        let mut inner = self.inner.write().await;
        if inner.reject_bookings > 0 {
            inner.reject_bookings -= 1;
            return Err(PortError::duplicate("order_number"));
        }
        let number = booking.order.order_number().to_string();
        if inner.order_numbers.contains(&number) {
            return Err(PortError::duplicate("order_number"));
        }
        // Counters are bumped on the stored row, not copied from the
        // caller's snapshot; interleaved bookings for one customer both
        // count.
        let customer = inner
            .customers
            .entry(booking.customer.id)
            .or_insert_with(|| booking.customer.clone());
        customer
            .record_booking(
                booking.order.pricing().total,
                booking.party.date,
                booking.order.created_at(),
            )
            .map_err(|err| PortError::validation(err.to_string()))?;
        inner.order_numbers.insert(number);
        inner.parties.insert(booking.party.id, booking.party.clone());
        inner.orders.insert(booking.order.id(), booking.order.clone());
        inner.checklists.push(booking.checklist.clone());
        Ok(())
    }

    async fn get_package(&self, id: &str) -> Result<Option<Package>, PortError> {
        self.scripted_failure().await?;
        Ok(self.inner.read().await.packages.get(id).cloned())
    }

    async fn find_activities(&self, ids: &[String]) -> Result<Vec<Activity>, PortError> {
        self.scripted_failure().await?;
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.activities.get(id).cloned())
            .collect())
    }

    async fn get_order(&self, id: OrderId) -> Result<Order, PortError> {
        self.scripted_failure().await?;
        self.inner
            .read()
            .await
            .orders
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Order", id))
    }

    async fn get_party(&self, id: PartyId) -> Result<Party, PortError> {
        self.scripted_failure().await?;
        self.inner
            .read()
            .await
            .parties
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Party", id))
    }

    async fn find_order_by_payment_intent(
        &self,
        payment_intent: &str,
    ) -> Result<Option<Order>, PortError> {
        self.scripted_failure().await?;
        Ok(self
            .inner
            .read()
            .await
            .orders
            .values()
            .find(|o| o.pricing().payment_intent_id.as_deref() == Some(payment_intent))
            .cloned())
    }

    async fn invoices_for_order(&self, id: OrderId) -> Result<Vec<Invoice>, PortError> {
        self.scripted_failure().await?;
        Ok(self
            .inner
            .read()
            .await
            .invoices
            .iter()
            .filter(|i| i.order_id == id)
            .cloned()
            .collect())
    }

    async fn is_event_processed(&self, event_id: &str) -> Result<bool, PortError> {
        self.scripted_failure().await?;
        Ok(self.inner.read().await.processed_events.contains(event_id))
    }

    async fn commit_settlement(
        &self,
        update: &SettlementUpdate,
    ) -> Result<SettlementCommit, PortError> {
        self.scripted_failure().await?;
        let mut inner = self.inner.write().await;
        if !inner.processed_events.insert(update.event_id.clone()) {
            return Ok(SettlementCommit::AlreadyProcessed);
        }
        inner.orders.insert(update.order.id(), update.order.clone());
        if let Some(party) = &update.party {
            inner.parties.insert(party.id, party.clone());
        }
        if update.void_invoices {
            let order_id = update.order.id();
            for invoice in inner.invoices.iter_mut().filter(|i| i.order_id == order_id) {
                // Seeded test data may already be void; skip rather than fail
                let _ = invoice.void(update.processed_at);
            }
        }
        let invoice = match &update.invoice {
            Some(draft) => {
                let year = draft.issued_at.year();
                let counter = inner.invoice_counters.entry(year).or_insert(0);
                *counter += 1;
                let number = InvoiceNumber::from_parts(year, *counter);
                let invoice = draft.clone().into_invoice(InvoiceId::new(), number);
                inner.invoices.push(invoice.clone());
                Some(invoice)
            }
            None => None,
        };
        Ok(SettlementCommit::Applied { invoice })
    }

    async fn parties_needing_reminder(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Party>, PortError> {
        self.scripted_failure().await?;
        let inner = self.inner.read().await;
        let mut due: Vec<Party> = inner
            .parties
            .values()
            .filter(|p| {
                p.status == PartyStatus::Confirmed
                    && p.reminder_sent_at.is_none()
                    && p.starts_at >= from
                    && p.starts_at < to
            })
            .cloned()
            .collect();
        due.sort_by_key(|p| p.starts_at);
        Ok(due)
    }

    async fn parties_needing_feedback(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Party>, PortError> {
        self.scripted_failure().await?;
        let inner = self.inner.read().await;
        let mut due: Vec<Party> = inner
            .parties
            .values()
            .filter(|p| {
                matches!(p.status, PartyStatus::Confirmed | PartyStatus::Completed)
                    && p.feedback_sent_at.is_none()
                    && p.starts_at >= from
                    && p.starts_at < to
            })
            .cloned()
            .collect();
        due.sort_by_key(|p| p.starts_at);
        Ok(due)
    }

    async fn orders_due_for_balance(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<(Order, Party)>, PortError> {
        self.scripted_failure().await?;
        let inner = self.inner.read().await;
        let mut due: Vec<(Order, Party)> = inner
            .orders
            .values()
            .filter(|o| {
                !matches!(o.status(), OrderStatus::Completed | OrderStatus::Cancelled)
            })
            .filter_map(|o| {
                let party = inner.parties.get(&o.party_id()?)?;
                (party.starts_at >= from && party.starts_at < to)
                    .then(|| (o.clone(), party.clone()))
            })
            .collect();
        due.sort_by_key(|(_, p)| p.starts_at);
        Ok(due)
    }

    async fn record_reminder_sent(
        &self,
        id: PartyId,
        at: DateTime<Utc>,
    ) -> Result<(), PortError> {
        self.scripted_failure().await?;
        let mut inner = self.inner.write().await;
        let party = inner
            .parties
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("Party", id))?;
        party.mark_reminder_sent(at);
        Ok(())
    }

    async fn record_feedback_sent(
        &self,
        id: PartyId,
        at: DateTime<Utc>,
    ) -> Result<(), PortError> {
        self.scripted_failure().await?;
        let mut inner = self.inner.write().await;
        let party = inner
            .parties
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("Party", id))?;
        party.mark_feedback_sent(at);
        Ok(())
    }
}

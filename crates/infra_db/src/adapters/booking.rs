//! PostgreSQL Booking Store Adapter
//!
//! This module provides the database adapter for the booking domain,
//! implementing the `BookingStore` trait using PostgreSQL via the
//! `BookingRepository`.
//!
//! # Overview
//!
//! The `PostgresBookingStore` serves as the bridge between the domain
//! layer's port interface and the database layer. It:
//!
//! - Translates domain aggregates into repository row types and back
//! - Maps enum statuses and money through their storage representations
//! - Handles error translation between database and port errors
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresBookingStore;
//! use domain_booking::BookingStore;
//! use std::sync::Arc;
//!
//! let store = PostgresBookingStore::new(pool);
//! let port: Arc<dyn BookingStore> = Arc::new(store);
//! let order = port.get_order(order_id).await?;
//! ```

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, Currency, CustomerId, DomainPort, HealthCheckResult, HealthCheckable,
    InvoiceId, Money, OrderId, PartyId, PortError,
};
use domain_billing::{Invoice, LineItem};
use domain_booking::{BookingStore, NewBooking, SettlementCommit, SettlementUpdate};
use domain_orders::{Activity, Order, OrderItem, Package};
use domain_party::{ChildInfo, Customer, Party, SafetyChecklist};

use crate::error::DatabaseError;
use crate::repositories::booking::{
    BookingRepository, CatalogRow, ChecklistRow, CommitOutcome, CustomerRow, InvoiceRow,
    NewInvoiceRow, OrderRow, PartyRow,
};

/// PostgreSQL-backed implementation of the BookingStore trait
///
/// This adapter uses the `BookingRepository` for all database operations
/// and provides the standard durable implementation of the booking
/// domain port.
///
/// # Health Checking
///
/// The adapter implements `HealthCheckable` to verify database
/// connectivity. Health checks perform a simple query to ensure the
/// connection pool is operational.
///
/// # Error Handling
///
/// Database errors are translated to `PortError` variants:
/// - `DatabaseError::DuplicateEntry` -> `PortError::Duplicate` with the
///   violated column as the field
/// - `DatabaseError::ConnectionFailed` / `PoolExhausted` ->
///   `PortError::Connection`
/// - Other errors -> `PortError::Internal`
#[derive(Debug, Clone)]
pub struct PostgresBookingStore {
    repository: BookingRepository,
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Creates a new PostgreSQL booking store
    ///
    /// # Arguments
    ///
    /// * `pool` - The PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: BookingRepository::new(pool.clone()),
            pool,
        }
    }

    /// Returns a reference to the underlying repository
    ///
    /// This is useful for operations that aren't exposed through the port
    /// trait, such as direct SQL queries or bulk operations.
    pub fn repository(&self) -> &BookingRepository {
        &self.repository
    }
}

// Mark as a domain port
impl DomainPort for PostgresBookingStore {}

#[async_trait]
impl HealthCheckable for PostgresBookingStore {
    /// Checks database connectivity
    ///
    /// Performs a simple SELECT 1 query to verify the connection pool
    /// is operational and the database is responsive.
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: "postgres-booking-store".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: "postgres-booking-store".to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl BookingStore for PostgresBookingStore {
    #[instrument(skip(self, email, name, phone))]
    async fn upsert_customer(
        &self,
        email: &str,
        name: &str,
        phone: &str,
        currency: Currency,
        now: DateTime<Utc>,
    ) -> Result<Customer, PortError> {
        debug!("Upserting customer by email");

        // Candidate row; the upsert keeps the existing row when the
        // normalized email is already taken.
        let candidate = Customer::new(email, name, phone, currency, now);
        let row = self
            .repository
            .upsert_customer(&customer_to_row(&candidate))
            .await
            .map_err(db_to_port_error)?;

        row_to_customer(row)
    }

    #[instrument(skip(self), fields(customer_id = %id))]
    async fn get_customer(&self, id: CustomerId) -> Result<Customer, PortError> {
        debug!("Fetching customer by ID");

        let row = self
            .repository
            .get_customer(*id.as_uuid())
            .await
            .map_err(db_to_port_error)?
            .ok_or_else(|| PortError::not_found("Customer", id))?;

        row_to_customer(row)
    }

    #[instrument(
        skip(self, booking),
        fields(order_id = %booking.order.id(), order_number = %booking.order.order_number())
    )]
    async fn create_booking(&self, booking: &NewBooking) -> Result<(), PortError> {
        debug!("Persisting booking");

        let order = order_to_row(&booking.order)?;
        self.repository
            .insert_booking(
                &customer_to_row(&booking.customer),
                &party_to_row(&booking.party),
                &order,
                &checklist_to_row(&booking.checklist),
            )
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self))]
    async fn get_package(&self, id: &str) -> Result<Option<Package>, PortError> {
        debug!("Looking up package");

        let row = self
            .repository
            .get_package(id)
            .await
            .map_err(db_to_port_error)?;

        row.map(row_to_package).transpose()
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn find_activities(&self, ids: &[String]) -> Result<Vec<Activity>, PortError> {
        debug!("Looking up activities");

        let rows = self
            .repository
            .find_activities(ids)
            .await
            .map_err(db_to_port_error)?;

        // Callers see activities in request order; ANY($1) returns
        // storage order.
        let mut by_id: HashMap<String, CatalogRow> =
            rows.into_iter().map(|r| (r.id.clone(), r)).collect();
        ids.iter()
            .filter_map(|id| by_id.remove(id))
            .map(row_to_activity)
            .collect()
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn get_order(&self, id: OrderId) -> Result<Order, PortError> {
        debug!("Fetching order by ID");

        let row = self
            .repository
            .get_order(*id.as_uuid())
            .await
            .map_err(db_to_port_error)?
            .ok_or_else(|| PortError::not_found("Order", id))?;

        row_to_order(row)
    }

    #[instrument(skip(self), fields(party_id = %id))]
    async fn get_party(&self, id: PartyId) -> Result<Party, PortError> {
        debug!("Fetching party by ID");

        let row = self
            .repository
            .get_party(*id.as_uuid())
            .await
            .map_err(db_to_port_error)?
            .ok_or_else(|| PortError::not_found("Party", id))?;

        row_to_party(row)
    }

    #[instrument(skip(self))]
    async fn find_order_by_payment_intent(
        &self,
        payment_intent: &str,
    ) -> Result<Option<Order>, PortError> {
        debug!("Finding order by payment intent");

        let row = self
            .repository
            .find_order_by_payment_intent(payment_intent)
            .await
            .map_err(db_to_port_error)?;

        row.map(row_to_order).transpose()
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn invoices_for_order(&self, id: OrderId) -> Result<Vec<Invoice>, PortError> {
        debug!("Fetching invoices for order");

        let rows = self
            .repository
            .invoices_for_order(*id.as_uuid())
            .await
            .map_err(db_to_port_error)?;

        rows.into_iter().map(row_to_invoice).collect()
    }

    #[instrument(skip(self))]
    async fn is_event_processed(&self, event_id: &str) -> Result<bool, PortError> {
        debug!("Checking event ledger");

        self.repository
            .is_event_processed(event_id)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(
        skip(self, update),
        fields(event_id = %update.event_id, order_id = %update.order.id())
    )]
    async fn commit_settlement(
        &self,
        update: &SettlementUpdate,
    ) -> Result<SettlementCommit, PortError> {
        debug!("Committing settlement");

        let order = order_to_row(&update.order)?;
        let party = update.party.as_ref().map(party_to_row);
        let invoice = match &update.invoice {
            Some(draft) => Some(NewInvoiceRow {
                id: InvoiceId::new().into(),
                order_id: draft.order_id.into(),
                customer_id: draft.customer_id.into(),
                invoice_type: draft.invoice_type.as_str().to_string(),
                line_items: serde_json::to_value(&draft.line_items)
                    .map_err(|e| PortError::internal(format!("line items encode: {}", e)))?,
                total: draft.total.amount_minor(),
                currency: draft.total.currency().code().to_string(),
                issued_at: draft.issued_at,
            }),
            None => None,
        };

        let outcome = self
            .repository
            .commit_settlement(
                &update.event_id,
                update.processed_at,
                &order,
                party.as_ref(),
                invoice.as_ref(),
                update.void_invoices,
            )
            .await
            .map_err(db_to_port_error)?;

        match outcome {
            CommitOutcome::Applied(Some(row)) => Ok(SettlementCommit::Applied {
                invoice: Some(row_to_invoice(row)?),
            }),
            CommitOutcome::Applied(None) => Ok(SettlementCommit::Applied { invoice: None }),
            CommitOutcome::AlreadyProcessed => Ok(SettlementCommit::AlreadyProcessed),
        }
    }

    #[instrument(skip(self))]
    async fn parties_needing_reminder(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Party>, PortError> {
        debug!("Scanning for reminder-due parties");

        let rows = self
            .repository
            .parties_needing_reminder(from, to)
            .await
            .map_err(db_to_port_error)?;

        rows.into_iter().map(row_to_party).collect()
    }

    #[instrument(skip(self))]
    async fn parties_needing_feedback(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Party>, PortError> {
        debug!("Scanning for feedback-due parties");

        let rows = self
            .repository
            .parties_needing_feedback(from, to)
            .await
            .map_err(db_to_port_error)?;

        rows.into_iter().map(row_to_party).collect()
    }

    #[instrument(skip(self))]
    async fn orders_due_for_balance(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<(Order, Party)>, PortError> {
        debug!("Scanning for balance-due orders");

        let party_rows = self
            .repository
            .parties_in_window(from, to)
            .await
            .map_err(db_to_port_error)?;
        if party_rows.is_empty() {
            return Ok(Vec::new());
        }

        let party_ids: Vec<_> = party_rows.iter().map(|p| p.id).collect();
        let order_rows = self
            .repository
            .owing_orders_for_parties(&party_ids)
            .await
            .map_err(db_to_port_error)?;

        let mut parties: HashMap<_, _> = HashMap::new();
        for row in party_rows {
            parties.insert(row.id, row_to_party(row)?);
        }

        let mut due = Vec::with_capacity(order_rows.len());
        for row in order_rows {
            let Some(party_id) = row.party_id else { continue };
            let Some(party) = parties.get(&party_id) else { continue };
            due.push((row_to_order(row)?, party.clone()));
        }
        due.sort_by_key(|(_, p)| p.starts_at);

        Ok(due)
    }

    #[instrument(skip(self), fields(party_id = %id))]
    async fn record_reminder_sent(
        &self,
        id: PartyId,
        at: DateTime<Utc>,
    ) -> Result<(), PortError> {
        debug!("Marking reminder sent");

        match self.repository.record_reminder_sent(*id.as_uuid(), at).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Err(PortError::not_found("Party", id)),
            Err(e) => Err(db_to_port_error(e)),
        }
    }

    #[instrument(skip(self), fields(party_id = %id))]
    async fn record_feedback_sent(
        &self,
        id: PartyId,
        at: DateTime<Utc>,
    ) -> Result<(), PortError> {
        debug!("Marking feedback sent");

        match self.repository.record_feedback_sent(*id.as_uuid(), at).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Err(PortError::not_found("Party", id)),
            Err(e) => Err(db_to_port_error(e)),
        }
    }
}

// =============================================================================
// Error Translation
// =============================================================================

/// Converts a database error to a port error
fn db_to_port_error(e: DatabaseError) -> PortError {
    match e {
        DatabaseError::DuplicateEntry { constraint } => {
            PortError::duplicate(constraint_to_field(&constraint))
        }
        DatabaseError::ConnectionFailed(message) => PortError::connection(message),
        DatabaseError::PoolExhausted => PortError::connection("connection pool exhausted"),
        other => PortError::internal(other.to_string()),
    }
}

/// Maps a unique constraint name onto the field callers branch on
fn constraint_to_field(constraint: &str) -> &str {
    match constraint {
        "customers_email_key" => "email",
        "orders_order_number_key" => "order_number",
        "invoices_invoice_number_key" => "invoice_number",
        "processed_events_pkey" => "event_id",
        other => other,
    }
}

// =============================================================================
// Conversion Functions: Database -> Domain
// =============================================================================

/// Parses a stored string column into its domain type
fn parse_column<T>(column: &str, value: &str) -> Result<T, PortError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| PortError::internal(format!("stored {} invalid: {}", column, e)))
}

fn row_to_customer(row: CustomerRow) -> Result<Customer, PortError> {
    let currency: Currency = parse_column("customers.currency", &row.currency)?;
    Ok(Customer {
        id: CustomerId::from(row.id),
        email: row.email,
        name: row.name,
        phone: row.phone,
        total_booked: row.total_booked as u32,
        total_spent: Money::from_minor(row.total_spent, currency),
        last_event_date: row.last_event_date,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn row_to_party(row: PartyRow) -> Result<Party, PortError> {
    Ok(Party {
        id: PartyId::from(row.id),
        customer_id: CustomerId::from(row.customer_id),
        status: parse_column("parties.status", &row.status)?,
        date: row.party_date,
        start_time: row.start_time,
        starts_at: row.starts_at,
        venue: row.venue,
        guest_count: row.guest_count as u32,
        child: ChildInfo {
            child_name: row.child_name,
            child_age: row.child_age as u8,
            allergies: row.allergies,
            special_needs: row.special_needs,
        },
        emergency_contact: row.emergency_contact,
        special_requests: row.special_requests,
        reminder_sent_at: row.reminder_sent_at,
        feedback_sent_at: row.feedback_sent_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn row_to_order(row: OrderRow) -> Result<Order, PortError> {
    let currency: Currency = parse_column("orders.currency", &row.currency)?;
    let items: Vec<OrderItem> = serde_json::from_value(row.items)
        .map_err(|e| PortError::internal(format!("stored orders.items invalid: {}", e)))?;

    let pricing = domain_orders::Pricing {
        total: Money::from_minor(row.total, currency),
        deposit: Money::from_minor(row.deposit, currency),
        deposit_paid_at: row.deposit_paid_at,
        paid_at: row.paid_at,
        refunded_at: row.refunded_at,
        refund_amount: row.refund_amount.map(|m| Money::from_minor(m, currency)),
        checkout_session_id: row.checkout_session_id,
        payment_intent_id: row.payment_intent_id,
    };

    Ok(Order::from_parts(
        OrderId::from(row.id),
        parse_column("orders.order_number", &row.order_number)?,
        CustomerId::from(row.customer_id),
        row.party_id.map(PartyId::from),
        parse_column("orders.status", &row.status)?,
        items,
        pricing,
        row.created_at,
        row.updated_at,
    ))
}

fn row_to_invoice(row: InvoiceRow) -> Result<Invoice, PortError> {
    let currency: Currency = parse_column("invoices.currency", &row.currency)?;
    let line_items: Vec<LineItem> = serde_json::from_value(row.line_items)
        .map_err(|e| PortError::internal(format!("stored invoices.line_items invalid: {}", e)))?;

    Ok(Invoice {
        id: InvoiceId::from(row.id),
        invoice_number: parse_column("invoices.invoice_number", &row.invoice_number)?,
        order_id: OrderId::from(row.order_id),
        customer_id: CustomerId::from(row.customer_id),
        invoice_type: parse_column("invoices.invoice_type", &row.invoice_type)?,
        status: parse_column("invoices.status", &row.status)?,
        line_items,
        total: Money::from_minor(row.total, currency),
        issued_at: row.issued_at,
        paid_at: row.paid_at,
        voided_at: row.voided_at,
    })
}

fn row_to_package(row: CatalogRow) -> Result<Package, PortError> {
    let currency: Currency = parse_column("packages.currency", &row.currency)?;
    Ok(Package {
        id: row.id,
        name: row.name,
        price: Money::from_minor(row.price, currency),
    })
}

fn row_to_activity(row: CatalogRow) -> Result<Activity, PortError> {
    let currency: Currency = parse_column("activities.currency", &row.currency)?;
    Ok(Activity {
        id: row.id,
        name: row.name,
        price: Money::from_minor(row.price, currency),
    })
}

// =============================================================================
// Conversion Functions: Domain -> Database
// =============================================================================

fn customer_to_row(customer: &Customer) -> CustomerRow {
    CustomerRow {
        id: customer.id.into(),
        email: customer.email.clone(),
        name: customer.name.clone(),
        phone: customer.phone.clone(),
        total_booked: customer.total_booked as i32,
        total_spent: customer.total_spent.amount_minor(),
        currency: customer.total_spent.currency().code().to_string(),
        last_event_date: customer.last_event_date,
        created_at: customer.created_at,
        updated_at: customer.updated_at,
    }
}

fn party_to_row(party: &Party) -> PartyRow {
    PartyRow {
        id: party.id.into(),
        customer_id: party.customer_id.into(),
        status: party.status.as_str().to_string(),
        party_date: party.date,
        start_time: party.start_time,
        starts_at: party.starts_at,
        venue: party.venue.clone(),
        guest_count: party.guest_count as i32,
        child_name: party.child.child_name.clone(),
        child_age: i16::from(party.child.child_age),
        allergies: party.child.allergies.clone(),
        special_needs: party.child.special_needs.clone(),
        emergency_contact: party.emergency_contact.clone(),
        special_requests: party.special_requests.clone(),
        reminder_sent_at: party.reminder_sent_at,
        feedback_sent_at: party.feedback_sent_at,
        created_at: party.created_at,
        updated_at: party.updated_at,
    }
}

fn order_to_row(order: &Order) -> Result<OrderRow, PortError> {
    let pricing = order.pricing();
    let currency = pricing.total.currency();
    let items = serde_json::to_value(order.items())
        .map_err(|e| PortError::internal(format!("order items encode: {}", e)))?;

    Ok(OrderRow {
        id: order.id().into(),
        order_number: order.order_number().as_str().to_string(),
        customer_id: order.customer_id().into(),
        party_id: order.party_id().map(Into::into),
        status: order.status().as_str().to_string(),
        items,
        total: pricing.total.amount_minor(),
        deposit: pricing.deposit.amount_minor(),
        currency: currency.code().to_string(),
        deposit_paid_at: pricing.deposit_paid_at,
        paid_at: pricing.paid_at,
        refunded_at: pricing.refunded_at,
        refund_amount: pricing.refund_amount.map(|m| m.amount_minor()),
        checkout_session_id: pricing.checkout_session_id.clone(),
        payment_intent_id: pricing.payment_intent_id.clone(),
        created_at: order.created_at(),
        updated_at: order.updated_at(),
    })
}

fn checklist_to_row(checklist: &SafetyChecklist) -> ChecklistRow {
    ChecklistRow {
        id: checklist.id.into(),
        order_id: checklist.order_id.into(),
        party_id: checklist.party_id.into(),
        safety_acknowledged: checklist.safety_acknowledged,
        allergies: checklist.allergies.clone(),
        emergency_contact: checklist.emergency_contact.clone(),
        special_needs: checklist.special_needs.clone(),
        captured_at: checklist.captured_at,
    }
}

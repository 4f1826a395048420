//! Booking repository implementation
//!
//! This module provides database access for the booking aggregates:
//! customers, parties, orders, safety checklists and invoices, plus the
//! processed-event ledger and the per-year invoice counters.
//!
//! All queries use the SQLx runtime API so the crate builds without a
//! live database. The settlement path runs inside a single transaction;
//! see [`BookingRepository::commit_settlement`].

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain_billing::InvoiceNumber;

use crate::error::DatabaseError;

const CUSTOMER_COLUMNS: &str = "id, email, name, phone, total_booked, total_spent, currency, \
     last_event_date, created_at, updated_at";

const PARTY_COLUMNS: &str = "id, customer_id, status, party_date, start_time, starts_at, venue, \
     guest_count, child_name, child_age, allergies, special_needs, emergency_contact, \
     special_requests, reminder_sent_at, feedback_sent_at, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, order_number, customer_id, party_id, status, items, total, \
     deposit, currency, deposit_paid_at, paid_at, refunded_at, refund_amount, \
     checkout_session_id, payment_intent_id, created_at, updated_at";

const INVOICE_COLUMNS: &str = "id, invoice_number, order_id, customer_id, invoice_type, status, \
     line_items, total, currency, issued_at, paid_at, voided_at";

/// Repository for all booking lifecycle data
///
/// The repository speaks in row types; the adapter layer translates rows
/// to and from domain aggregates.
///
/// # Example
///
/// ```rust,ignore
/// use infra_db::repositories::BookingRepository;
///
/// let repo = BookingRepository::new(pool);
/// let order = repo.get_order(order_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    /// Creates a new BookingRepository with the given connection pool
    ///
    /// # Arguments
    ///
    /// * `pool` - The PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // Customers
    // ========================================================================

    /// Inserts a customer, or returns the existing row for the same email
    ///
    /// The no-op `DO UPDATE` makes `RETURNING` yield the surviving row, so
    /// concurrent calls with the same email converge without a retry loop.
    ///
    /// # Arguments
    ///
    /// * `row` - Candidate row; ignored except for the email when a row
    ///   with that email already exists
    pub async fn upsert_customer(&self, row: &CustomerRow) -> Result<CustomerRow, DatabaseError> {
        let sql = format!(
            "INSERT INTO customers ({CUSTOMER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email \
             RETURNING {CUSTOMER_COLUMNS}"
        );
        let customer = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(row.id)
            .bind(&row.email)
            .bind(&row.name)
            .bind(&row.phone)
            .bind(row.total_booked)
            .bind(row.total_spent)
            .bind(&row.currency)
            .bind(row.last_event_date)
            .bind(row.created_at)
            .bind(row.updated_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Fetches a customer by id
    pub async fn get_customer(&self, id: Uuid) -> Result<Option<CustomerRow>, DatabaseError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");
        let customer = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    // ========================================================================
    // Intake
    // ========================================================================

    /// Persists a booking as one transaction
    ///
    /// Bumps the customer's booking counters, then writes the party, the
    /// order and the safety checklist; any failure rolls back all four. A
    /// duplicate order number surfaces as `DuplicateEntry` with the unique
    /// constraint name.
    ///
    /// # Arguments
    ///
    /// * `customer` - Identifies the upserted customer row; its counter
    ///   fields are ignored
    /// * `party` - The scheduled party
    /// * `order` - The order awaiting its deposit
    /// * `checklist` - Safety snapshot captured at intake
    pub async fn insert_booking(
        &self,
        customer: &CustomerRow,
        party: &PartyRow,
        order: &OrderRow,
        checklist: &ChecklistRow,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // The customer row exists from the preceding upsert. Counters are
        // applied relative to the stored row, so interleaved bookings for
        // the same customer never lose an increment.
        let updated = sqlx::query(
            "UPDATE customers SET \
                 total_booked = customers.total_booked + 1, \
                 total_spent = customers.total_spent + $2, \
                 last_event_date = GREATEST(last_event_date, $3), \
                 updated_at = $4 \
             WHERE id = $1 AND currency = $5",
        )
        .bind(customer.id)
        .bind(order.total)
        .bind(party.party_date)
        .bind(order.created_at)
        .bind(&customer.currency)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Customer", customer.id));
        }

        let sql = format!(
            "INSERT INTO parties ({PARTY_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                     $17, $18)"
        );
        sqlx::query(&sql)
            .bind(party.id)
            .bind(party.customer_id)
            .bind(&party.status)
            .bind(party.party_date)
            .bind(party.start_time)
            .bind(party.starts_at)
            .bind(&party.venue)
            .bind(party.guest_count)
            .bind(&party.child_name)
            .bind(party.child_age)
            .bind(&party.allergies)
            .bind(&party.special_needs)
            .bind(&party.emergency_contact)
            .bind(&party.special_requests)
            .bind(party.reminder_sent_at)
            .bind(party.feedback_sent_at)
            .bind(party.created_at)
            .bind(party.updated_at)
            .execute(&mut *tx)
            .await?;

        let sql = format!(
            "INSERT INTO orders ({ORDER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)"
        );
        sqlx::query(&sql)
            .bind(order.id)
            .bind(&order.order_number)
            .bind(order.customer_id)
            .bind(order.party_id)
            .bind(&order.status)
            .bind(&order.items)
            .bind(order.total)
            .bind(order.deposit)
            .bind(&order.currency)
            .bind(order.deposit_paid_at)
            .bind(order.paid_at)
            .bind(order.refunded_at)
            .bind(order.refund_amount)
            .bind(&order.checkout_session_id)
            .bind(&order.payment_intent_id)
            .bind(order.created_at)
            .bind(order.updated_at)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO safety_checklists (id, order_id, party_id, safety_acknowledged, \
                 allergies, emergency_contact, special_needs, captured_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(checklist.id)
        .bind(checklist.order_id)
        .bind(checklist.party_id)
        .bind(checklist.safety_acknowledged)
        .bind(&checklist.allergies)
        .bind(&checklist.emergency_contact)
        .bind(&checklist.special_needs)
        .bind(checklist.captured_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Looks up a package by catalog id
    pub async fn get_package(&self, id: &str) -> Result<Option<CatalogRow>, DatabaseError> {
        let package =
            sqlx::query_as::<_, CatalogRow>("SELECT id, name, price, currency FROM packages WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(package)
    }

    /// Looks up activities by catalog id; unknown ids are simply absent
    pub async fn find_activities(&self, ids: &[String]) -> Result<Vec<CatalogRow>, DatabaseError> {
        let activities = sqlx::query_as::<_, CatalogRow>(
            "SELECT id, name, price, currency FROM activities WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(activities)
    }

    // ========================================================================
    // Settlement reads
    // ========================================================================

    /// Fetches an order by id
    pub async fn get_order(&self, id: Uuid) -> Result<Option<OrderRow>, DatabaseError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let order = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Fetches a party by id
    pub async fn get_party(&self, id: Uuid) -> Result<Option<PartyRow>, DatabaseError> {
        let sql = format!("SELECT {PARTY_COLUMNS} FROM parties WHERE id = $1");
        let party = sqlx::query_as::<_, PartyRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(party)
    }

    /// Finds the order whose latest payment intent matches
    pub async fn find_order_by_payment_intent(
        &self,
        payment_intent: &str,
    ) -> Result<Option<OrderRow>, DatabaseError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE payment_intent_id = $1");
        let order = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(payment_intent)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Returns all invoices for an order, oldest first
    pub async fn invoices_for_order(&self, order_id: Uuid) -> Result<Vec<InvoiceRow>, DatabaseError> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE order_id = $1 \
             ORDER BY issued_at, invoice_number"
        );
        let invoices = sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(invoices)
    }

    /// Returns whether a gateway event id is already in the ledger
    pub async fn is_event_processed(&self, event_id: &str) -> Result<bool, DatabaseError> {
        let processed = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM processed_events WHERE event_id = $1)",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(processed)
    }

    // ========================================================================
    // Settlement commit
    // ========================================================================

    /// Applies a settlement and its idempotency mark in one transaction
    ///
    /// The event-ledger insert goes first; if the event id is already
    /// present the transaction rolls back untouched and the call reports
    /// `AlreadyProcessed`. Otherwise the order is updated, the party
    /// transition (if any) is written, paid invoices are voided when
    /// requested, and a new invoice is numbered from the per-year counter
    /// and inserted.
    ///
    /// # Arguments
    ///
    /// * `event_id` - Gateway event id being applied
    /// * `processed_at` - Instant the event was applied; stamps the ledger
    ///   row and any voided invoices
    /// * `order` - Order row with post-settlement state
    /// * `party` - Party row with post-settlement state, when the
    ///   settlement moved the party
    /// * `invoice` - Invoice to number and insert, when the settlement
    ///   documents a payment
    /// * `void_invoices` - Whether to void this order's paid invoices
    pub async fn commit_settlement(
        &self,
        event_id: &str,
        processed_at: DateTime<Utc>,
        order: &OrderRow,
        party: Option<&PartyRow>,
        invoice: Option<&NewInvoiceRow>,
        void_invoices: bool,
    ) -> Result<CommitOutcome, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let marked = sqlx::query(
            "INSERT INTO processed_events (event_id, processed_at) VALUES ($1, $2) \
             ON CONFLICT (event_id) DO NOTHING",
        )
        .bind(event_id)
        .bind(processed_at)
        .execute(&mut *tx)
        .await?;

        if marked.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Ok(CommitOutcome::AlreadyProcessed);
        }

        let updated = sqlx::query(
            "UPDATE orders SET status = $2, deposit_paid_at = $3, paid_at = $4, \
                 refunded_at = $5, refund_amount = $6, checkout_session_id = $7, \
                 payment_intent_id = $8, updated_at = $9 \
             WHERE id = $1",
        )
        .bind(order.id)
        .bind(&order.status)
        .bind(order.deposit_paid_at)
        .bind(order.paid_at)
        .bind(order.refunded_at)
        .bind(order.refund_amount)
        .bind(&order.checkout_session_id)
        .bind(&order.payment_intent_id)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Order", order.id));
        }

        if let Some(party) = party {
            sqlx::query("UPDATE parties SET status = $2, updated_at = $3 WHERE id = $1")
                .bind(party.id)
                .bind(&party.status)
                .bind(party.updated_at)
                .execute(&mut *tx)
                .await?;
        }

        if void_invoices {
            sqlx::query(
                "UPDATE invoices SET status = 'void', voided_at = $2 \
                 WHERE order_id = $1 AND status = 'paid'",
            )
            .bind(order.id)
            .bind(processed_at)
            .execute(&mut *tx)
            .await?;
        }

        let inserted = match invoice {
            Some(new_invoice) => {
                let year = new_invoice.issued_at.year();
                let sequence = sqlx::query_scalar::<_, i32>(
                    "INSERT INTO invoice_counters (year, last_seq) VALUES ($1, 1) \
                     ON CONFLICT (year) DO UPDATE SET last_seq = invoice_counters.last_seq + 1 \
                     RETURNING last_seq",
                )
                .bind(year)
                .fetch_one(&mut *tx)
                .await?;

                let number = InvoiceNumber::from_parts(year, sequence as u32).to_string();
                let sql = format!(
                    "INSERT INTO invoices ({INVOICE_COLUMNS}) \
                     VALUES ($1, $2, $3, $4, $5, 'paid', $6, $7, $8, $9, $9, NULL) \
                     RETURNING {INVOICE_COLUMNS}"
                );
                let row = sqlx::query_as::<_, InvoiceRow>(&sql)
                    .bind(new_invoice.id)
                    .bind(&number)
                    .bind(new_invoice.order_id)
                    .bind(new_invoice.customer_id)
                    .bind(&new_invoice.invoice_type)
                    .bind(&new_invoice.line_items)
                    .bind(new_invoice.total)
                    .bind(&new_invoice.currency)
                    .bind(new_invoice.issued_at)
                    .fetch_one(&mut *tx)
                    .await?;

                Some(row)
            }
            None => None,
        };

        tx.commit().await?;
        Ok(CommitOutcome::Applied(inserted))
    }

    // ========================================================================
    // Scheduler scans
    // ========================================================================

    /// Confirmed parties starting within `[from, to)` with no reminder sent
    pub async fn parties_needing_reminder(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PartyRow>, DatabaseError> {
        let sql = format!(
            "SELECT {PARTY_COLUMNS} FROM parties \
             WHERE status = 'confirmed' AND reminder_sent_at IS NULL \
               AND starts_at >= $1 AND starts_at < $2 \
             ORDER BY starts_at"
        );
        let parties = sqlx::query_as::<_, PartyRow>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(parties)
    }

    /// Confirmed or completed parties in `[from, to)` with no feedback sent
    pub async fn parties_needing_feedback(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PartyRow>, DatabaseError> {
        let sql = format!(
            "SELECT {PARTY_COLUMNS} FROM parties \
             WHERE status IN ('confirmed', 'completed') AND feedback_sent_at IS NULL \
               AND starts_at >= $1 AND starts_at < $2 \
             ORDER BY starts_at"
        );
        let parties = sqlx::query_as::<_, PartyRow>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(parties)
    }

    /// Parties starting within `[from, to)`, ordered by start instant
    pub async fn parties_in_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PartyRow>, DatabaseError> {
        let sql = format!(
            "SELECT {PARTY_COLUMNS} FROM parties \
             WHERE starts_at >= $1 AND starts_at < $2 \
             ORDER BY starts_at"
        );
        let parties = sqlx::query_as::<_, PartyRow>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(parties)
    }

    /// Orders still owing money among the given parties
    ///
    /// Owing means the status is neither `completed` nor `cancelled`.
    pub async fn owing_orders_for_parties(
        &self,
        party_ids: &[Uuid],
    ) -> Result<Vec<OrderRow>, DatabaseError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE party_id = ANY($1) AND status NOT IN ('completed', 'cancelled')"
        );
        let orders = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(party_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// Sets the party's reminder guard
    pub async fn record_reminder_sent(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let updated =
            sqlx::query("UPDATE parties SET reminder_sent_at = $2, updated_at = $2 WHERE id = $1")
                .bind(id)
                .bind(at)
                .execute(&self.pool)
                .await?;

        if updated.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Party", id));
        }
        Ok(())
    }

    /// Sets the party's feedback guard
    pub async fn record_feedback_sent(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let updated =
            sqlx::query("UPDATE parties SET feedback_sent_at = $2, updated_at = $2 WHERE id = $1")
                .bind(id)
                .bind(at)
                .execute(&self.pool)
                .await?;

        if updated.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Party", id));
        }
        Ok(())
    }
}

/// Result of a settlement commit attempt
#[derive(Debug)]
pub enum CommitOutcome {
    /// The settlement was applied; carries the inserted invoice, if any
    Applied(Option<InvoiceRow>),
    /// The event id was already in the ledger; nothing changed
    AlreadyProcessed,
}

/// Database row representation of a customer
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub total_booked: i32,
    pub total_spent: i64,
    pub currency: String,
    pub last_event_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row representation of a party
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PartyRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub status: String,
    pub party_date: NaiveDate,
    pub start_time: NaiveTime,
    pub starts_at: DateTime<Utc>,
    pub venue: String,
    pub guest_count: i32,
    pub child_name: String,
    pub child_age: i16,
    pub allergies: Option<String>,
    pub special_needs: Option<String>,
    pub emergency_contact: String,
    pub special_requests: Option<String>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub feedback_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row representation of an order
///
/// `items` is the JSONB catalog snapshot priced at intake.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub party_id: Option<Uuid>,
    pub status: String,
    pub items: serde_json::Value,
    pub total: i64,
    pub deposit: i64,
    pub currency: String,
    pub deposit_paid_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub refund_amount: Option<i64>,
    pub checkout_session_id: Option<String>,
    pub payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row representation of a safety checklist
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChecklistRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub party_id: Uuid,
    pub safety_acknowledged: bool,
    pub allergies: Option<String>,
    pub emergency_contact: String,
    pub special_needs: Option<String>,
    pub captured_at: DateTime<Utc>,
}

/// Database row representation of an invoice
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InvoiceRow {
    pub id: Uuid,
    pub invoice_number: String,
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub invoice_type: String,
    pub status: String,
    pub line_items: serde_json::Value,
    pub total: i64,
    pub currency: String,
    pub issued_at: DateTime<Utc>,
    pub paid_at: DateTime<Utc>,
    pub voided_at: Option<DateTime<Utc>>,
}

/// Data for inserting a new invoice
///
/// The invoice number is assigned inside the settlement transaction, and
/// the row is born paid with `paid_at` equal to `issued_at`.
#[derive(Debug, Clone)]
pub struct NewInvoiceRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub invoice_type: String,
    pub line_items: serde_json::Value,
    pub total: i64,
    pub currency: String,
    pub issued_at: DateTime<Utc>,
}

/// Database row representation of a catalog entry
///
/// Packages and activities share one shape.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CatalogRow {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub currency: String,
}

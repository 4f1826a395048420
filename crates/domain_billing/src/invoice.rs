//! Invoice management
//!
//! Invoices here are receipts, not demands for payment: the reconciler
//! creates one immediately after the gateway confirms a payment, so every
//! invoice is born `paid`. The only later mutation is voiding, which
//! happens when a full refund cancels the order. Invoice numbers are
//! sequential per calendar year and assigned by the store inside the same
//! transaction that records the settlement.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{CustomerId, InvoiceId, Money, OrderId};

use crate::error::BillingError;

/// Which payment an invoice documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceType {
    /// The upfront deposit installment
    Deposit,
    /// The closing balance installment
    Final,
    /// A single payment covering the whole order
    Full,
}

impl InvoiceType {
    /// Returns the lowercase wire and storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceType::Deposit => "deposit",
            InvoiceType::Final => "final",
            InvoiceType::Full => "full",
        }
    }
}

impl fmt::Display for InvoiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InvoiceType {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(InvoiceType::Deposit),
            "final" => Ok(InvoiceType::Final),
            "full" => Ok(InvoiceType::Full),
            other => Err(BillingError::UnknownInvoiceType(other.to_string())),
        }
    }
}

/// Invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Payment received; the state every invoice starts in
    Paid,
    /// Cancelled by a full refund
    Void,
}

impl InvoiceStatus {
    /// Returns the lowercase wire and storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Void => "void",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(InvoiceStatus::Paid),
            "void" => Ok(InvoiceStatus::Void),
            other => Err(BillingError::UnknownStatus(other.to_string())),
        }
    }
}

/// A validated invoice number such as `PP-INV-2025-042`
///
/// Numbers are sequential within a calendar year. The derived ordering is
/// by year, then sequence, which matches issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InvoiceNumber {
    year: i32,
    sequence: u32,
}

impl InvoiceNumber {
    /// Builds an invoice number from the year and its per-year sequence
    pub fn from_parts(year: i32, sequence: u32) -> Self {
        Self { year, sequence }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PP-INV-{:04}-{:03}", self.year, self.sequence)
    }
}

impl FromStr for InvoiceNumber {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || BillingError::MalformedInvoiceNumber(s.to_string());

        let rest = s.strip_prefix("PP-INV-").ok_or_else(malformed)?;
        let (year_part, seq_part) = rest.split_once('-').ok_or_else(malformed)?;
        if year_part.len() != 4 || seq_part.len() < 3 {
            return Err(malformed());
        }

        let year: i32 = year_part.parse().map_err(|_| malformed())?;
        let sequence: u32 = seq_part.parse().map_err(|_| malformed())?;
        Ok(Self { year, sequence })
    }
}

impl From<InvoiceNumber> for String {
    fn from(number: InvoiceNumber) -> Self {
        number.to_string()
    }
}

impl TryFrom<String> for InvoiceNumber {
    type Error = BillingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A line item on an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Description shown on the receipt
    pub description: String,
    /// Amount for this line
    pub amount: Money,
}

impl LineItem {
    /// Creates a new line item
    pub fn new(description: impl Into<String>, amount: Money) -> Self {
        Self {
            description: description.into(),
            amount,
        }
    }
}

/// An invoice awaiting its number
///
/// The reconciler describes what to invoice; the store assigns the id and
/// the per-year sequential number inside the settlement transaction and
/// finishes the invoice with [`InvoiceDraft::into_invoice`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    /// Order whose payment is being documented
    pub order_id: OrderId,
    /// Customer being billed
    pub customer_id: CustomerId,
    /// Which payment this documents
    pub invoice_type: InvoiceType,
    /// Line items
    pub line_items: Vec<LineItem>,
    /// Invoice total
    pub total: Money,
    /// Settlement instant, used as both issue and paid time
    pub issued_at: DateTime<Utc>,
}

impl InvoiceDraft {
    /// Creates a draft invoice for a settled payment
    ///
    /// # Arguments
    ///
    /// * `order_id` - Order whose payment settled
    /// * `customer_id` - Customer being billed
    /// * `invoice_type` - Which payment this documents
    /// * `line_items` - Line items for the receipt
    /// * `total` - Invoice total
    /// * `issued_at` - Settlement instant
    pub fn new(
        order_id: OrderId,
        customer_id: CustomerId,
        invoice_type: InvoiceType,
        line_items: Vec<LineItem>,
        total: Money,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id,
            customer_id,
            invoice_type,
            line_items,
            total,
            issued_at,
        }
    }

    /// Finishes the draft once the store has assigned id and number
    pub fn into_invoice(self, id: InvoiceId, invoice_number: InvoiceNumber) -> Invoice {
        Invoice {
            id,
            invoice_number,
            order_id: self.order_id,
            customer_id: self.customer_id,
            invoice_type: self.invoice_type,
            status: InvoiceStatus::Paid,
            line_items: self.line_items,
            total: self.total,
            issued_at: self.issued_at,
            paid_at: self.issued_at,
            voided_at: None,
        }
    }
}

/// A receipt for a settled payment on an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,
    /// Invoice number (human-readable, sequential per year)
    pub invoice_number: InvoiceNumber,
    /// Order whose payment is documented
    pub order_id: OrderId,
    /// Customer billed
    pub customer_id: CustomerId,
    /// Which payment this documents
    pub invoice_type: InvoiceType,
    /// Status
    pub status: InvoiceStatus,
    /// Line items
    pub line_items: Vec<LineItem>,
    /// Invoice total
    pub total: Money,
    /// Issue timestamp
    pub issued_at: DateTime<Utc>,
    /// Payment timestamp; equals the issue time
    pub paid_at: DateTime<Utc>,
    /// Void timestamp, when a full refund cancelled the order
    pub voided_at: Option<DateTime<Utc>>,
}

impl Invoice {
    /// Voids the invoice after a full refund
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` if the invoice is already void
    pub fn void(&mut self, now: DateTime<Utc>) -> Result<(), BillingError> {
        match self.status {
            InvoiceStatus::Paid => {
                self.status = InvoiceStatus::Void;
                self.voided_at = Some(now);
                Ok(())
            }
            InvoiceStatus::Void => Err(BillingError::InvalidStateTransition {
                from: InvoiceStatus::Void.to_string(),
                to: InvoiceStatus::Void.to_string(),
            }),
        }
    }
}

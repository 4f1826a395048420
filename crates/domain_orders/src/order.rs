//! Order aggregate and its state machine
//!
//! An order tracks what a household booked and how far its payments have
//! progressed. The happy path is `new` (awaiting deposit) to `confirmed`
//! (deposit settled) to `completed` (balance settled). A `new` order whose
//! checkout session lapses is cancelled; a fully refunded order is cancelled
//! from either paid state, while a partial refund leaves the order
//! confirmed. All transitions are driven by webhook settlement, never by
//! client requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{CustomerId, Money, MoneyError, OrderId, PartyId};

use crate::catalog::OrderItem;
use crate::error::OrderError;
use crate::events::OrderEvent;
use crate::number::OrderNumber;

/// Payment progress of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Created at intake, no money received yet
    New,
    /// Deposit settled, balance outstanding
    Confirmed,
    /// Fully paid
    Completed,
    /// Checkout expired or payment fully refunded
    Cancelled,
}

impl OrderStatus {
    /// Returns the lowercase wire and storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(OrderStatus::New),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

/// Monetary state of an order
///
/// All amounts are in minor units of a single currency. The session and
/// intent ids point at the most recent gateway checkout; refunds are
/// correlated back to the order through `payment_intent_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub total: Money,
    pub deposit: Money,
    pub deposit_paid_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub refund_amount: Option<Money>,
    pub checkout_session_id: Option<String>,
    pub payment_intent_id: Option<String>,
}

impl Pricing {
    /// Prices an order from its total, splitting off the deposit
    ///
    /// # Arguments
    ///
    /// * `total` - Sum of the order's line items
    /// * `deposit_percent` - Deposit percentage, rounded half up
    pub fn from_total(total: Money, deposit_percent: u8) -> Self {
        Self {
            total,
            deposit: total.deposit(deposit_percent),
            deposit_paid_at: None,
            paid_at: None,
            refunded_at: None,
            refund_amount: None,
            checkout_session_id: None,
            payment_intent_id: None,
        }
    }

    /// Returns the amount still owed after the deposit
    pub fn balance_due(&self) -> Result<Money, MoneyError> {
        self.total.balance_after(&self.deposit)
    }
}

/// The order aggregate
///
/// State changes go through the transition methods, which validate the
/// current status and record a domain event. Events accumulate until the
/// caller drains them with [`Order::take_events`] after persisting.
///
/// # Example
///
/// ```rust,ignore
/// let mut order = Order::new(customer_id, Some(party_id), number, items, pricing, now);
/// order.confirm_deposit("cs_123", Some("pi_123".to_string()), now)?;
/// assert_eq!(order.status(), OrderStatus::Confirmed);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: OrderId,
    order_number: OrderNumber,
    customer_id: CustomerId,
    party_id: Option<PartyId>,
    status: OrderStatus,
    items: Vec<OrderItem>,
    pricing: Pricing,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<OrderEvent>,
}

impl Order {
    /// Creates a new order awaiting its deposit
    ///
    /// # Arguments
    ///
    /// * `customer_id` - Owning customer
    /// * `party_id` - Scheduled party, if one was booked alongside
    /// * `order_number` - Pre-generated human-facing number
    /// * `items` - Catalog snapshot priced at intake
    /// * `pricing` - Total and deposit split
    /// * `now` - Creation instant
    pub fn new(
        customer_id: CustomerId,
        party_id: Option<PartyId>,
        order_number: OrderNumber,
        items: Vec<OrderItem>,
        pricing: Pricing,
        now: DateTime<Utc>,
    ) -> Self {
        let id = OrderId::new();
        let created = OrderEvent::OrderCreated {
            order_id: id,
            order_number: order_number.as_str().to_string(),
            total: pricing.total,
            timestamp: now,
        };

        Self {
            id,
            order_number,
            customer_id,
            party_id,
            status: OrderStatus::New,
            items,
            pricing,
            created_at: now,
            updated_at: now,
            events: vec![created],
        }
    }

    /// Rebuilds a persisted order without emitting events
    ///
    /// Used by storage adapters; the aggregate trusts stored state.
    pub fn from_parts(
        id: OrderId,
        order_number: OrderNumber,
        customer_id: CustomerId,
        party_id: Option<PartyId>,
        status: OrderStatus,
        items: Vec<OrderItem>,
        pricing: Pricing,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            order_number,
            customer_id,
            party_id,
            status,
            items,
            pricing,
            created_at,
            updated_at,
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn order_number(&self) -> &OrderNumber {
        &self.order_number
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn party_id(&self) -> Option<PartyId> {
        self.party_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn pricing(&self) -> &Pricing {
        &self.pricing
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Drains the domain events accumulated since the last call
    pub fn take_events(&mut self) -> Vec<OrderEvent> {
        std::mem::take(&mut self.events)
    }

    /// Records a settled deposit payment (transitions from New to Confirmed)
    ///
    /// # Arguments
    ///
    /// * `checkout_session_id` - Gateway session that collected the deposit
    /// * `payment_intent_id` - Gateway payment intent, when present
    /// * `now` - Settlement instant
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` unless the order is `new`
    pub fn confirm_deposit(
        &mut self,
        checkout_session_id: impl Into<String>,
        payment_intent_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        match self.status {
            OrderStatus::New => {
                self.status = OrderStatus::Confirmed;
                self.pricing.deposit_paid_at = Some(now);
                self.pricing.checkout_session_id = Some(checkout_session_id.into());
                if payment_intent_id.is_some() {
                    self.pricing.payment_intent_id = payment_intent_id;
                }
                self.updated_at = now;

                self.events.push(OrderEvent::DepositConfirmed {
                    order_id: self.id,
                    amount: self.pricing.deposit,
                    timestamp: now,
                });

                Ok(())
            }
            other => Err(OrderError::InvalidStateTransition {
                from: other.to_string(),
                to: OrderStatus::Confirmed.to_string(),
            }),
        }
    }

    /// Records the settled balance payment (transitions from Confirmed to
    /// Completed)
    ///
    /// # Arguments
    ///
    /// * `checkout_session_id` - Gateway session that collected the balance
    /// * `payment_intent_id` - Gateway payment intent, when present
    /// * `now` - Settlement instant
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` unless the order is `confirmed`
    pub fn complete_payment(
        &mut self,
        checkout_session_id: impl Into<String>,
        payment_intent_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        match self.status {
            OrderStatus::Confirmed => {
                let balance = self.pricing.balance_due()?;
                self.status = OrderStatus::Completed;
                self.pricing.paid_at = Some(now);
                self.pricing.checkout_session_id = Some(checkout_session_id.into());
                // The balance session's intent supersedes the deposit's for
                // refund correlation; an absent intent keeps the old one.
                if payment_intent_id.is_some() {
                    self.pricing.payment_intent_id = payment_intent_id;
                }
                self.updated_at = now;

                self.events.push(OrderEvent::PaymentCompleted {
                    order_id: self.id,
                    amount: balance,
                    timestamp: now,
                });

                Ok(())
            }
            other => Err(OrderError::InvalidStateTransition {
                from: other.to_string(),
                to: OrderStatus::Completed.to_string(),
            }),
        }
    }

    /// Cancels an unpaid order whose checkout session lapsed
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` unless the order is `new`
    pub fn expire_checkout(&mut self, now: DateTime<Utc>) -> Result<(), OrderError> {
        match self.status {
            OrderStatus::New => {
                self.status = OrderStatus::Cancelled;
                self.updated_at = now;

                self.events.push(OrderEvent::CheckoutExpired {
                    order_id: self.id,
                    timestamp: now,
                });

                Ok(())
            }
            other => Err(OrderError::InvalidStateTransition {
                from: other.to_string(),
                to: OrderStatus::Cancelled.to_string(),
            }),
        }
    }

    /// Records a refund against the order's payment
    ///
    /// A full refund cancels the order; a partial refund drops a completed
    /// order back to `confirmed` (money is owed again) and leaves a
    /// confirmed order where it is. The refund timestamp and amount are
    /// recorded in both cases.
    ///
    /// # Arguments
    ///
    /// * `amount` - Cumulative amount refunded, from the gateway
    /// * `full` - Whether the charge was refunded in full
    /// * `now` - Settlement instant
    ///
    /// # Errors
    ///
    /// Returns `RefundExceedsTotal` if `amount` exceeds the order total, or
    /// `InvalidStateTransition` if no payment has been recorded yet
    pub fn apply_refund(
        &mut self,
        amount: Money,
        full: bool,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if amount.amount_minor() > self.pricing.total.amount_minor() {
            return Err(OrderError::RefundExceedsTotal {
                total: self.pricing.total.to_string(),
                refunded: amount.to_string(),
            });
        }

        match self.status {
            OrderStatus::Confirmed | OrderStatus::Completed => {
                self.status = if full {
                    OrderStatus::Cancelled
                } else {
                    OrderStatus::Confirmed
                };
                self.pricing.refunded_at = Some(now);
                self.pricing.refund_amount = Some(amount);
                self.updated_at = now;

                self.events.push(OrderEvent::RefundRecorded {
                    order_id: self.id,
                    amount,
                    full,
                    timestamp: now,
                });

                Ok(())
            }
            other => Err(OrderError::InvalidStateTransition {
                from: other.to_string(),
                to: if full {
                    OrderStatus::Cancelled.to_string()
                } else {
                    OrderStatus::Confirmed.to_string()
                },
            }),
        }
    }
}

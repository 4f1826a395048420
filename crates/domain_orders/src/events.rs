//! Domain events for the order aggregate
//!
//! Events capture the payment-relevant moments of an order's life. They are
//! collected on the aggregate and drained with `Order::take_events` by the
//! service that persisted the change, which emits them to the audit log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::Money;
use core_kernel::OrderId;

/// Domain events emitted by the Order aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderEvent {
    /// Order was created at intake, before any payment
    OrderCreated {
        order_id: OrderId,
        order_number: String,
        total: Money,
        timestamp: DateTime<Utc>,
    },

    /// Deposit payment settled and the order is confirmed
    DepositConfirmed {
        order_id: OrderId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },

    /// Balance payment settled and the order is fully paid
    PaymentCompleted {
        order_id: OrderId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },

    /// Checkout session lapsed without payment
    CheckoutExpired {
        order_id: OrderId,
        timestamp: DateTime<Utc>,
    },

    /// A refund was recorded against the order's payment
    RefundRecorded {
        order_id: OrderId,
        amount: Money,
        full: bool,
        timestamp: DateTime<Utc>,
    },
}

impl OrderEvent {
    /// Returns the order ID associated with this event
    pub fn order_id(&self) -> OrderId {
        match self {
            OrderEvent::OrderCreated { order_id, .. } => *order_id,
            OrderEvent::DepositConfirmed { order_id, .. } => *order_id,
            OrderEvent::PaymentCompleted { order_id, .. } => *order_id,
            OrderEvent::CheckoutExpired { order_id, .. } => *order_id,
            OrderEvent::RefundRecorded { order_id, .. } => *order_id,
        }
    }

    /// Returns the timestamp of this event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderCreated { timestamp, .. } => *timestamp,
            OrderEvent::DepositConfirmed { timestamp, .. } => *timestamp,
            OrderEvent::PaymentCompleted { timestamp, .. } => *timestamp,
            OrderEvent::CheckoutExpired { timestamp, .. } => *timestamp,
            OrderEvent::RefundRecorded { timestamp, .. } => *timestamp,
        }
    }

    /// Returns the event name used in audit log lines
    pub fn name(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated { .. } => "order_created",
            OrderEvent::DepositConfirmed { .. } => "deposit_confirmed",
            OrderEvent::PaymentCompleted { .. } => "payment_completed",
            OrderEvent::CheckoutExpired { .. } => "checkout_expired",
            OrderEvent::RefundRecorded { .. } => "refund_recorded",
        }
    }
}

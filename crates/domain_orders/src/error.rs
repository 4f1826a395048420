//! Error types for the order domain

use core_kernel::MoneyError;
use thiserror::Error;

/// Errors raised by order aggregate operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderError {
    /// The requested transition is not allowed from the current state
    #[error("Invalid order state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    /// A refund larger than the order total cannot be recorded
    #[error("Refund of {refunded} exceeds the order total of {total}")]
    RefundExceedsTotal { total: String, refunded: String },

    /// Monetary arithmetic failed while updating the order
    #[error("Order financial calculation failed: {0}")]
    Financial(String),

    /// The value does not match the order number format
    #[error("Malformed order number: {0}")]
    MalformedOrderNumber(String),

    /// The value does not match any known order status
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
}

impl From<MoneyError> for OrderError {
    fn from(err: MoneyError) -> Self {
        OrderError::Financial(err.to_string())
    }
}

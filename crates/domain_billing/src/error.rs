//! Billing domain errors

use thiserror::Error;

/// Errors that can occur in the billing domain
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BillingError {
    /// Invoice state transition not allowed
    #[error("Invalid invoice state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    /// The value does not match the invoice number format
    #[error("Malformed invoice number: {0}")]
    MalformedInvoiceNumber(String),

    /// The value does not match any known invoice type
    #[error("Unknown invoice type: {0}")]
    UnknownInvoiceType(String),

    /// The value does not match any known invoice status
    #[error("Unknown invoice status: {0}")]
    UnknownStatus(String),

    /// The value does not match any known payment purpose
    #[error("Unknown payment purpose: {0}")]
    UnknownPaymentPurpose(String),

    /// Webhook payload could not be decoded
    #[error("Malformed gateway event: {0}")]
    MalformedEvent(String),
}

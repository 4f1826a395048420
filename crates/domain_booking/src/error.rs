//! Booking orchestration errors
//!
//! One taxonomy for all four services, shaped for the HTTP boundary:
//! validation maps to 400, not-found to 404, invalid state to 409,
//! generation exhaustion to 500, and transient errors to 503. A duplicate
//! webhook delivery is deliberately not here; it is a successful no-op,
//! reported as an outcome rather than an error.

use thiserror::Error;

use core_kernel::{MoneyError, PortError};
use domain_orders::OrderError;
use domain_party::PartyError;

/// Errors raised by the booking services
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    /// The request is malformed or incomplete
    #[error("{0}")]
    Validation(String),

    /// A referenced entity does not exist
    #[error("Not found: {entity} {id}")]
    NotFound { entity: String, id: String },

    /// A state machine precondition was violated
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Order number generation kept colliding
    #[error("Order number generation exhausted after {attempts} attempts")]
    GenerationExhausted { attempts: u32 },

    /// A dependency failed in a retryable way
    #[error("Transient dependency failure: {0}")]
    Transient(String),

    /// Unexpected internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PortError> for BookingError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { entity_type, id } => BookingError::NotFound {
                entity: entity_type,
                id,
            },
            PortError::Validation { message } => BookingError::Validation(message),
            err if err.is_transient() => BookingError::Transient(err.to_string()),
            err => BookingError::Internal(err.to_string()),
        }
    }
}

impl From<OrderError> for BookingError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::InvalidStateTransition { .. } | OrderError::RefundExceedsTotal { .. } => {
                BookingError::InvalidState(err.to_string())
            }
            OrderError::MalformedOrderNumber(_) | OrderError::UnknownStatus(_) => {
                BookingError::Validation(err.to_string())
            }
            OrderError::Financial(_) => BookingError::Internal(err.to_string()),
        }
    }
}

impl From<PartyError> for BookingError {
    fn from(err: PartyError) -> Self {
        match err {
            PartyError::InvalidStateTransition { .. } => {
                BookingError::InvalidState(err.to_string())
            }
            PartyError::Financial(_) => BookingError::Internal(err.to_string()),
        }
    }
}

impl From<MoneyError> for BookingError {
    fn from(err: MoneyError) -> Self {
        BookingError::Internal(err.to_string())
    }
}

//! Party domain errors

use thiserror::Error;

/// Errors that can occur in the party domain
#[derive(Debug, Error)]
pub enum PartyError {
    /// Invalid state transition attempted
    #[error("Invalid party state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    /// Financial aggregate update failed
    #[error("Financial error: {0}")]
    Financial(String),
}

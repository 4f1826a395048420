//! Party entity and lifecycle state machine
//!
//! A Party is the scheduled real-world event being booked: a date, a start
//! time, a venue room, the child the event is for, and the safety-relevant
//! details staff need on the day.
//!
//! # State Machine
//!
//! Status only ever changes in response to payment settlement:
//! - `inquiry -> confirmed` when the deposit is received
//! - `confirmed -> completed` when the balance is received
//! - any non-terminal state `-> cancelled` on full refund
//!
//! The reminder and feedback timestamps are one-shot notification guards set
//! by the scheduler; once set they are never cleared.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use core_kernel::{CustomerId, PartyId, Timezone};

use crate::error::PartyError;

/// Party lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyStatus {
    /// Booked but no payment received yet
    Inquiry,
    /// Deposit received, slot is committed
    Confirmed,
    /// Balance received, event will run (or has run)
    Completed,
    /// Cancelled via checkout expiry or full refund
    Cancelled,
}

impl PartyStatus {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, PartyStatus::Completed | PartyStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PartyStatus::Inquiry => "inquiry",
            PartyStatus::Confirmed => "confirmed",
            PartyStatus::Completed => "completed",
            PartyStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PartyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PartyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inquiry" => Ok(PartyStatus::Inquiry),
            "confirmed" => Ok(PartyStatus::Confirmed),
            "completed" => Ok(PartyStatus::Completed),
            "cancelled" => Ok(PartyStatus::Cancelled),
            other => Err(format!("Unknown party status: {}", other)),
        }
    }
}

/// Scheduling details captured at booking intake
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PartyDetails {
    /// Local calendar date of the event
    pub date: NaiveDate,
    /// Local wall-clock start time
    pub start_time: NaiveTime,
    /// Venue room or area
    #[validate(length(min = 1, message = "Venue is required"))]
    pub venue: String,
    /// Expected number of guests
    #[validate(range(min = 1, max = 500))]
    pub guest_count: u32,
    /// Free-text requests from the customer
    pub special_requests: Option<String>,
}

/// Details of the child the party is for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChildInfo {
    #[validate(length(min = 1, message = "Child name is required"))]
    pub child_name: String,
    /// Age at the time of the event
    #[validate(range(min = 1, max = 17))]
    pub child_age: u8,
    /// Known allergies, verbatim from the parent
    pub allergies: Option<String>,
    /// Accessibility or supervision needs
    pub special_needs: Option<String>,
}

/// A scheduled party event
///
/// Created once by booking intake. After creation only `status`,
/// `reminder_sent_at`, `feedback_sent_at` and `updated_at` ever change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    /// Unique party identifier
    pub id: PartyId,
    /// The paying customer
    pub customer_id: CustomerId,
    /// Current lifecycle state
    pub status: PartyStatus,
    /// Local calendar date of the event
    pub date: NaiveDate,
    /// Local wall-clock start time
    pub start_time: NaiveTime,
    /// The event start resolved to a UTC instant, used for scan windows
    pub starts_at: DateTime<Utc>,
    /// Venue room or area
    pub venue: String,
    /// Expected number of guests
    pub guest_count: u32,
    /// Child details
    pub child: ChildInfo,
    /// Emergency contact for the day of the event
    pub emergency_contact: String,
    /// Free-text requests from the customer
    pub special_requests: Option<String>,
    /// When the 24h-before reminder was sent (notification guard)
    pub reminder_sent_at: Option<DateTime<Utc>>,
    /// When the day-after feedback request was sent (notification guard)
    pub feedback_sent_at: Option<DateTime<Utc>>,
    /// When this party was created
    pub created_at: DateTime<Utc>,
    /// When this party was last updated
    pub updated_at: DateTime<Utc>,
}

impl Party {
    /// Creates a new party in the `inquiry` state
    ///
    /// The event start is resolved to UTC using the venue timezone so that
    /// scheduler scans can compare instants without re-deriving local time.
    pub fn new(
        customer_id: CustomerId,
        details: PartyDetails,
        child: ChildInfo,
        emergency_contact: impl Into<String>,
        venue_tz: &Timezone,
        now: DateTime<Utc>,
    ) -> Self {
        let starts_at = venue_tz.instant(details.date, details.start_time);
        Self {
            id: PartyId::new(),
            customer_id,
            status: PartyStatus::Inquiry,
            date: details.date,
            start_time: details.start_time,
            starts_at,
            venue: details.venue,
            guest_count: details.guest_count,
            child,
            emergency_contact: emergency_contact.into(),
            special_requests: details.special_requests,
            reminder_sent_at: None,
            feedback_sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Confirms the party after the deposit has been received
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` unless the party is in `inquiry`
    pub fn confirm(&mut self, now: DateTime<Utc>) -> Result<(), PartyError> {
        match self.status {
            PartyStatus::Inquiry => {
                self.status = PartyStatus::Confirmed;
                self.updated_at = now;
                Ok(())
            }
            other => Err(PartyError::InvalidStateTransition {
                from: other.to_string(),
                to: PartyStatus::Confirmed.to_string(),
            }),
        }
    }

    /// Completes the party after the balance has been received
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` unless the party is in `confirmed`
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), PartyError> {
        match self.status {
            PartyStatus::Confirmed => {
                self.status = PartyStatus::Completed;
                self.updated_at = now;
                Ok(())
            }
            other => Err(PartyError::InvalidStateTransition {
                from: other.to_string(),
                to: PartyStatus::Completed.to_string(),
            }),
        }
    }

    /// Cancels the party from any non-terminal state
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` if the party is already
    /// `completed` or `cancelled`
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), PartyError> {
        if self.status.is_terminal() {
            return Err(PartyError::InvalidStateTransition {
                from: self.status.to_string(),
                to: PartyStatus::Cancelled.to_string(),
            });
        }
        self.status = PartyStatus::Cancelled;
        self.updated_at = now;
        Ok(())
    }

    /// Records that the 24h-before reminder went out
    pub fn mark_reminder_sent(&mut self, now: DateTime<Utc>) {
        self.reminder_sent_at = Some(now);
        self.updated_at = now;
    }

    /// Records that the day-after feedback request went out
    pub fn mark_feedback_sent(&mut self, now: DateTime<Utc>) {
        self.feedback_sent_at = Some(now);
        self.updated_at = now;
    }
}

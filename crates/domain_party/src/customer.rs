//! Customer entity and contact details
//!
//! Customers are keyed by normalized email. Intake resolves the customer by
//! email and either creates a new row or reuses the existing one, bumping
//! the aggregate stats. Nothing else in the system writes to customers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{Currency, CustomerId, Money};

use crate::error::PartyError;

/// Normalizes an email for use as the customer natural key
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Contact details captured with every booking
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[validate(length(min = 1, message = "Parent name is required"))]
    pub parent_name: String,
    #[validate(email(message = "A valid email is required"))]
    pub parent_email: String,
    #[validate(length(min = 1, message = "Parent phone is required"))]
    pub parent_phone: String,
    #[validate(length(min = 1, message = "Emergency contact is required"))]
    pub emergency_contact: String,
}

/// The paying customer
///
/// `email` is the unique natural key, stored normalized. The aggregate stats
/// are denormalized booking counters maintained by intake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Unique customer identifier
    pub id: CustomerId,
    /// Normalized email, unique across all customers
    pub email: String,
    /// Display name
    pub name: String,
    /// Contact phone number
    pub phone: String,
    /// Number of bookings this customer has made
    pub total_booked: u32,
    /// Sum of order totals across all bookings
    pub total_spent: Money,
    /// Date of the most recent event booked
    pub last_event_date: Option<NaiveDate>,
    /// When this customer was created
    pub created_at: DateTime<Utc>,
    /// When this customer was last updated
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Creates a new customer with zeroed aggregates
    pub fn new(
        email: &str,
        name: impl Into<String>,
        phone: impl Into<String>,
        currency: Currency,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CustomerId::new(),
            email: normalize_email(email),
            name: name.into(),
            phone: phone.into(),
            total_booked: 0,
            total_spent: Money::zero(currency),
            last_event_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Records a booking against this customer's aggregates
    ///
    /// Increments the booking count, adds the order total to lifetime spend,
    /// and advances `last_event_date` if the new event is later.
    ///
    /// # Errors
    ///
    /// Returns a financial error if the order total is in a different
    /// currency to previous bookings.
    pub fn record_booking(
        &mut self,
        order_total: Money,
        event_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<(), PartyError> {
        self.total_spent = self
            .total_spent
            .checked_add(&order_total)
            .map_err(|e| PartyError::Financial(e.to_string()))?;
        self.total_booked += 1;
        self.last_event_date = match self.last_event_date {
            Some(existing) if existing >= event_date => Some(existing),
            _ => Some(event_date),
        };
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Kim.Parker@Example.COM "), "kim.parker@example.com");
    }

    #[test]
    fn test_new_customer_has_zeroed_aggregates() {
        let customer = Customer::new(
            "Kim@example.com",
            "Kim Parker",
            "0400 123 456",
            Currency::AUD,
            Utc::now(),
        );
        assert_eq!(customer.email, "kim@example.com");
        assert_eq!(customer.total_booked, 0);
        assert!(customer.total_spent.is_zero());
        assert!(customer.last_event_date.is_none());
    }

    #[test]
    fn test_record_booking_increments_aggregates() {
        let mut customer = Customer::new(
            "kim@example.com",
            "Kim Parker",
            "0400 123 456",
            Currency::AUD,
            Utc::now(),
        );
        let july = NaiveDate::from_ymd_opt(2025, 7, 19).unwrap();
        let june = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();

        customer
            .record_booking(Money::from_minor(450_000, Currency::AUD), july, Utc::now())
            .unwrap();
        customer
            .record_booking(Money::from_minor(120_000, Currency::AUD), june, Utc::now())
            .unwrap();

        assert_eq!(customer.total_booked, 2);
        assert_eq!(
            customer.total_spent,
            Money::from_minor(570_000, Currency::AUD)
        );
        // The earlier June booking does not move last_event_date backwards
        assert_eq!(customer.last_event_date, Some(july));
    }

    #[test]
    fn test_record_booking_rejects_currency_mismatch() {
        let mut customer = Customer::new(
            "kim@example.com",
            "Kim Parker",
            "0400 123 456",
            Currency::AUD,
            Utc::now(),
        );
        let result = customer.record_booking(
            Money::from_minor(10_000, Currency::USD),
            NaiveDate::from_ymd_opt(2025, 7, 19).unwrap(),
            Utc::now(),
        );
        assert!(matches!(result, Err(PartyError::Financial(_))));
        assert_eq!(customer.total_booked, 0);
    }

    #[test]
    fn test_contact_info_validation() {
        let valid = ContactInfo {
            parent_name: "Kim Parker".to_string(),
            parent_email: "kim@example.com".to_string(),
            parent_phone: "0400 123 456".to_string(),
            emergency_contact: "Sam Parker 0400 999 888".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = ContactInfo {
            parent_email: "not-an-email".to_string(),
            ..valid
        };
        assert!(bad_email.validate().is_err());
    }
}

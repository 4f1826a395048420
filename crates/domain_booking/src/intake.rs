//! Booking intake
//!
//! A single submission becomes a customer, a party, an order, and a safety
//! checklist. The customer is upserted by email first, then the other three
//! rows are written in one atomic store call that also bumps the customer's
//! booking counters, so a failed write never leaves a partial booking
//! behind. Order numbers are regenerated on collision up to a configurable
//! bound.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use validator::Validate;

use core_kernel::{Clock, Money, OrderId, PartyId, PortError, Timezone, DEFAULT_DEPOSIT_PERCENT};
use domain_orders::{Order, OrderItem, OrderNumber, Pricing};
use domain_party::{ChildInfo, ContactInfo, Party, PartyDetails, SafetyChecklist};

use crate::error::BookingError;
use crate::ports::{
    BookingConfirmationNotice, BookingStore, NewBooking, NotificationOutcome, NotificationSender,
};

/// Tuning knobs for intake
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// Timezone the party's wall-clock schedule is interpreted in
    pub timezone: Timezone,
    /// Deposit percentage applied to every order
    pub deposit_percent: u8,
    /// Order number attempts before the booking fails
    pub max_number_attempts: u32,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            timezone: Timezone::default(),
            deposit_percent: DEFAULT_DEPOSIT_PERCENT,
            max_number_attempts: 5,
        }
    }
}

/// A booking request as submitted by the public site
///
/// Every section is optional at the wire level; intake rejects incomplete
/// submissions with a single field-independent message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSubmission {
    #[serde(default)]
    pub package_id: Option<String>,
    #[serde(default)]
    pub activity_ids: Vec<String>,
    pub party_details: Option<PartyDetails>,
    pub child_info: Option<ChildInfo>,
    pub contact: Option<ContactInfo>,
    #[serde(default)]
    pub safety_acknowledged: bool,
}

/// What intake returns once the booking is persisted
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    pub order_id: OrderId,
    pub order_number: String,
    pub party_id: PartyId,
    /// Whether the confirmation email went out; informational only
    pub notification: NotificationOutcome,
}

/// Service for turning submissions into persisted bookings
pub struct BookingIntakeService {
    store: Arc<dyn BookingStore>,
    notifier: Arc<dyn NotificationSender>,
    clock: Arc<dyn Clock>,
    config: IntakeConfig,
}

impl BookingIntakeService {
    /// Creates a new intake service
    pub fn new(
        store: Arc<dyn BookingStore>,
        notifier: Arc<dyn NotificationSender>,
        clock: Arc<dyn Clock>,
        config: IntakeConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            config,
        }
    }

    /// Creates a booking from a submission
    ///
    /// This method:
    /// 1. Validates completeness, then each section's fields
    /// 2. Resolves the catalog selection and prices the order
    /// 3. Upserts the customer by email
    /// 4. Persists party, order, and checklist atomically; the store bumps
    ///    the customer's aggregates in the same write, and the order
    ///    number is regenerated on collision
    /// 5. Sends the confirmation notification best-effort
    ///
    /// # Errors
    ///
    /// Returns `Validation` for incomplete or inconsistent submissions,
    /// `GenerationExhausted` when no free order number was found, and the
    /// mapped store error otherwise
    #[instrument(skip(self, submission))]
    pub async fn create_booking(
        &self,
        submission: BookingSubmission,
    ) -> Result<BookingConfirmation, BookingError> {
        let (details, child, contact) = validate_submission(&submission)?;
        let items = self.resolve_items(&submission).await?;
        let total = price_items(&items)?;
        let now = self.clock.now();

        let customer = self
            .store
            .upsert_customer(
                &contact.parent_email,
                &contact.parent_name,
                &contact.parent_phone,
                total.currency(),
                now,
            )
            .await?;

        let party = Party::new(
            customer.id,
            details.clone(),
            child.clone(),
            contact.emergency_contact.clone(),
            &self.config.timezone,
            now,
        );
        let pricing = Pricing::from_total(total, self.config.deposit_percent.min(100));

        let mut attempt = 0;
        let mut booking = loop {
            attempt += 1;
            let number = OrderNumber::generate(now, &mut rand::thread_rng());
            let order = Order::new(
                customer.id,
                Some(party.id),
                number,
                items.clone(),
                pricing.clone(),
                now,
            );
            let checklist = SafetyChecklist::capture(
                order.id(),
                party.id,
                submission.safety_acknowledged,
                child.allergies.clone(),
                contact.emergency_contact.clone(),
                child.special_needs.clone(),
                now,
            );
            let booking = NewBooking {
                customer: customer.clone(),
                party: party.clone(),
                order,
                checklist,
            };
            match self.store.create_booking(&booking).await {
                Ok(()) => break booking,
                Err(PortError::Duplicate { ref field }) if field == "order_number" => {
                    if attempt >= self.config.max_number_attempts {
                        return Err(BookingError::GenerationExhausted { attempts: attempt });
                    }
                    warn!(attempt, "Order number collision, regenerating");
                }
                Err(err) => return Err(err.into()),
            }
        };

        for event in booking.order.take_events() {
            debug!(event = event.name(), order_id = %event.order_id(), "Domain event");
        }

        let notice = BookingConfirmationNotice {
            to: contact.parent_email.clone(),
            parent_name: contact.parent_name.clone(),
            order_number: booking.order.order_number().to_string(),
            party_date: booking.party.date,
            venue: booking.party.venue.clone(),
            total: booking.order.pricing().total,
            deposit: booking.order.pricing().deposit,
        };
        let notification = match self.notifier.send_booking_confirmation(&notice).await {
            Ok(()) => NotificationOutcome::Sent,
            Err(err) => {
                warn!(error = %err, "Failed to send booking confirmation");
                NotificationOutcome::Failed
            }
        };

        Ok(BookingConfirmation {
            order_id: booking.order.id(),
            order_number: booking.order.order_number().to_string(),
            party_id: booking.party.id,
            notification,
        })
    }

    /// Resolves the catalog selection into priced order items
    ///
    /// A package takes precedence over any activities listed alongside it.
    /// Ids without a catalog record fail the booking.
    async fn resolve_items(
        &self,
        submission: &BookingSubmission,
    ) -> Result<Vec<OrderItem>, BookingError> {
        if let Some(package_id) = &submission.package_id {
            let package = self.store.get_package(package_id).await?.ok_or_else(|| {
                BookingError::Validation(format!("Unknown package: {package_id}"))
            })?;
            return Ok(vec![OrderItem::from(&package)]);
        }

        let activities = self.store.find_activities(&submission.activity_ids).await?;
        let found: HashSet<&str> = activities.iter().map(|a| a.id.as_str()).collect();
        if let Some(missing) = submission
            .activity_ids
            .iter()
            .find(|id| !found.contains(id.as_str()))
        {
            return Err(BookingError::Validation(format!(
                "Unknown activity: {missing}"
            )));
        }
        Ok(activities.iter().map(OrderItem::from).collect())
    }
}

fn validate_submission(
    submission: &BookingSubmission,
) -> Result<(&PartyDetails, &ChildInfo, &ContactInfo), BookingError> {
    let (Some(details), Some(child), Some(contact)) = (
        submission.party_details.as_ref(),
        submission.child_info.as_ref(),
        submission.contact.as_ref(),
    ) else {
        return Err(BookingError::Validation(
            "Missing required fields".to_string(),
        ));
    };
    if submission.package_id.is_none() && submission.activity_ids.is_empty() {
        return Err(BookingError::Validation(
            "Select a package or at least one activity".to_string(),
        ));
    }
    details.validate().map_err(validation_message)?;
    child.validate().map_err(validation_message)?;
    contact.validate().map_err(validation_message)?;
    Ok((details, child, contact))
}

/// Reduces validator output to its first message, one problem at a time
fn validation_message(errors: validator::ValidationErrors) -> BookingError {
    let message = errors
        .field_errors()
        .values()
        .flat_map(|field| field.iter())
        .filter_map(|error| error.message.as_ref())
        .map(|message| message.to_string())
        .next()
        .unwrap_or_else(|| "Invalid booking details".to_string());
    BookingError::Validation(message)
}

fn price_items(items: &[OrderItem]) -> Result<Money, BookingError> {
    let mut prices = items.iter().map(|item| item.price);
    let first = prices.next().ok_or_else(|| {
        BookingError::Validation("Select a package or at least one activity".to_string())
    })?;
    prices
        .try_fold(first, |total, price| total.checked_add(&price))
        .map_err(Into::into)
}

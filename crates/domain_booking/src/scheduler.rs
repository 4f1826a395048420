//! Reminder scheduling
//!
//! Three time-window scans driven by an external cron: the day-before party
//! reminder, the day-after feedback request, and the balance-due notice.
//! Windows are computed against the venue's local calendar, then queried as
//! UTC instants.
//!
//! Failure semantics per item: a send or customer lookup problem is counted
//! and the loop continues, leaving any guard unset so the next run retries.
//! Only a transient store failure aborts a scan. The reminder and feedback
//! scans set their guard column only after a successful send; the payment
//! scan has no guard, its exact-day window under a daily cadence is the
//! dedupe.

use std::sync::Arc;

use chrono::{Days, Duration};
use serde::Serialize;
use tracing::{instrument, warn};

use core_kernel::{Clock, CustomerId, Timezone};
use domain_party::Customer;

use crate::error::BookingError;
use crate::ports::{
    BalanceDueNotice, BookingStore, FeedbackRequestNotice, NotificationSender,
    PartyReminderNotice,
};

/// Scheduler tuning
#[derive(Debug, Clone)]
pub struct ReminderConfig {
    /// Days before the party that the balance-due notice goes out
    pub payment_due_days: u32,
    /// Timezone of the venue's calendar
    pub timezone: Timezone,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            payment_due_days: 3,
            timezone: Timezone::default(),
        }
    }
}

/// Tally of one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub sent: u32,
    pub skipped: u32,
    pub errors: u32,
}

/// Tallies of all three scans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerReport {
    pub party_reminders: ScanReport,
    pub feedback_requests: ScanReport,
    pub payment_due: ScanReport,
}

/// Service running the notification scans
pub struct ReminderScheduler {
    store: Arc<dyn BookingStore>,
    notifier: Arc<dyn NotificationSender>,
    clock: Arc<dyn Clock>,
    config: ReminderConfig,
}

impl ReminderScheduler {
    /// Creates a new scheduler
    pub fn new(
        store: Arc<dyn BookingStore>,
        notifier: Arc<dyn NotificationSender>,
        clock: Arc<dyn Clock>,
        config: ReminderConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            config,
        }
    }

    /// Reminds confirmed parties starting within the next 24 hours
    #[instrument(skip(self))]
    pub async fn run_party_reminders(&self) -> Result<ScanReport, BookingError> {
        let now = self.clock.now();
        let parties = self
            .store
            .parties_needing_reminder(now, now + Duration::hours(24))
            .await?;

        let mut report = ScanReport::default();
        for party in parties {
            // The guard may have been set since the scan query ran
            if party.reminder_sent_at.is_some() {
                report.skipped += 1;
                continue;
            }
            let Some(customer) = self.customer_for(party.customer_id, &mut report).await? else {
                continue;
            };
            let notice = PartyReminderNotice {
                to: customer.email,
                parent_name: customer.name,
                party_date: party.date,
                start_time: party.start_time,
                venue: party.venue.clone(),
            };
            match self.notifier.send_party_reminder(&notice).await {
                Ok(()) => match self.store.record_reminder_sent(party.id, now).await {
                    Ok(()) => report.sent += 1,
                    Err(err) if err.is_transient() => return Err(err.into()),
                    Err(err) => {
                        warn!(party_id = %party.id, error = %err, "Could not record reminder");
                        report.errors += 1;
                    }
                },
                Err(err) => {
                    warn!(party_id = %party.id, error = %err, "Reminder send failed");
                    report.errors += 1;
                }
            }
        }
        Ok(report)
    }

    /// Requests feedback for parties held on the previous local calendar day
    #[instrument(skip(self))]
    pub async fn run_feedback_requests(&self) -> Result<ScanReport, BookingError> {
        let now = self.clock.now();
        let today = self.config.timezone.local_date(now);
        let yesterday = today.pred_opt().unwrap_or(today);
        let (from, to) = self.config.timezone.day_bounds(yesterday);
        let parties = self.store.parties_needing_feedback(from, to).await?;

        let mut report = ScanReport::default();
        for party in parties {
            if party.feedback_sent_at.is_some() {
                report.skipped += 1;
                continue;
            }
            let Some(customer) = self.customer_for(party.customer_id, &mut report).await? else {
                continue;
            };
            let notice = FeedbackRequestNotice {
                to: customer.email,
                parent_name: customer.name,
                child_name: party.child.child_name.clone(),
            };
            match self.notifier.send_feedback_request(&notice).await {
                Ok(()) => match self.store.record_feedback_sent(party.id, now).await {
                    Ok(()) => report.sent += 1,
                    Err(err) if err.is_transient() => return Err(err.into()),
                    Err(err) => {
                        warn!(party_id = %party.id, error = %err, "Could not record feedback request");
                        report.errors += 1;
                    }
                },
                Err(err) => {
                    warn!(party_id = %party.id, error = %err, "Feedback request send failed");
                    report.errors += 1;
                }
            }
        }
        Ok(report)
    }

    /// Notices outstanding balances for parties `payment_due_days` out
    #[instrument(skip(self))]
    pub async fn run_payment_due(&self) -> Result<ScanReport, BookingError> {
        let now = self.clock.now();
        let today = self.config.timezone.local_date(now);
        let due_day = today
            .checked_add_days(Days::new(self.config.payment_due_days as u64))
            .unwrap_or(today);
        let (from, to) = self.config.timezone.day_bounds(due_day);
        let due = self.store.orders_due_for_balance(from, to).await?;

        let mut report = ScanReport::default();
        for (order, party) in due {
            let pricing = order.pricing();
            let outstanding = if pricing.deposit_paid_at.is_none() {
                pricing.total
            } else {
                match pricing.balance_due() {
                    Ok(balance) => balance,
                    Err(err) => {
                        warn!(order_id = %order.id(), error = %err, "Unpriceable balance");
                        report.errors += 1;
                        continue;
                    }
                }
            };
            if outstanding.is_zero() {
                report.skipped += 1;
                continue;
            }
            let Some(customer) = self.customer_for(order.customer_id(), &mut report).await?
            else {
                continue;
            };
            let notice = BalanceDueNotice {
                to: customer.email,
                parent_name: customer.name,
                order_number: order.order_number().to_string(),
                outstanding,
                due_date: party.date,
            };
            match self.notifier.send_balance_due(&notice).await {
                Ok(()) => report.sent += 1,
                Err(err) => {
                    warn!(order_id = %order.id(), error = %err, "Balance notice send failed");
                    report.errors += 1;
                }
            }
        }
        Ok(report)
    }

    /// Runs the three scans in sequence
    ///
    /// # Errors
    ///
    /// A transient store failure in any scan aborts the rest; completed
    /// scans' guard updates stand
    pub async fn run_all(&self) -> Result<SchedulerReport, BookingError> {
        let party_reminders = self.run_party_reminders().await?;
        let feedback_requests = self.run_feedback_requests().await?;
        let payment_due = self.run_payment_due().await?;
        Ok(SchedulerReport {
            party_reminders,
            feedback_requests,
            payment_due,
        })
    }

    /// Loads a customer, counting lookup misses instead of failing the scan
    async fn customer_for(
        &self,
        id: CustomerId,
        report: &mut ScanReport,
    ) -> Result<Option<Customer>, BookingError> {
        match self.store.get_customer(id).await {
            Ok(customer) => Ok(Some(customer)),
            Err(err) if err.is_transient() => Err(err.into()),
            Err(err) => {
                warn!(customer_id = %id, error = %err, "Could not load customer");
                report.errors += 1;
                Ok(None)
            }
        }
    }
}

//! Log-backed notification sender
//!
//! Customer email is handled by an external automation platform keyed
//! off structured log events, so the production sender writes one
//! `info!` line per notice with every field the template needs. If a
//! transactional email provider is wired in later it replaces this
//! adapter behind the same port.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument};

use core_kernel::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_booking::{
    BalanceDueNotice, BookingConfirmationNotice, FeedbackRequestNotice, NotificationSender,
    PartyReminderNotice, PaymentReceiptNotice,
};

/// Notification sender that emits structured log events
///
/// Every send succeeds; the downstream mail pipeline consumes the log
/// stream asynchronously.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl DomainPort for LogNotifier {}

#[async_trait]
impl HealthCheckable for LogNotifier {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "log-notifier".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: None,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl NotificationSender for LogNotifier {
    #[instrument(skip(self, notice), fields(order_number = %notice.order_number))]
    async fn send_booking_confirmation(
        &self,
        notice: &BookingConfirmationNotice,
    ) -> Result<(), PortError> {
        info!(
            notification = "booking_confirmation",
            to = %notice.to,
            parent_name = %notice.parent_name,
            order_number = %notice.order_number,
            party_date = %notice.party_date,
            venue = %notice.venue,
            total = %notice.total,
            deposit = %notice.deposit,
            "Booking confirmation queued"
        );
        Ok(())
    }

    #[instrument(skip(self, notice), fields(invoice_number = %notice.invoice_number))]
    async fn send_payment_receipt(
        &self,
        notice: &PaymentReceiptNotice,
    ) -> Result<(), PortError> {
        info!(
            notification = "payment_receipt",
            to = %notice.to,
            invoice_number = %notice.invoice_number,
            amount = %notice.amount,
            purpose = %notice.purpose,
            "Payment receipt queued"
        );
        Ok(())
    }

    #[instrument(skip(self, notice))]
    async fn send_party_reminder(&self, notice: &PartyReminderNotice) -> Result<(), PortError> {
        info!(
            notification = "party_reminder",
            to = %notice.to,
            parent_name = %notice.parent_name,
            party_date = %notice.party_date,
            start_time = %notice.start_time,
            venue = %notice.venue,
            "Party reminder queued"
        );
        Ok(())
    }

    #[instrument(skip(self, notice))]
    async fn send_feedback_request(
        &self,
        notice: &FeedbackRequestNotice,
    ) -> Result<(), PortError> {
        info!(
            notification = "feedback_request",
            to = %notice.to,
            parent_name = %notice.parent_name,
            child_name = %notice.child_name,
            "Feedback request queued"
        );
        Ok(())
    }

    #[instrument(skip(self, notice), fields(order_number = %notice.order_number))]
    async fn send_balance_due(&self, notice: &BalanceDueNotice) -> Result<(), PortError> {
        info!(
            notification = "balance_due",
            to = %notice.to,
            parent_name = %notice.parent_name,
            order_number = %notice.order_number,
            outstanding = %notice.outstanding,
            due_date = %notice.due_date,
            "Balance due notice queued"
        );
        Ok(())
    }
}

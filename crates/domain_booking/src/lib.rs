//! Booking Orchestration Domain
//!
//! The four services that run the booking lifecycle end to end:
//!
//! - **Intake** ([`intake::BookingIntakeService`]): one submission becomes
//!   customer, party, order, and safety checklist, atomically
//! - **Checkout** ([`checkout::CheckoutService`]): builds gateway sessions
//!   for the deposit and the balance, mutating nothing
//! - **Reconciliation** ([`reconciler::WebhookReconciler`]): settles gateway
//!   webhook events idempotently against the store's event ledger
//! - **Scheduling** ([`scheduler::ReminderScheduler`]): time-window scans
//!   for reminders, feedback requests, and balance-due notices
//!
//! The services speak to the outside world only through the
//! [`ports::BookingStore`] and [`ports::NotificationSender`] ports plus the
//! billing crate's payment gateway port, so they run unchanged against
//! Postgres or the in-memory store.

pub mod checkout;
pub mod error;
pub mod intake;
#[cfg(any(test, feature = "mock"))]
pub mod memory;
pub mod ports;
pub mod reconciler;
pub mod scheduler;

pub use checkout::CheckoutService;
pub use error::BookingError;
pub use intake::{BookingConfirmation, BookingIntakeService, BookingSubmission, IntakeConfig};
pub use ports::{
    BalanceDueNotice, BookingConfirmationNotice, BookingStore, FeedbackRequestNotice, NewBooking,
    NotificationOutcome, NotificationSender, PartyReminderNotice, PaymentReceiptNotice,
    SettlementCommit, SettlementUpdate,
};
pub use reconciler::{ReconcileOutcome, SettlementAction, SkipReason, WebhookReconciler};
pub use scheduler::{ReminderConfig, ReminderScheduler, ScanReport, SchedulerReport};

#[cfg(any(test, feature = "mock"))]
pub use memory::MemoryBookingStore;
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockNotificationSender;

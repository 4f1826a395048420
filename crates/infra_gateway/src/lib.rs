//! # Payment Gateway and Notification Adapters
//!
//! Outbound integrations for the booking platform:
//!
//! - **Stripe Checkout**: creates hosted payment sessions and verifies
//!   the signature on inbound webhook deliveries
//! - **Log notifier**: emits structured log events for customer
//!   notifications, consumed by the external mail pipeline
//!
//! ## Architecture
//!
//! Both adapters implement ports owned by the domain crates
//! ([`domain_billing::PaymentGateway`], `domain_booking::NotificationSender`),
//! so services never see an HTTP client or a log macro. Webhook
//! signature verification lives here rather than in the decoder:
//! the raw body must be checked before anything parses it.

pub mod notify;
pub mod stripe;

pub use notify::LogNotifier;
pub use stripe::{verify_webhook_signature, SignatureError, StripeConfig, StripeGateway};

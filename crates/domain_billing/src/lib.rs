//! Billing Domain - Invoices and Payment Gateway Boundary
//!
//! This crate owns everything that touches money moving between the
//! business and the payment gateway:
//!
//! - **Invoices**: receipts created after each settled payment, numbered
//!   sequentially per calendar year (`PP-INV-{YYYY}-{seq}`)
//! - **Gateway port**: the [`PaymentGateway`] trait for opening hosted
//!   checkout sessions, with a mock for tests
//! - **Webhook decoding**: typed decoding of the gateway's asynchronous
//!   settlement events
//!
//! Orders and parties react to these settlements in their own crates; the
//! reconciliation logic that ties them together lives in `domain_booking`.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{GatewayEvent, GatewayEventKind};
//!
//! let event = GatewayEvent::from_json(&webhook_body)?;
//! match event.kind {
//!     GatewayEventKind::CheckoutCompleted(session) => { /* settle */ }
//!     GatewayEventKind::Unrecognized { .. } => { /* acknowledge */ }
//!     _ => {}
//! }
//! ```

pub mod error;
pub mod gateway;
pub mod invoice;
pub mod webhook;

pub use error::BillingError;
pub use gateway::{CheckoutSession, CheckoutSessionRequest, PaymentGateway, PaymentPurpose};
pub use invoice::{Invoice, InvoiceDraft, InvoiceNumber, InvoiceStatus, InvoiceType, LineItem};
pub use webhook::{
    ChargePayload, CheckoutSessionPayload, EventMetadata, GatewayEvent, GatewayEventKind,
    PaymentIntentPayload,
};

#[cfg(any(test, feature = "mock"))]
pub use gateway::mock::MockPaymentGateway;

//! Party and Customer Domain
//!
//! This crate owns the scheduled event (the Party), the paying customer, and
//! the safety checklist snapshot captured at booking time.
//!
//! # Lifecycle
//!
//! A party moves through a small state machine driven entirely by payment
//! settlement:
//!
//! ```text
//! inquiry ──deposit paid──▶ confirmed ──balance paid──▶ completed
//!    │                          │
//!    └────────── full refund ───┴──▶ cancelled
//! ```
//!
//! Parties are created once at booking intake and only their `status` and the
//! two notification guard timestamps (`reminder_sent_at`, `feedback_sent_at`)
//! change afterwards. The customer row is mutated only at intake, never by
//! payment reconciliation. The safety checklist is immutable after capture.

pub mod checklist;
pub mod customer;
pub mod error;
pub mod party;

pub use checklist::SafetyChecklist;
pub use customer::{normalize_email, ContactInfo, Customer};
pub use error::PartyError;
pub use party::{ChildInfo, Party, PartyDetails, PartyStatus};

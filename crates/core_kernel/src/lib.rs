//! Core Kernel - Foundational types for the party booking platform
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money in integer minor units with deposit arithmetic
//! - Clock and venue-timezone helpers for schedule scans
//! - Strongly-typed identifiers
//! - Port abstractions shared by storage and gateway adapters

pub mod identifiers;
pub mod money;
pub mod ports;
pub mod temporal;

pub use identifiers::{ChecklistId, CustomerId, InvoiceId, OrderId, PartyId};
pub use money::{Currency, Money, MoneyError, DEFAULT_DEPOSIT_PERCENT};
pub use ports::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};
pub use temporal::{Clock, FixedClock, SystemClock, Timezone, UnknownTimezone};

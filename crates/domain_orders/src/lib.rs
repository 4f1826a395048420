//! Order domain for party bookings
//!
//! This crate owns the order aggregate, the money-facing half of a booking.
//! A booking creates one order; the payment gateway's webhook settlements
//! then move it through its lifecycle:
//!
//! ```text
//!          deposit paid          balance paid
//!   new ----------------> confirmed ----------> completed
//!    |                     |     ^                  |
//!    | checkout            |     +- partial refund -+
//!    | expired             | full refund            | full refund
//!    v                     v                        v
//! cancelled            cancelled                cancelled
//! ```
//!
//! Also here: order number generation (`PP{YYMM}-{6 base36}`) and the
//! catalog read models whose prices are snapshotted onto orders at intake.

pub mod catalog;
pub mod error;
pub mod events;
pub mod number;
pub mod order;

pub use catalog::{Activity, OrderItem, OrderItemKind, Package};
pub use error::OrderError;
pub use events::OrderEvent;
pub use number::OrderNumber;
pub use order::{Order, OrderStatus, Pricing};

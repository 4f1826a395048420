//! Domain Adapters
//!
//! This module provides adapter implementations for domain ports,
//! connecting domain interfaces to the PostgreSQL database layer.
//!
//! # Architecture
//!
//! The adapter:
//! - Implements the domain's port trait
//! - Translates between domain models and database row types
//! - Uses the repository layer for database operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresBookingStore;
//! use domain_booking::BookingStore;
//!
//! let store = PostgresBookingStore::new(pool);
//! let order = store.get_order(order_id).await?;
//! ```

pub mod booking;

pub use booking::PostgresBookingStore;

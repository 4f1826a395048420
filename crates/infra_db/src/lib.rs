//! Infrastructure Database Layer
//!
//! This crate provides the PostgreSQL persistence for the booking system.
//! It implements the `BookingStore` port from `domain_booking` on top of
//! SQLx, split into a repository layer that owns the SQL and an adapter
//! layer that translates rows to and from domain aggregates.
//!
//! All queries use the SQLx runtime API, so the crate builds without a
//! live database. The schema lives in plain SQL files under `migrations/`
//! at the workspace root and is applied externally.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig, PostgresBookingStore};
//!
//! let pool = create_pool(DatabaseConfig::new(&url)).await?;
//! let store = PostgresBookingStore::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::PostgresBookingStore;
pub use error::DatabaseError;
pub use pool::{create_pool, create_pool_from_url, DatabaseConfig, DatabasePool};

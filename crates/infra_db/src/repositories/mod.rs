//! Repository implementations for data access
//!
//! Repositories own the SQL. They speak in row types that mirror the
//! schema one to one; translation to and from domain types happens in
//! the adapter layer.

pub mod booking;

pub use booking::{
    BookingRepository, CatalogRow, ChecklistRow, CommitOutcome, CustomerRow, InvoiceRow,
    NewInvoiceRow, OrderRow, PartyRow,
};

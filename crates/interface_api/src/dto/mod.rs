//! Request/Response data transfer objects
//!
//! Request bodies deserialize into the domain submission types directly;
//! the types here shape what leaves the API.

pub mod booking;
pub mod payment;

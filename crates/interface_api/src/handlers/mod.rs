//! Request handlers

pub mod bookings;
pub mod checkout;
pub mod cron;
pub mod health;
pub mod webhooks;

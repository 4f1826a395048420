//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for common entities across the booking
//! platform. These fixtures are designed to be consistent and predictable
//! for unit tests.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use core_kernel::{
    Currency, CustomerId, FixedClock, InvoiceId, Money, OrderId, PartyId, Timezone,
};
use domain_booking::MemoryBookingStore;
use domain_orders::{Activity, Package};
use uuid::Uuid;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Price of the standard test package
    pub fn package_price() -> Money {
        Money::from_minor(450_000, Currency::AUD)
    }

    /// 30% deposit on the standard test package
    pub fn package_deposit() -> Money {
        Money::from_minor(135_000, Currency::AUD)
    }

    /// Balance remaining after the standard deposit
    pub fn package_balance() -> Money {
        Money::from_minor(315_000, Currency::AUD)
    }

    /// Price of a single test activity
    pub fn activity_price() -> Money {
        Money::from_minor(25_000, Currency::AUD)
    }

    /// Creates a zero amount
    pub fn aud_zero() -> Money {
        Money::zero(Currency::AUD)
    }

    /// Creates an NZD amount for currency mismatch tests
    pub fn nzd_100() -> Money {
        Money::from_minor(10_000, Currency::NZD)
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// The venue's timezone
    pub fn brisbane() -> Timezone {
        "Australia/Brisbane".parse().unwrap()
    }

    /// The instant most scenarios book at: 09:00 on 2025-07-14 in Brisbane
    pub fn booking_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 13, 23, 0, 0).unwrap()
    }

    /// Standard party date, well clear of the booking instant
    pub fn party_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 2).unwrap()
    }

    /// Standard party start time (venue-local)
    pub fn party_start_time() -> NaiveTime {
        NaiveTime::from_hms_opt(14, 0, 0).unwrap()
    }

    /// Clock pinned to the standard booking instant
    pub fn fixed_clock() -> FixedClock {
        FixedClock::new(Self::booking_instant())
    }
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    /// Creates a deterministic order ID for testing
    pub fn order_id() -> OrderId {
        OrderId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap())
    }

    /// Creates a deterministic party ID for testing
    pub fn party_id() -> PartyId {
        PartyId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440002").unwrap())
    }

    /// Creates a deterministic customer ID for testing
    pub fn customer_id() -> CustomerId {
        CustomerId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440003").unwrap())
    }

    /// Creates a deterministic invoice ID for testing
    pub fn invoice_id() -> InvoiceId {
        InvoiceId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440004").unwrap())
    }
}

/// Fixture for catalog test data
///
/// Mirrors the seeded production catalog so priced totals line up across
/// unit, service, and HTTP tests.
pub struct CatalogFixtures;

impl CatalogFixtures {
    pub fn packages() -> Vec<Package> {
        vec![
            Package {
                id: "pkg_superhero".to_string(),
                name: "Superhero Spectacular".to_string(),
                price: Money::from_minor(450_000, Currency::AUD),
            },
            Package {
                id: "pkg_princess".to_string(),
                name: "Princess Castle".to_string(),
                price: Money::from_minor(420_000, Currency::AUD),
            },
            Package {
                id: "pkg_dinosaur".to_string(),
                name: "Dinosaur Discovery".to_string(),
                price: Money::from_minor(380_000, Currency::AUD),
            },
        ]
    }

    pub fn activities() -> Vec<Activity> {
        vec![
            Activity {
                id: "act_face_painting".to_string(),
                name: "Face Painting".to_string(),
                price: Money::from_minor(15_000, Currency::AUD),
            },
            Activity {
                id: "act_magic_show".to_string(),
                name: "Magic Show".to_string(),
                price: Money::from_minor(25_000, Currency::AUD),
            },
            Activity {
                id: "act_balloon_art".to_string(),
                name: "Balloon Art".to_string(),
                price: Money::from_minor(12_000, Currency::AUD),
            },
        ]
    }

    /// An in-memory store pre-seeded with the standard catalog
    pub fn seeded_store() -> MemoryBookingStore {
        MemoryBookingStore::with_catalog(Self::packages(), Self::activities())
    }
}

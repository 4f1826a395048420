//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use core_kernel::{Currency, CustomerId, InvoiceId, Money, OrderId, PartyId};
use proptest::prelude::*;

/// Strategy for generating valid Currency values
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::AUD),
        Just(Currency::NZD),
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::GBP),
    ]
}

/// Strategy for generating positive amounts in minor units
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..100_000_000i64
}

/// Strategy for generating non-negative amounts in minor units
pub fn amount_minor_strategy() -> impl Strategy<Value = i64> {
    0i64..100_000_000i64
}

/// Strategy for generating valid Money values with positive amounts
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    (positive_amount_minor_strategy(), currency_strategy())
        .prop_map(|(amount, currency)| Money::from_minor(amount, currency))
}

/// Strategy for generating valid Money values (zero allowed)
pub fn money_strategy() -> impl Strategy<Value = Money> {
    (amount_minor_strategy(), currency_strategy())
        .prop_map(|(amount, currency)| Money::from_minor(amount, currency))
}

/// Strategy for generating valid AUD Money values
pub fn aud_money_strategy() -> impl Strategy<Value = Money> {
    positive_amount_minor_strategy().prop_map(|amount| Money::from_minor(amount, Currency::AUD))
}

/// Strategy for generating deposit percentages (0% to 100%)
pub fn deposit_percent_strategy() -> impl Strategy<Value = u8> {
    0u8..=100u8
}

/// Strategy for generating bookable guest counts (1 to 500)
pub fn guest_count_strategy() -> impl Strategy<Value = u32> {
    1u32..=500u32
}

/// Strategy for generating valid child ages (1 to 17)
pub fn child_age_strategy() -> impl Strategy<Value = u8> {
    1u8..18u8
}

/// Strategy for generating party dates within 2025
pub fn party_date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..365i64)
        .prop_map(|days| NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Duration::days(days))
}

/// Strategy for generating party start times on the half hour (08:00 to 17:30)
pub fn start_time_strategy() -> impl Strategy<Value = NaiveTime> {
    (8u32..18u32, prop_oneof![Just(0u32), Just(30u32)])
        .prop_map(|(hour, minute)| NaiveTime::from_hms_opt(hour, minute, 0).unwrap())
}

/// Strategy for generating valid timestamps within 2025
pub fn timestamp_2025_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..365i64)
        .prop_map(|days| Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::days(days))
}

/// Strategy for generating OrderId
pub fn order_id_strategy() -> impl Strategy<Value = OrderId> {
    any::<[u8; 16]>().prop_map(|bytes| OrderId::from_uuid(uuid::Uuid::from_bytes(bytes)))
}

/// Strategy for generating PartyId
pub fn party_id_strategy() -> impl Strategy<Value = PartyId> {
    any::<[u8; 16]>().prop_map(|bytes| PartyId::from_uuid(uuid::Uuid::from_bytes(bytes)))
}

/// Strategy for generating CustomerId
pub fn customer_id_strategy() -> impl Strategy<Value = CustomerId> {
    any::<[u8; 16]>().prop_map(|bytes| CustomerId::from_uuid(uuid::Uuid::from_bytes(bytes)))
}

/// Strategy for generating InvoiceId
pub fn invoice_id_strategy() -> impl Strategy<Value = InvoiceId> {
    any::<[u8; 16]>().prop_map(|bytes| InvoiceId::from_uuid(uuid::Uuid::from_bytes(bytes)))
}

/// Strategy for generating catalog package identifiers
pub fn package_id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("pkg_superhero".to_string()),
        Just("pkg_princess".to_string()),
        Just("pkg_dinosaur".to_string()),
    ]
}

/// Strategy for generating catalog activity identifiers
pub fn activity_id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("act_face_painting".to_string()),
        Just("act_magic_show".to_string()),
        Just("act_balloon_art".to_string()),
    ]
}

/// Strategy for generating valid email addresses
pub fn email_strategy() -> impl Strategy<Value = String> {
    ("[a-z]{5,10}", "[a-z]{3,8}").prop_map(|(local, domain)| format!("{}@{}.com", local, domain))
}

/// Strategy for generating Australian mobile numbers
pub fn phone_strategy() -> impl Strategy<Value = String> {
    (10u32..100u32, 100u32..1000u32, 100u32..1000u32)
        .prop_map(|(a, b, c)| format!("+61 4{:02} {:03} {:03}", a, b, c))
}

/// Strategy for generating names
pub fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,10}".prop_map(|s| s)
}

//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for domain types that give
//! more meaningful error messages than standard assertions.

use core_kernel::Money;
use domain_booking::ScanReport;
use domain_orders::{Order, OrderStatus};
use domain_party::{Party, PartyStatus};

/// Asserts that two Money values are equal, checking currency first
///
/// # Panics
///
/// Panics if the currencies differ or the minor-unit amounts differ
pub fn assert_money_eq(actual: &Money, expected: &Money) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    assert_eq!(
        actual.amount_minor(),
        expected.amount_minor(),
        "Money amounts differ: actual={}, expected={}",
        actual,
        expected
    );
}

/// Asserts that a Money value is positive
pub fn assert_money_positive(money: &Money) {
    assert!(
        money.is_positive(),
        "Expected positive money, got {}",
        money
    );
}

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: &Money) {
    assert!(money.is_zero(), "Expected zero money, got {}", money);
}

/// Asserts that money values sum to a total
///
/// # Panics
///
/// Panics if the parts mix currencies or their sum doesn't equal the total
pub fn assert_money_sum_equals(parts: &[Money], total: &Money) {
    let sum = parts.iter().fold(Money::zero(total.currency()), |acc, m| {
        acc.checked_add(m).expect("Currency mismatch in sum")
    });

    assert_eq!(
        sum.amount_minor(),
        total.amount_minor(),
        "Sum of parts ({}) doesn't equal total ({})",
        sum,
        total
    );
}

/// Asserts that an order is in the expected lifecycle status
pub fn assert_order_status(order: &Order, expected: OrderStatus) {
    assert_eq!(
        order.status(),
        expected,
        "Order {} is {:?}, expected {:?}",
        order.order_number(),
        order.status(),
        expected
    );
}

/// Asserts that a party is in the expected lifecycle status
pub fn assert_party_status(party: &Party, expected: PartyStatus) {
    assert_eq!(
        party.status, expected,
        "Party {} is {:?}, expected {:?}",
        party.id, party.status, expected
    );
}

/// Asserts that a reminder scan completed without delivery errors
pub fn assert_scan_clean(report: &ScanReport) {
    assert_eq!(
        report.errors, 0,
        "Scan reported errors: sent={}, skipped={}, errors={}",
        report.sent, report.skipped, report.errors
    );
}

/// Asserts that a result is Ok and returns the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// Asserts that a result is Err and returns the error
#[macro_export]
macro_rules! assert_err {
    ($result:expr) => {
        match $result {
            Ok(value) => panic!("Expected Err, got Ok: {:?}", value),
            Err(e) => e,
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(value) => panic!("{}: got Ok({:?})", $msg, value),
            Err(e) => e,
        }
    };
}

/// Asserts that an error matches a specific variant
#[macro_export]
macro_rules! assert_err_variant {
    ($result:expr, $pattern:pat) => {
        match $result {
            Ok(value) => panic!(
                "Expected Err matching {}, got Ok({:?})",
                stringify!($pattern),
                value
            ),
            Err(ref e) => {
                assert!(
                    matches!(e, $pattern),
                    "Error {:?} does not match pattern {}",
                    e,
                    stringify!($pattern)
                );
            }
        }
    };
}

//! Money types in integer minor units
//!
//! Monetary amounts are stored as integer minor units (cents) so they match
//! the payment gateway's wire format exactly and never accumulate rounding
//! drift. Decimal conversion exists only for display and reporting.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Deposit percentage applied to new orders unless configured otherwise.
pub const DEFAULT_DEPOSIT_PERCENT: u8 = 30;

/// Currency codes following ISO 4217
///
/// Every supported currency carries two minor-unit digits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    AUD,
    NZD,
    USD,
    EUR,
    GBP,
}

impl Currency {
    /// Returns the number of minor-unit digits for this currency
    pub const fn decimal_places(&self) -> u32 {
        2
    }

    /// Returns the currency symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::AUD => "A$",
            Currency::NZD => "NZ$",
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::GBP => "£",
        }
    }

    /// Returns the ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::AUD => "AUD",
            Currency::NZD => "NZD",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AUD" => Ok(Currency::AUD),
            "NZD" => Ok(Currency::NZD),
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            other => Err(MoneyError::UnknownCurrency(other.to_string())),
        }
    }
}

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot operate on {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    #[error("Overflow during calculation")]
    Overflow,
}

/// A monetary amount with associated currency
///
/// Amounts are whole minor units, the same representation the payment
/// gateway uses for `unit_amount` and `amount_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount_minor: i64,
    currency: Currency,
}

impl Money {
    /// Creates Money from an amount in minor units (e.g. cents)
    pub const fn from_minor(amount_minor: i64, currency: Currency) -> Self {
        Self {
            amount_minor,
            currency,
        }
    }

    /// Creates a zero amount in the specified currency
    pub const fn zero(currency: Currency) -> Self {
        Self {
            amount_minor: 0,
            currency,
        }
    }

    /// Returns the amount in minor units
    pub const fn amount_minor(&self) -> i64 {
        self.amount_minor
    }

    /// Returns the currency
    pub const fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero
    pub const fn is_zero(&self) -> bool {
        self.amount_minor == 0
    }

    /// Returns true if the amount is strictly positive
    pub const fn is_positive(&self) -> bool {
        self.amount_minor > 0
    }

    /// Checked addition that fails on currency mismatch or overflow
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        self.amount_minor
            .checked_add(other.amount_minor)
            .map(|sum| Self::from_minor(sum, self.currency))
            .ok_or(MoneyError::Overflow)
    }

    /// Checked subtraction that fails on currency mismatch or overflow
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        self.amount_minor
            .checked_sub(other.amount_minor)
            .map(|diff| Self::from_minor(diff, self.currency))
            .ok_or(MoneyError::Overflow)
    }

    /// Computes a percentage deposit, rounding half a cent upwards
    ///
    /// For any `percent <= 100` the result never exceeds the original amount,
    /// so `balance_after(deposit)` is never negative.
    pub fn deposit(&self, percent: u8) -> Money {
        let scaled = self.amount_minor as i128 * percent as i128 + 50;
        Self::from_minor((scaled / 100) as i64, self.currency)
    }

    /// Returns the amount still owed after the given payment
    pub fn balance_after(&self, paid: &Money) -> Result<Money, MoneyError> {
        self.checked_sub(paid)
    }

    /// Classifies a refund: full only when it matches the charge exactly
    ///
    /// Anything short of the charged amount is partial, down to the cent.
    pub fn is_full_refund(charged: &Money, refunded: &Money) -> bool {
        charged.currency == refunded.currency && charged.amount_minor == refunded.amount_minor
    }

    /// Converts to a decimal in major units, e.g. 450000 minor -> 4500.00
    pub fn as_decimal(&self) -> Decimal {
        Decimal::new(self.amount_minor, self.currency.decimal_places())
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.currency.symbol(), self.as_decimal())
    }
}

//! Human-facing order number generation
//!
//! Order numbers follow the format `PP{YYMM}-{XXXXXX}` where `YYMM` is the
//! creation year and month and the suffix is six random base36 characters,
//! for example `PP2507-K4T9ZA`. The suffix is random rather than sequential
//! so numbers cannot be enumerated from a receipt. Uniqueness is enforced by
//! the store; callers regenerate on a duplicate.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::OrderError;

const SUFFIX_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SUFFIX_LEN: usize = 6;

/// A validated order number such as `PP2507-K4T9ZA`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generates a fresh order number for the given instant
    ///
    /// # Arguments
    ///
    /// * `now` - Instant used for the `YYMM` prefix
    /// * `rng` - Randomness source for the base36 suffix
    pub fn generate(now: DateTime<Utc>, rng: &mut impl Rng) -> Self {
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
            .collect();
        Self(format!(
            "PP{:02}{:02}-{}",
            now.year() % 100,
            now.month(),
            suffix
        ))
    }

    /// Returns the order number as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderNumber {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        let well_formed = bytes.len() == 7 + SUFFIX_LEN
            && bytes.starts_with(b"PP")
            && bytes[2..6].iter().all(u8::is_ascii_digit)
            && bytes[6] == b'-'
            && bytes[7..].iter().all(|b| SUFFIX_ALPHABET.contains(b));
        if well_formed {
            Ok(Self(s.to_string()))
        } else {
            Err(OrderError::MalformedOrderNumber(s.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn july_2025() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 14, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_generated_number_has_expected_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let number = OrderNumber::generate(july_2025(), &mut rng);
        let s = number.as_str();

        assert_eq!(s.len(), 13);
        assert!(s.starts_with("PP2507-"));
        assert!(s[7..].bytes().all(|b| SUFFIX_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_generated_number_round_trips_through_parse() {
        let mut rng = StdRng::seed_from_u64(42);
        let number = OrderNumber::generate(july_2025(), &mut rng);
        let parsed: OrderNumber = number.as_str().parse().unwrap();
        assert_eq!(parsed, number);
    }

    #[test]
    fn test_month_prefix_is_zero_padded() {
        let mut rng = StdRng::seed_from_u64(1);
        let january = Utc.with_ymd_and_hms(2026, 1, 3, 8, 0, 0).unwrap();
        let number = OrderNumber::generate(january, &mut rng);
        assert!(number.as_str().starts_with("PP2601-"));
    }

    #[test]
    fn test_rejects_malformed_numbers() {
        for bad in [
            "PP2507K4T9ZA",    // missing separator
            "PX2507-K4T9ZA",   // wrong prefix
            "PP25O7-K4T9ZA",   // letter in the date segment
            "PP2507-k4t9za",   // lowercase suffix
            "PP2507-K4T9Z",    // short suffix
            "PP2507-K4T9ZAB",  // long suffix
            "PP-INV-2025-001", // invoice number, not an order number
            "",
        ] {
            assert!(
                bad.parse::<OrderNumber>().is_err(),
                "expected {bad:?} to be rejected"
            );
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn generated_numbers_always_parse(seed: u64, secs in 0i64..4_000_000_000) {
                let mut rng = StdRng::seed_from_u64(seed);
                let now = Utc.timestamp_opt(secs, 0).unwrap();
                let number = OrderNumber::generate(now, &mut rng);
                prop_assert!(number.as_str().parse::<OrderNumber>().is_ok());
            }
        }
    }
}

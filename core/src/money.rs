//! Money value object (minor-unit based to avoid floating point errors).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

/// A non-negative currency amount stored in minor units (cents).
///
/// Prices are fixed-point with two decimal places. All arithmetic is
/// checked; the unchecked variants saturate instead of panicking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Returns the amount in major units (rounded down)
    #[must_use]
    pub const fn major(&self) -> u64 {
        self.0 / 100
    }

    /// Returns the fractional minor units (`0..100`)
    #[must_use]
    pub const fn minor(&self) -> u64 {
        self.0 % 100
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Adds two money amounts, saturating at `u64::MAX` cents
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Multiplies money by a quantity with overflow checking
    #[must_use]
    pub const fn checked_multiply(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.major(), self.minor())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Money::from_cents(700).to_string(), "7.00");
        assert_eq!(Money::from_cents(350).to_string(), "3.50");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
    }

    #[test]
    fn test_multiply_line_total() {
        let price = Money::from_cents(350);
        assert_eq!(price.checked_multiply(2), Some(Money::from_cents(700)));
        assert_eq!(Money::from_cents(u64::MAX).checked_multiply(2), None);
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::from_cents(100), Money::from_cents(250)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_cents(350));
    }

    proptest! {
        #[test]
        fn prop_display_keeps_every_cent(cents in 0u64..10_000_000_000) {
            let rendered = Money::from_cents(cents).to_string();
            let (whole, frac) = rendered.split_once('.').unwrap_or((&rendered, ""));
            prop_assert_eq!(frac.len(), 2);
            prop_assert_eq!(format!("{whole}{frac}").parse::<u64>().ok(), Some(cents));
        }

        #[test]
        fn prop_multiply_matches_repeated_add(cents in 0u64..1_000_000, qty in 1u32..50) {
            let price = Money::from_cents(cents);
            let repeated = (0..qty).fold(Money::ZERO, |acc, _| acc.saturating_add(price));
            prop_assert_eq!(price.checked_multiply(qty), Some(repeated));
        }
    }
}

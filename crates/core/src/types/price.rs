//! Type-safe price representation using decimal arithmetic.
//!
//! The backend stores prices as plain JSON numbers in rupees. Arithmetic is
//! done in [`Decimal`] so that totals and tax are exact; rounding to two
//! decimal places happens only when a value is formatted for display.

use core::fmt;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Symbol used when formatting amounts for display.
pub const CURRENCY_SYMBOL: &str = "₹";

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Prices may not be negative.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
    /// The value is not a finite number.
    #[error("price is not a finite number")]
    NotFinite,
    /// The string is not a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
}

/// A non-negative unit price.
///
/// Serialized as a JSON number; deserializes from either a number or a
/// numeric string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// The zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount.normalize()))
    }

    /// Create a price from a whole number of rupees.
    #[must_use]
    pub fn from_whole(rupees: u32) -> Self {
        Self(Decimal::from(rupees))
    }

    /// Returns the amount as a decimal.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units, saturating at `Decimal::MAX`.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Decimal {
        self.0.saturating_mul(Decimal::from(quantity))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_amount(self.0))
    }
}

impl std::str::FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = s
            .trim()
            .parse::<Decimal>()
            .map_err(|_| PriceError::Invalid(s.to_owned()))?;
        Self::new(amount)
    }
}

impl TryFrom<f64> for Price {
    type Error = PriceError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(PriceError::NotFinite);
        }
        let amount = Decimal::from_f64(value).ok_or(PriceError::NotFinite)?;
        Self::new(amount)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(whole) = self.0.to_u64().filter(|_| self.0.fract().is_zero()) {
            return serializer.serialize_u64(whole);
        }
        match self.0.to_f64() {
            Some(value) => serializer.serialize_f64(value),
            None => serializer.serialize_str(&self.0.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}

struct PriceVisitor;

impl Visitor<'_> for PriceVisitor {
    type Value = Price;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative number or numeric string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Price, E> {
        Price::new(Decimal::from(v)).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Price, E> {
        Price::new(Decimal::from(v)).map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Price, E> {
        Price::try_from(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Price, E> {
        v.parse().map_err(E::custom)
    }
}

/// Format an amount for display, rounded half away from zero to two places.
///
/// ```
/// use rust_decimal::Decimal;
/// use shopaholic_core::format_amount;
///
/// assert_eq!(format_amount(Decimal::new(118_000, 1)), "₹11800.00");
/// assert_eq!(format_amount(Decimal::new(1_005, 3)), "₹1.01");
/// ```
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{CURRENCY_SYMBOL}{rounded:.2}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative() {
        assert!(matches!(
            Price::new(Decimal::from(-1)),
            Err(PriceError::Negative(_))
        ));
        assert!(Price::try_from(f64::NAN).is_err());
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let from_int: Price = serde_json::from_str("5000").unwrap();
        let from_float: Price = serde_json::from_str("19.99").unwrap();
        let from_str: Price = serde_json::from_str("\"19.99\"").unwrap();

        assert_eq!(from_int, Price::from_whole(5000));
        assert_eq!(from_float.amount(), Decimal::new(1999, 2));
        assert_eq!(from_float, from_str);
        assert!(serde_json::from_str::<Price>("-3").is_err());
        assert!(serde_json::from_str::<Price>("\"free\"").is_err());
    }

    #[test]
    fn test_serialize_as_number() {
        assert_eq!(serde_json::to_string(&Price::from_whole(100)).unwrap(), "100");
        let price: Price = "12.5".parse().unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "12.5");
    }

    #[test]
    fn test_times() {
        assert_eq!(Price::from_whole(5000).times(2), Decimal::from(10_000));
        assert_eq!(Price::from_whole(5000).times(0), Decimal::ZERO);
        let huge: Price = "50000000000000000000000000000".parse().unwrap();
        assert_eq!(huge.times(2), Decimal::MAX);
    }

    #[test]
    fn test_display_rounds_to_two_places() {
        let price: Price = "99.999".parse().unwrap();
        assert_eq!(price.to_string(), "₹100.00");
        assert_eq!(Price::ZERO.to_string(), "₹0.00");
    }
}

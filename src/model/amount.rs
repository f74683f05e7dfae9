//! Amount type for handling monetary values.
//!
//! This module provides the `Amount` type which wraps `Decimal` and handles
//! values that arrive from the backend as either JSON numbers or numeric
//! strings.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Represents a monetary amount.
///
/// This type wraps `Decimal` and provides custom serialization and
/// deserialization so that `1200`, `1200.5` and `"1200.50"` all parse to the
/// same value. Backend payloads use plain JSON numbers; the string form shows
/// up in hand-written fixtures and query output.
///
/// # Examples
///
/// ```
/// # use expendash::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("1200.50").unwrap();
/// assert_eq!(amount.to_string(), "1,200.50");
/// assert_eq!(amount.fixed(), "1200.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    value: Decimal,
}

impl Amount {
    /// Creates a new Amount from a Decimal value.
    pub const fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// The amount with exactly two decimal places and no thousands
    /// separators, e.g. `1200.00`. This is the form chart titles and slice
    /// labels use.
    pub fn fixed(&self) -> String {
        format!("{:.2}", self.value)
    }
}

/// An error that can occur when parsing strings into `Amount` values.
#[derive(Debug)]
pub struct AmountError(String);

impl fmt::Display for AmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid amount: {}", self.0)
    }
}

impl std::error::Error for AmountError {}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }
        // Tolerate thousands separators in hand-entered values.
        let without_commas = trimmed.replace(',', "");
        Decimal::from_str(&without_commas)
            .map(Amount::new)
            .map_err(|e| AmountError(format!("{s}: {e}")))
    }
}

impl fmt::Display for Amount {
    /// Two decimal places with thousands separators, e.g. `1,200.00`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sign, num) = if self.value.is_sign_negative() && !self.value.is_zero() {
            ("-", self.value.abs())
        } else {
            ("", self.value)
        };
        write!(
            f,
            "{sign}{}",
            format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
        )
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.fixed())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Decimal::from_f64(n)
                .map(Amount::new)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid amount: {n}"))),
            Raw::Text(s) => Amount::from_str(&s).map_err(serde::de::Error::custom),
        }
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

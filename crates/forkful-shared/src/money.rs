//! Monetary amounts held as integer cents.
//!
//! Prices arrive as decimal numbers or strings ("9.99") and leave as JSON
//! numbers with at most two decimals. Internally everything is cents so that
//! `9.99 * 3` is exactly `29.97`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Round a decimal amount to the nearest cent. Non-finite input is rejected.
    pub fn from_decimal(amount: f64) -> Option<Self> {
        if !amount.is_finite() {
            return None;
        }
        let cents = (amount * 100.0).round();
        if cents.abs() > i64::MAX as f64 {
            return None;
        }
        Some(Self(cents as i64))
    }

    /// Parse a user-supplied price string such as `"9.99"` or `" 12 "`.
    pub fn parse(input: &str) -> Option<Self> {
        input.trim().parse::<f64>().ok().and_then(Self::from_decimal)
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// `None` on overflow.
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// `None` on overflow.
    pub fn checked_mul(self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    /// Sum of `amounts`, or `None` as soon as the running total overflows.
    pub fn checked_sum(amounts: impl IntoIterator<Item = Money>) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, amount| acc.checked_add(amount))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        Money::from_decimal(amount)
            .ok_or_else(|| serde::de::Error::custom("amount must be a finite number"))
    }
}

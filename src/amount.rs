//! Fixed-point monetary amount with 4 decimal places precision.
//!
//! Uses `rust_decimal` internally with scale enforcement so that summing
//! thousands of debt amounts never drifts the way `f64` accumulation does.

use log::warn;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

/// A monetary value that maintains exactly 4 decimal places of precision.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use debt_cleanser::Amount;
///
/// let amount = Amount::from_str("1234.5").unwrap();
/// assert_eq!(amount.to_string(), "1234.5000");
/// assert_eq!(amount.to_brl(), "R$ 1.234,50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    /// The number of decimal places to maintain.
    pub const SCALE: u32 = 4;

    /// Zero value.
    pub const ZERO: Self = Amount(Decimal::ZERO);

    /// Largest representable amount; sums saturate here.
    pub const MAX: Self = Amount(Decimal::MAX);

    /// Smallest representable amount.
    pub const MIN: Self = Amount(Decimal::MIN);

    /// Creates a new `Amount` from a `Decimal`, normalizing to 4 decimal places.
    pub fn new(value: Decimal) -> Self {
        let mut normalized = value;
        normalized.rescale(Self::SCALE);
        Amount(normalized)
    }

    /// Converts a spreadsheet float. Non-finite values become zero.
    pub fn from_f64(value: f64) -> Self {
        Decimal::from_f64(value).map(Amount::new).unwrap_or(Amount::ZERO)
    }

    /// Returns `true` if this value is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns `true` if this value is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Formats as Brazilian currency, e.g. `R$ 1.234,56`.
    pub fn to_brl(&self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let plain = format!("{:.2}", rounded.abs());
        let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (i, ch) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        format!("R$ {}{},{}", sign, grouped, frac_part)
    }

    /// Adds two amounts, clamping to [`Amount::MAX`] / [`Amount::MIN`]
    /// instead of overflowing.
    pub fn saturating_add(self, rhs: Amount) -> Amount {
        match self.0.checked_add(rhs.0) {
            Some(sum) => Amount::new(sum),
            None => {
                warn!("Amount overflow adding {} and {}, total saturated", self, rhs);
                if rhs.0.is_sign_negative() {
                    Amount::MIN
                } else {
                    Amount::MAX
                }
            }
        }
    }

    /// Returns `self / total` as a percentage, or zero for an empty total.
    pub fn percent_of(&self, total: Amount) -> Decimal {
        if total.is_zero() {
            return Decimal::ZERO;
        }
        let ratio = self
            .0
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|scaled| scaled.checked_div(total.0))
            .or_else(|| {
                self.0
                    .checked_div(total.0)
                    .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            });
        ratio.map(|r| r.round_dp(2)).unwrap_or(Decimal::ZERO)
    }
}

impl FromStr for Amount {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let decimal = Decimal::from_str(trimmed)?;
        Ok(Amount::new(decimal))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.saturating_add(rhs);
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:.4}", self.0))
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Config files write thresholds as JSON numbers, exports as strings.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) if n.is_finite() => Ok(Amount::from_f64(n)),
            Raw::Number(n) => Err(serde::de::Error::custom(format!("invalid amount {}", n))),
            Raw::Text(s) => Amount::from_str(&s).map_err(serde::de::Error::custom),
        }
    }
}

//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A scheduling with services R$ 40.00 + R$ 25.00 and 20% off must be    │
//! │  exactly R$ 52.00, every time, on every machine.                        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    6500 cents × (10000 - 2000) / 10000 = 5200 cents                    │
//! │    Rounding happens once, explicitly, at the cent boundary             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use daycare_core::money::Money;
//!
//! let bath = Money::from_cents(4000); // R$ 40.00
//! let nails: Money = "25.00".parse().unwrap();
//!
//! let gross: Money = [bath, nails].into_iter().sum();
//! assert_eq!(gross.cents(), 6500);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::DiscountRate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in cents (centavos for BRL).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for differences and adjustments
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Transparent in SQL**: stored as an INTEGER column of cents
///
/// ## Where Money is Used
/// ```text
/// Service.price ──► Σ attached services ──► Scheduling.gross_total_value
///                                                  │
///                                   apply_discount(percentage_discount)
///                                                  │
///                                                  ▼
///                                       Scheduling.total_value
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use daycare_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents R$ 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (reais) portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Adds two amounts, clamping at the bounds of `i64` instead of
    /// overflowing.
    #[inline]
    pub const fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    /// Applies a percentage discount and returns the discounted value.
    ///
    /// ## Rounding
    /// The exact result `cents × (10000 − bps) / 10000` is rounded to the
    /// nearest cent, ties to even. This is how a two-place decimal column
    /// quantizes the value, so the stored total is the same no matter where
    /// it is computed.
    ///
    /// ## Example
    /// ```rust
    /// use daycare_core::money::Money;
    /// use daycare_core::types::DiscountRate;
    ///
    /// let gross = Money::from_cents(8000); // R$ 80.00
    /// let total = gross.apply_discount(DiscountRate::from_bps(1000)); // 10%
    /// assert_eq!(total.cents(), 7200);
    /// ```
    pub fn apply_discount(&self, rate: DiscountRate) -> Money {
        // i128 keeps the intermediate product from overflowing
        let remaining_bps = 10_000_i128 - rate.bps() as i128;
        let scaled = self.0 as i128 * remaining_bps;
        Money::from_cents(div_round_half_even(scaled, 10_000) as i64)
    }

    /// Average of `total` over `count` entries, rounded half-to-even to the
    /// cent. Zero entries average to zero.
    pub fn average(total: Money, count: i64) -> Money {
        if count <= 0 {
            return Money::zero();
        }
        Money::from_cents(div_round_half_even(total.0 as i128, count as i128) as i64)
    }
}

/// Integer division rounding to the nearest integer, ties to even.
fn div_round_half_even(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator.div_euclid(denominator);
    let remainder = numerator.rem_euclid(denominator);
    let twice = remainder * 2;

    if twice > denominator || (twice == denominator && quotient % 2 != 0) {
        quotient + 1
    } else {
        quotient
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money the way the daycare prints it on notes: `R$ 10.99`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}R$ {}.{:02}", sign, self.major().abs(), self.cents_part())
    }
}

/// Parses a decimal amount with at most two fractional digits.
///
/// `"40"`, `"40.5"` and `"40.00"` are accepted; `"40.005"`, `"4O"` and `""`
/// are rejected. A comma is accepted as the decimal separator.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let normalized = digits.replace(',', ".");
        let (major, minor) = match normalized.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (normalized.as_str(), ""),
        };

        if major.is_empty() || !major.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected a decimal number"));
        }
        if minor.len() > 2 || !minor.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("at most two decimal places"));
        }

        let major: i64 = major
            .parse()
            .map_err(|_| invalid("amount is too large"))?;
        let minor: i64 = if minor.is_empty() {
            0
        } else {
            // "5" means 50 cents, "05" means 5 cents
            format!("{:0<2}", minor)
                .parse()
                .map_err(|_| invalid("expected a decimal number"))?
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(|| invalid("amount is too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Summing an empty iterator yields zero. The sum saturates, so a
/// pathological price list can never panic.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Money::saturating_add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

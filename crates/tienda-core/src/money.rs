//! # Money Module
//!
//! Provides the `Money` type for monetary values in the smallest currency
//! unit (Colombian pesos).
//!
//! ## Integer Money
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every amount is an i64 count of pesos.                                 │
//! │                                                                         │
//! │    unit prices  ──► subtotal ──► discount ──► shipping ──► total       │
//! │                                                                         │
//! │  Percentages are applied with integer math and rounded DOWN, so a      │
//! │  discount never credits a fractional unit.                             │
//! │                                                                         │
//! │    170000 × 10% = 17000                                                │
//! │        999 × 15% =   149   (149.85 → 149)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tienda_core::money::Money;
//!
//! let price = Money::from_units(80_000);
//! let total = price.checked_add(Money::from_units(90_000)).unwrap();
//! assert_eq!(total.units(), 170_000);
//! assert_eq!(total.percent_floor(10).units(), 17_000);
//!
//! assert!(Money::from_units(i64::MAX).checked_add(Money::from_units(1)).is_none());
//! ```
//!
//! Prices come from the cart as given, so every sum on the checkout path
//! goes through the checked operations. The `+`/`-` operators are for
//! amounts already known to be small.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Where Money is Used
/// ```text
/// CartItem.unit_price ──► Cart.subtotal ──► PriceBreakdown ──► Order
///                                                   │
///                                                   └──► MetricsSnapshot
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from currency units.
    ///
    /// ## Example
    /// ```rust
    /// use tienda_core::money::Money;
    ///
    /// let price = Money::from_units(15_000);
    /// assert_eq!(price.units(), 15_000);
    /// ```
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    /// Returns the value in currency units.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns `percent`% of this amount, rounded down.
    ///
    /// Computed in i128 so large amounts cannot overflow the multiplication.
    ///
    /// ## Example
    /// ```rust
    /// use tienda_core::money::Money;
    ///
    /// assert_eq!(Money::from_units(999).percent_floor(15).units(), 149);
    /// assert_eq!(Money::from_units(170_000).percent_floor(100).units(), 170_000);
    /// ```
    pub fn percent_floor(&self, percent: u8) -> Money {
        let scaled = (self.0 as i128 * percent as i128).div_euclid(100);
        Money::from_units(scaled as i64)
    }

    /// `self + other`, or `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(units) => Some(Money(units)),
            None => None,
        }
    }

    /// `self - other`, or `None` on overflow.
    #[inline]
    pub const fn checked_sub(self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(units) => Some(Money(units)),
            None => None,
        }
    }

    /// `self + other`, clamped at the i64 bounds.
    #[inline]
    pub const fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    /// Sums `amounts`, or `None` if any partial sum overflows.
    pub fn checked_sum<I>(amounts: I) -> Option<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }

    /// Integer division rounded down, zero when `count` is zero.
    pub fn average_over(&self, count: u64) -> Money {
        if count == 0 {
            return Money::zero();
        }
        Money::from_units(self.0.div_euclid(count as i64))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders with a dot thousands separator: `$170.000`, `-$5.000`.
///
/// ## Note
/// This is for logs and debugging. The checkout UI does its own
/// localized formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        write!(f, "{}${}", sign, grouped)
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

// =============================================================================
// Unit Tests
// =============================================================================

//! # Money Module
//!
//! Provides the `Money` and `Percent` types and the display helpers used on
//! every price label, total and cash-count screen.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  VND HAS NO MINOR UNIT                                                  │
//! │                                                                         │
//! │  Prices, totals and banknotes are all whole dong:                       │
//! │    10.000 ₫ × 2 = 20.000 ₫                                              │
//! │                                                                         │
//! │  Floating point would still drift on percentages:                       │
//! │    18000 × 0.05 = 900.0000000000001                                     │
//! │                                                                         │
//! │  OUR SOLUTION: i64 dong + percentages in basis points                   │
//! │    (18000 × 500 + 5000) / 10000 = 900                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use snapbuy_core::money::{format_vnd, parse_amount, Money};
//!
//! let price = Money::from_vnd(18_900);
//! assert_eq!(format_vnd(price), "18.900 ₫");
//! assert_eq!(parse_amount("15,000"), Some(Money::from_vnd(15_000)));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

/// Currency symbol appended to formatted amounts.
pub const CURRENCY_SYMBOL: &str = "₫";

/// Thousands separator used by the vi-VN locale.
const GROUP_SEPARATOR: char = '.';

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole Vietnamese dong.
///
/// ## Design Decisions
/// - **i64 (signed)**: drawer differences and change can be negative
/// - **Single field tuple struct**: serializes as a bare JSON number
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole dong.
    #[inline]
    pub const fn from_vnd(vnd: i64) -> Self {
        Money(vnd)
    }

    /// Returns the value in whole dong.
    #[inline]
    pub const fn vnd(&self) -> i64 {
        self.0
    }

    /// Zero dong.
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

    /// Multiplies a unit price by a quantity, saturating at the `i64` range.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Clamps negative values to zero.
    #[inline]
    pub fn non_negative(self) -> Self {
        Money(self.0.max(0))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_vnd(*self))
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Percent Type
// =============================================================================

/// A percentage stored in basis points (1 bp = 0.01%).
///
/// The backend takes discount and tax as percentages, so this is what gets
/// sent over the wire (as a plain number via [`Percent::percentage`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percent(u32);

impl Percent {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percent(bps)
    }

    /// Creates a percentage from a display value (`7.5` = 7.5%).
    /// Negative input is treated as zero.
    pub fn from_percentage(pct: f64) -> Self {
        Percent((pct.max(0.0) * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the percentage as a plain number for display and the wire.
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Percent(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Applies this percentage to an amount, rounding half away from zero.
    ///
    /// ```rust
    /// use snapbuy_core::money::{Money, Percent};
    ///
    /// let tax = Percent::from_percentage(5.0).apply(Money::from_vnd(18_000));
    /// assert_eq!(tax.vnd(), 900);
    /// ```
    pub fn apply(&self, amount: Money) -> Money {
        // i128 so large carts cannot overflow the intermediate product
        let product = amount.vnd() as i128 * self.0 as i128;
        let rounded = if product >= 0 {
            (product + 5_000) / 10_000
        } else {
            (product - 5_000) / 10_000
        };
        Money::from_vnd(rounded as i64)
    }
}

// =============================================================================
// Display Helpers
// =============================================================================

/// Groups the digits of a non-negative integer with the vi-VN separator.
fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(GROUP_SEPARATOR);
        }
        out.push(ch);
    }
    out
}

/// Formats an amount the way the checkout screen shows it: `18.900 ₫`.
pub fn format_vnd(amount: Money) -> String {
    let sign = if amount.is_negative() { "-" } else { "" };
    format!(
        "{}{} {}",
        sign,
        group_digits(amount.vnd().unsigned_abs()),
        CURRENCY_SYMBOL
    )
}

/// Formats a drawer difference with an explicit sign: `+5.000 ₫`, `-5.000 ₫`.
pub fn format_signed(amount: Money) -> String {
    if amount.vnd() > 0 {
        format!("+{}", format_vnd(amount))
    } else {
        format_vnd(amount)
    }
}

/// Formats a stock or line quantity: `1.234`.
pub fn format_quantity(qty: i64) -> String {
    let sign = if qty < 0 { "-" } else { "" };
    format!("{}{}", sign, group_digits(qty.unsigned_abs()))
}

/// Parses a typed cash amount.
///
/// Every non-digit is dropped, so grouping in either locale and a trailing
/// symbol are accepted. Returns `None` when no digit is present or the
/// number does not fit.
pub fn parse_amount(input: &str) -> Option<Money> {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok().map(Money::from_vnd)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_vnd() {
        assert_eq!(format_vnd(Money::from_vnd(0)), "0 ₫");
        assert_eq!(format_vnd(Money::from_vnd(500)), "500 ₫");
        assert_eq!(format_vnd(Money::from_vnd(18_900)), "18.900 ₫");
        assert_eq!(format_vnd(Money::from_vnd(1_234_567)), "1.234.567 ₫");
        assert_eq!(format_vnd(Money::from_vnd(-5_000)), "-5.000 ₫");
    }

    #[test]
    fn test_format_signed() {
        assert_eq!(format_signed(Money::from_vnd(5_000)), "+5.000 ₫");
        assert_eq!(format_signed(Money::from_vnd(-5_000)), "-5.000 ₫");
        assert_eq!(format_signed(Money::zero()), "0 ₫");
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(7), "7");
        assert_eq!(format_quantity(1_234), "1.234");
        assert_eq!(format_quantity(100_000), "100.000");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("15,000"), Some(Money::from_vnd(15_000)));
        assert_eq!(parse_amount("15.000 ₫"), Some(Money::from_vnd(15_000)));
        assert_eq!(parse_amount(" 200000 "), Some(Money::from_vnd(200_000)));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn test_percent_apply() {
        let ten = Percent::from_percentage(10.0);
        assert_eq!(ten.bps(), 1_000);
        assert_eq!(ten.apply(Money::from_vnd(20_000)).vnd(), 2_000);

        // 7.5% of 1.010 ₫ = 75.75 → 76
        let odd = Percent::from_percentage(7.5);
        assert_eq!(odd.apply(Money::from_vnd(1_010)).vnd(), 76);
    }

    #[test]
    fn test_percent_negative_input_is_zero() {
        assert!(Percent::from_percentage(-3.0).is_zero());
    }

    #[test]
    fn test_money_sum_and_display() {
        let total: Money = [1_000, 2_500, 500].into_iter().map(Money::from_vnd).sum();
        assert_eq!(total.vnd(), 4_000);
        assert_eq!(total.to_string(), "4.000 ₫");
    }

    #[test]
    fn test_oversized_amounts_saturate() {
        let price = Money::from_vnd(i64::MAX / 2);
        assert_eq!(price.multiply_quantity(3).vnd(), i64::MAX);
        assert_eq!((price * -3).vnd(), i64::MIN);
        assert_eq!((price + price + price).vnd(), i64::MAX);
        assert_eq!((Money::from_vnd(i64::MIN) - price).vnd(), i64::MIN);

        let lines: Money = [i64::MAX, 1].into_iter().map(Money::from_vnd).sum();
        assert_eq!(lines.vnd(), i64::MAX);
    }
}

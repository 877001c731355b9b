//! # Pricing
//!
//! Order totals shown next to the cart.
//!
//! ## Calculation Order
//! ```text
//! subtotal            = Σ unit_price × quantity
//! discount            = subtotal × discount%
//! after_discount      = subtotal − discount
//! tax                 = after_discount × tax%
//! total_before_points = after_discount + tax + shipping
//! max_usable_points   = min(customer points, total_before_points)
//! points_used         = clamp(requested, 0, max_usable_points)
//! total               = max(0, total_before_points − points_used)
//! ```
//!
//! The backend recomputes all of this when the order is created; these
//! numbers are a display preview and drive the cash change calculation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Percent};

/// Inputs to [`compute_totals`].
#[derive(Debug, Clone, Copy)]
pub struct PricingInput<'a> {
    /// `(unit price, quantity)` per line.
    pub lines: &'a [(Money, i64)],
    pub discount: Percent,
    pub tax: Percent,
    pub shipping: Money,
    /// Loyalty balance of the selected customer (0 for guests).
    pub customer_points: i64,
    /// Points the cashier asked to redeem.
    pub requested_points: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Totals {
    pub subtotal: Money,
    pub discount: Money,
    pub after_discount: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total_before_points: Money,
    pub max_usable_points: i64,
    pub points_used: i64,
    pub total: Money,
}

/// Computes cart totals. Pure and deterministic.
///
/// ```rust
/// use snapbuy_core::money::{Money, Percent};
/// use snapbuy_core::pricing::{compute_totals, PricingInput};
///
/// let lines = [(Money::from_vnd(10_000), 2)];
/// let totals = compute_totals(&PricingInput {
///     lines: &lines,
///     discount: Percent::from_percentage(10.0),
///     tax: Percent::from_percentage(5.0),
///     shipping: Money::zero(),
///     customer_points: 8_000,
///     requested_points: 5_000,
/// });
/// assert_eq!(totals.points_used, 5_000);
/// assert_eq!(totals.total.vnd(), 13_900);
/// ```
pub fn compute_totals(input: &PricingInput<'_>) -> Totals {
    let subtotal: Money = input
        .lines
        .iter()
        .map(|(price, qty)| price.multiply_quantity(*qty))
        .sum();

    let discount = input.discount.apply(subtotal);
    let after_discount = subtotal - discount;
    let tax = input.tax.apply(after_discount);
    let total_before_points = after_discount + tax + input.shipping;

    let max_usable_points = input
        .customer_points
        .max(0)
        .min(total_before_points.vnd().max(0));
    let points_used = input.requested_points.clamp(0, max_usable_points);

    let total = (total_before_points - Money::from_vnd(points_used)).non_negative();

    Totals {
        subtotal,
        discount,
        after_discount,
        tax,
        shipping: input.shipping,
        total_before_points,
        max_usable_points,
        points_used,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use proptest::test_runner::Config;

    fn input(lines: &[(Money, i64)], points: i64, requested: i64) -> PricingInput<'_> {
        PricingInput {
            lines,
            discount: Percent::from_percentage(10.0),
            tax: Percent::from_percentage(5.0),
            shipping: Money::zero(),
            customer_points: points,
            requested_points: requested,
        }
    }

    #[test]
    fn test_cash_checkout_totals() {
        let lines = [(Money::from_vnd(10_000), 2)];
        let totals = compute_totals(&input(&lines, 0, 0));

        assert_eq!(totals.subtotal.vnd(), 20_000);
        assert_eq!(totals.discount.vnd(), 2_000);
        assert_eq!(totals.after_discount.vnd(), 18_000);
        assert_eq!(totals.tax.vnd(), 900);
        assert_eq!(totals.total.vnd(), 18_900);
        assert_eq!(totals.points_used, 0);
    }

    #[test]
    fn test_points_redemption() {
        let lines = [(Money::from_vnd(10_000), 2)];
        let totals = compute_totals(&input(&lines, 5_000, 50_000));

        assert_eq!(totals.max_usable_points, 5_000);
        assert_eq!(totals.points_used, 5_000);
        assert_eq!(totals.total.vnd(), 13_900);
    }

    #[test]
    fn test_points_clamped_to_balance_and_total() {
        let lines = [(Money::from_vnd(10_000), 2)];

        let over_balance = compute_totals(&input(&lines, 1_000, 5_000));
        assert_eq!(over_balance.points_used, 1_000);

        let over_total = compute_totals(&input(&lines, 50_000, 50_000));
        assert_eq!(over_total.max_usable_points, 18_900);
        assert_eq!(over_total.points_used, 18_900);
        assert!(over_total.total.is_zero());

        let negative = compute_totals(&input(&lines, 8_000, -10));
        assert_eq!(negative.points_used, 0);
    }

    #[test]
    fn test_shipping_is_taxed_separately() {
        let lines = [(Money::from_vnd(10_000), 2)];
        let mut i = input(&lines, 0, 0);
        i.shipping = Money::from_vnd(15_000);

        let totals = compute_totals(&i);
        assert_eq!(totals.tax.vnd(), 900);
        assert_eq!(totals.total.vnd(), 33_900);
    }

    #[test]
    fn test_empty_cart() {
        let totals = compute_totals(&input(&[], 5_000, 5_000));
        assert!(totals.total.is_zero());
        assert_eq!(totals.points_used, 0);
    }

    proptest! {
        #![proptest_config(Config::with_cases(256))]
        #[test]
        fn totals_are_deterministic_and_bounded(
            lines in proptest::collection::vec((0_i64..5_000_000, 1_i64..100), 0..8),
            discount_bps in 0_u32..=10_000,
            tax_bps in 0_u32..=5_000,
            shipping in 0_i64..500_000,
            customer_points in 0_i64..2_000_000,
            requested_points in -1_000_i64..3_000_000,
        ) {
            let lines: Vec<(Money, i64)> = lines
                .into_iter()
                .map(|(price, qty)| (Money::from_vnd(price), qty))
                .collect();
            let input = PricingInput {
                lines: &lines,
                discount: Percent::from_bps(discount_bps),
                tax: Percent::from_bps(tax_bps),
                shipping: Money::from_vnd(shipping),
                customer_points,
                requested_points,
            };

            let first = compute_totals(&input);
            let second = compute_totals(&input);
            prop_assert_eq!(first, second);
            prop_assert!(!first.total.is_negative());
            prop_assert!(first.points_used >= 0);
            prop_assert!(first.points_used <= customer_points);
            prop_assert!(first.points_used <= first.total_before_points.vnd());
        }
    }
}

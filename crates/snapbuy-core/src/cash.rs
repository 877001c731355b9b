//! # Cash Module
//!
//! Banknote denominations, physical drawer counts, change computation and
//! the expected-vs-counted reconciliation shown when a shift closes.
//!
//! ## Shift Close Reconciliation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Counted:  500.000 × 0                                                  │
//! │            200.000 × 2  ──► 400.000                                     │
//! │             50.000 × 1  ──►  50.000                                     │
//! │             20.000 × 2  ──►  40.000                                     │
//! │              5.000 × 1  ──►   5.000                                     │
//! │                          ─────────────                                  │
//! │                           495.000 ₫   (counted)                         │
//! │                           500.000 ₫   (expected)                        │
//! │                            -5.000 ₫   (danger cue, close still allowed) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::parse_count_input;

/// Vietnamese banknotes accepted in a drawer count, smallest first.
pub const DENOMINATIONS: [i64; 10] = [
    500, 1_000, 2_000, 5_000, 10_000, 20_000, 50_000, 100_000, 200_000, 500_000,
];

// =============================================================================
// Cash Count
// =============================================================================

/// Quantity of each banknote found in the drawer.
///
/// ## Invariants
/// - Keys are always members of [`DENOMINATIONS`]
/// - Quantities are non-negative integers (enforced by `u32`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct CashCount(BTreeMap<i64, u32>);

impl CashCount {
    /// Creates a count with every denomination at zero.
    pub fn new() -> Self {
        CashCount(DENOMINATIONS.iter().map(|d| (*d, 0)).collect())
    }

    fn check_denomination(denomination: i64) -> CoreResult<()> {
        if DENOMINATIONS.contains(&denomination) {
            Ok(())
        } else {
            Err(ValidationError::InvalidFormat {
                field: "denomination".to_string(),
                reason: format!("{} is not a banknote value", denomination),
            }
            .into())
        }
    }

    /// Sets the quantity of one denomination.
    pub fn set(&mut self, denomination: i64, quantity: u32) -> CoreResult<()> {
        Self::check_denomination(denomination)?;
        self.0.insert(denomination, quantity);
        Ok(())
    }

    /// Sets a quantity from raw keyboard/paste input.
    ///
    /// Anything other than ASCII digits (a sign, a decimal point, letters) is
    /// rejected and the previous quantity is kept. Empty input means zero.
    pub fn set_from_input(&mut self, denomination: i64, input: &str) -> CoreResult<()> {
        Self::check_denomination(denomination)?;
        let quantity = parse_count_input(input)?;
        self.0.insert(denomination, quantity);
        Ok(())
    }

    pub fn quantity(&self, denomination: i64) -> u32 {
        self.0.get(&denomination).copied().unwrap_or(0)
    }

    /// Σ(denomination × quantity).
    pub fn total(&self) -> Money {
        self.0
            .iter()
            .map(|(denomination, qty)| Money::from_vnd(*denomination).multiply_quantity(*qty as i64))
            .sum()
    }

    /// Iterates `(denomination, quantity)` from the smallest note up.
    pub fn iter(&self) -> impl Iterator<Item = (i64, u32)> + '_ {
        self.0.iter().map(|(d, q)| (*d, *q))
    }

    /// Drops entries for values that are not banknotes (e.g. from a stale payload).
    pub fn retain_known(&mut self) {
        self.0.retain(|d, _| DENOMINATIONS.contains(d));
    }
}

impl Default for CashCount {
    fn default() -> Self {
        CashCount::new()
    }
}

// =============================================================================
// Change
// =============================================================================

/// Computes the change owed for a cash hand-over.
///
/// ## Errors
/// `InsufficientCash` when the hand-over does not cover the total; nothing
/// may be sent to the backend in that case.
pub fn change_due(received: Money, total: Money) -> CoreResult<Money> {
    if received < total {
        return Err(CoreError::InsufficientCash {
            received,
            required: total,
        });
    }
    Ok(received - total)
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Visual cue for a drawer difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ReconcileCue {
    /// Counted at least what was expected.
    Success,
    /// Drawer is short.
    Danger,
}

/// Expected vs counted drawer totals. Informational only: a mismatch never
/// blocks closing a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DrawerReconciliation {
    pub expected: Money,
    pub counted: Money,
    /// `counted − expected`
    pub difference: Money,
    pub cue: ReconcileCue,
}

impl DrawerReconciliation {
    pub fn new(expected: Money, counted: Money) -> Self {
        let difference = counted - expected;
        let cue = if difference.is_negative() {
            ReconcileCue::Danger
        } else {
            ReconcileCue::Success
        };
        DrawerReconciliation {
            expected,
            counted,
            difference,
            cue,
        }
    }
}

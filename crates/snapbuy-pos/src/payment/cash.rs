//! Cash hand-over: parse what the cashier typed and work out the change.

use serde::Serialize;
use tracing::warn;

use snapbuy_core::cash::change_due;
use snapbuy_core::money::parse_amount;
use snapbuy_core::{Money, ValidationError};

use crate::error::PosResult;

/// A validated cash payment, ready to send with the completion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashTender {
    pub received: Money,
    pub change: Money,
}

/// Validates a typed cash amount against the order total.
///
/// Grouping separators are accepted in either locale, so `"15,000"` and
/// `"15.000 ₫"` both mean 15 000 dong. Nothing here talks to the backend.
///
/// ## Errors
/// - Blank or digit-free input: `Required`
/// - Hand-over below the total: `InsufficientCash`
pub fn prepare_cash_tender(input: &str, total: Money) -> PosResult<CashTender> {
    let received = parse_amount(input).ok_or_else(|| ValidationError::Required {
        field: "cash received".to_string(),
    })?;

    let change = change_due(received, total).map_err(|e| {
        warn!(received = received.vnd(), total = total.vnd(), "Cash hand-over too small");
        e
    })?;

    Ok(CashTender { received, change })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PosError;
    use snapbuy_core::CoreError;

    #[test]
    fn test_exact_and_over() {
        let total = Money::from_vnd(18_900);

        let exact = prepare_cash_tender("18900", total).unwrap();
        assert!(exact.change.is_zero());

        let over = prepare_cash_tender("20.000 ₫", total).unwrap();
        assert_eq!(over.received.vnd(), 20_000);
        assert_eq!(over.change.vnd(), 1_100);
    }

    #[test]
    fn test_short_hand_over_rejected() {
        let err = prepare_cash_tender("15,000", Money::from_vnd(18_900)).unwrap_err();
        assert!(matches!(
            err,
            PosError::Core(CoreError::InsufficientCash { .. })
        ));
        assert!(err.to_string().contains("Insufficient amount"));
    }

    #[test]
    fn test_blank_input_rejected() {
        assert!(prepare_cash_tender("", Money::from_vnd(1)).is_err());
        assert!(prepare_cash_tender("abc", Money::from_vnd(1)).is_err());
    }
}

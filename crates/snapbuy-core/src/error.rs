//! # Error Types
//!
//! Domain-specific error types for snapbuy-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  snapbuy-core errors (this file)                                       │
//! │  ├── CoreError        - Cart / cash rule violations                    │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  snapbuy-client errors (separate crate)                                │
//! │  └── ClientError      - Network, backend, session expiry               │
//! │                                                                         │
//! │  snapbuy-pos errors                                                    │
//! │  └── PosError         - What the UI sees (code + message)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → PosError → UserFacingError        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant carries a message that can be shown to the cashier as-is.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the pure layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Product has no stock at all.
    #[error("{name} is out of stock")]
    OutOfStock { name: String },

    /// Requested quantity is above what the store holds.
    ///
    /// ## User Workflow
    /// ```text
    /// Scan "Coca-Cola" (stock 3, in cart 3)
    ///      │
    ///      ▼
    /// StockExceeded { name: "Coca-Cola", available: 3 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 Coca-Cola left in stock"
    /// ```
    #[error("Only {available} {name} left in stock")]
    StockExceeded { name: String, available: i64 },

    /// Line is not in the cart.
    #[error("Product {0} is not in the cart")]
    LineNotFound(String),

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Cash handed over does not cover the order.
    #[error("Insufficient amount: received {received}, order total {required}")]
    InsufficientCash { received: Money, required: Money },

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when user input doesn't meet requirements and are always
/// raised before a request leaves the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g., phone number, non-digit count).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub(crate) fn invalid(field: &str, reason: &str) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::StockExceeded {
            name: "Coca-Cola".to_string(),
            available: 3,
        };
        assert_eq!(err.to_string(), "Only 3 Coca-Cola left in stock");
    }

    #[test]
    fn test_insufficient_cash_message() {
        let err = CoreError::InsufficientCash {
            received: Money::from_vnd(15_000),
            required: Money::from_vnd(18_900),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient amount: received 15.000 ₫, order total 18.900 ₫"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("phone").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "phone is required");
    }
}

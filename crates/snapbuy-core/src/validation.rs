//! # Validation Module
//!
//! Input rules checked before a request leaves the client.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Keystroke (UI)                                               │
//! │  └── parse_count_input rejects '-', '.', letters as they are typed     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Action (THIS MODULE)                                         │
//! │  ├── phone format before create order                                  │
//! │  ├── closing note before close shift                                   │
//! │  └── initial cash before open shift                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend                                                      │
//! │  └── stock, one open shift per cashier, totals recomputed              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failure here blocks the action: no state transition, no network call.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;
use crate::money::{Money, Percent};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{10,15}$").expect("phone pattern is a valid regex"));

const MAX_NOTE_LEN: usize = 500;
const MAX_BARCODE_LEN: usize = 64;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a customer phone number: optional `+`, then 10 to 15 digits.
///
/// ```rust
/// use snapbuy_core::validation::validate_phone;
///
/// assert!(validate_phone("0901234567").is_ok());
/// assert!(validate_phone("+84901234567").is_ok());
/// assert!(validate_phone("090-123").is_err());
/// ```
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::required("phone"));
    }

    if !PHONE_RE.is_match(phone) {
        return Err(ValidationError::invalid(
            "phone",
            "must be 10 to 15 digits, optionally starting with +",
        ));
    }

    Ok(())
}

/// Validates the note a cashier leaves when closing a shift.
///
/// Returns the trimmed note.
pub fn validate_closing_note(note: &str) -> ValidationResult<String> {
    let note = note.trim();

    if note.is_empty() {
        return Err(ValidationError::required("closing note"));
    }

    if note.chars().count() > MAX_NOTE_LEN {
        return Err(ValidationError::TooLong {
            field: "closing note".to_string(),
            max: MAX_NOTE_LEN,
        });
    }

    Ok(note.to_string())
}

/// Validates a scanned or typed barcode. Returns the trimmed code.
pub fn validate_barcode(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::required("barcode"));
    }

    if code.len() > MAX_BARCODE_LEN {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: MAX_BARCODE_LEN,
        });
    }

    Ok(code.to_string())
}

/// Validates a customer display name.
pub fn validate_customer_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::required("customer name"));
    }
    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "customer name".to_string(),
            max: 200,
        });
    }
    Ok(name.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates the float a cashier declares when opening a shift.
pub fn validate_initial_cash(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: "initial cash".to_string(),
        });
    }
    Ok(())
}

/// Validates a discount or tax percentage (0 to 100).
pub fn validate_percent(field: &str, pct: f64) -> ValidationResult<Percent> {
    if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(Percent::from_percentage(pct))
}

/// Parses a banknote quantity typed or pasted into a count field.
///
/// ## Rules
/// - Empty input is zero
/// - Only ASCII digits are accepted: no sign, no decimal point
pub fn parse_count_input(input: &str) -> ValidationResult<u32> {
    let input = input.trim();

    if input.is_empty() {
        return Ok(0);
    }

    if !input.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::invalid(
            "quantity",
            "must be a whole number of notes",
        ));
    }

    input.parse::<u32>().map_err(|_| ValidationError::OutOfRange {
        field: "quantity".to_string(),
        min: 0,
        max: u32::MAX as i64,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

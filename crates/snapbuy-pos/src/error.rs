//! # POS Error Type
//!
//! Every flow in this crate returns [`PosError`]; the UI receives it as a
//! serializable [`UserFacingError`].
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ValidationError ─┐                                                     │
//! │  CoreError ───────┼──► PosError ──► UserFacingError { code, message }   │
//! │  ClientError ─────┘                                                     │
//! │                                                                         │
//! │  code                   raised by                       state           │
//! │  ────                   ─────────                       ─────           │
//! │  VALIDATION_ERROR       bad input, empty cart, cash     unchanged       │
//! │  BACKEND_ERROR          non-2xx from the backend        unchanged       │
//! │  NETWORK_ERROR          no response                     unchanged       │
//! │  TIMEOUT                wallet poll exhausted           Cancelled       │
//! │  SESSION_EXPIRED        401 anywhere                    back to login   │
//! │  INVALID_STATE          action not valid right now      unchanged       │
//! │  NOT_FOUND              unknown order/product           unchanged       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here is fatal to the process.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use snapbuy_client::ClientError;
use snapbuy_core::{CoreError, ValidationError};

pub type PosResult<T> = Result<T, PosError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PosError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("{0}")]
    Client(#[from] ClientError),

    #[error("Cart is empty")]
    EmptyCart,

    /// Action is not allowed in the current checkout or shift state.
    #[error("Cannot {action} while {state}")]
    InvalidState { action: &'static str, state: String },

    #[error("No open shift. Please open a shift first.")]
    NoOpenShift,

    #[error("Product {0} not found")]
    ProductNotFound(String),
}

impl From<ValidationError> for PosError {
    fn from(err: ValidationError) -> Self {
        PosError::Core(err.into())
    }
}

impl PosError {
    pub(crate) fn invalid_state(action: &'static str, state: impl Into<String>) -> Self {
        PosError::InvalidState {
            action,
            state: state.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            PosError::Core(_) | PosError::EmptyCart => ErrorCode::ValidationError,
            PosError::Client(err) => match err {
                ClientError::SessionExpired => ErrorCode::SessionExpired,
                ClientError::Network(_) => ErrorCode::NetworkError,
                ClientError::Timeout => ErrorCode::Timeout,
                ClientError::NotFound(_) => ErrorCode::NotFound,
                ClientError::Backend { .. }
                | ClientError::Decode(_)
                | ClientError::Config(_)
                | ClientError::InvalidUrl(_)
                | ClientError::Io(_) => ErrorCode::BackendError,
            },
            PosError::InvalidState { .. } | PosError::NoOpenShift => ErrorCode::InvalidState,
            PosError::ProductNotFound(_) => ErrorCode::NotFound,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, PosError::Client(ClientError::SessionExpired))
    }
}

// =============================================================================
// User-Facing Error
// =============================================================================

/// What the UI receives when an action fails.
///
/// ```json
/// { "code": "VALIDATION_ERROR",
///   "message": "Insufficient amount: received 15.000 ₫, order total 18.900 ₫" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserFacingError {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ErrorCode {
    /// Client-side check failed; no request was sent
    ValidationError,
    /// Backend rejected the request
    BackendError,
    /// Backend unreachable
    NetworkError,
    /// Request or wallet payment timed out
    Timeout,
    /// 401; the user must sign in again
    SessionExpired,
    /// Action not valid in the current state
    InvalidState,
    NotFound,
}

impl From<&PosError> for UserFacingError {
    fn from(err: &PosError) -> Self {
        let message = match err {
            // Decode and config details are for the log, not the cashier
            PosError::Client(ClientError::Decode(detail)) => {
                tracing::error!(detail = %detail, "Backend payload could not be decoded");
                "Unexpected response from server".to_string()
            }
            PosError::Client(ClientError::Network(detail)) => {
                tracing::warn!(detail = %detail, "Backend unreachable");
                "Cannot reach the server. Check the connection and try again.".to_string()
            }
            other => other.to_string(),
        };
        UserFacingError {
            code: err.code(),
            message,
        }
    }
}

impl From<PosError> for UserFacingError {
    fn from(err: PosError) -> Self {
        UserFacingError::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapbuy_core::Money;

    #[test]
    fn test_insufficient_cash_is_validation() {
        let err: PosError = CoreError::InsufficientCash {
            received: Money::from_vnd(15_000),
            required: Money::from_vnd(18_900),
        }
        .into();
        let ui = UserFacingError::from(&err);
        assert_eq!(ui.code, ErrorCode::ValidationError);
        assert!(ui.message.starts_with("Insufficient amount"));
    }

    #[test]
    fn test_client_error_codes() {
        let expired = PosError::from(ClientError::SessionExpired);
        assert_eq!(expired.code(), ErrorCode::SessionExpired);
        assert!(expired.is_session_expired());

        let backend = PosError::from(ClientError::backend(400, Some("Out of stock".into())));
        let ui = UserFacingError::from(&backend);
        assert_eq!(ui.code, ErrorCode::BackendError);
        assert_eq!(ui.message, "Out of stock");

        let net = PosError::from(ClientError::Network("connection refused".into()));
        assert_eq!(UserFacingError::from(&net).code, ErrorCode::NetworkError);
    }

    #[test]
    fn test_serialized_shape() {
        let ui = UserFacingError::from(PosError::EmptyCart);
        let json = serde_json::to_value(&ui).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "Cart is empty");
    }

    #[test]
    fn test_validation_converts() {
        let err: PosError = ValidationError::Required {
            field: "closing note".into(),
        }
        .into();
        assert_eq!(err.to_string(), "closing note is required");
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }
}

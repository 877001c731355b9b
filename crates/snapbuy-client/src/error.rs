//! # Client Error Types
//!
//! Errors raised while talking to the backend or reading local files.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Backend             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Config         │  │  Network        │  │  Backend{status,msg}    │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  NotFound               │ │
//! │  │  Io             │  │                 │  │  SessionExpired (401)   │ │
//! │  └─────────────────┘  └─────────────────┘  │  Decode                 │ │
//! │                                            └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid client configuration: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Config file or credential store could not be read or written.
    #[error("Storage error: {0}")]
    Io(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Request never got an HTTP response.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    // =========================================================================
    // Backend Errors
    // =========================================================================
    /// Non-2xx response. `message` is the backend's own text when it sent one.
    #[error("{message}")]
    Backend { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend answered 401. Stored credentials have already been cleared.
    #[error("Your session has expired. Please sign in again.")]
    SessionExpired,

    /// Response body could not be turned into a domain type.
    #[error("Unexpected response from server: {0}")]
    Decode(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::Io(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// Builds a backend error, falling back to a generic message when the
    /// server did not explain itself.
    pub fn backend(status: u16, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Request failed with status {}", status));
        ClientError::Backend { status, message }
    }

    /// Transport-level failures where the backend may not have seen the request.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Timeout)
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ClientError::SessionExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_message_fallback() {
        let err = ClientError::backend(500, None);
        assert_eq!(err.to_string(), "Request failed with status 500");

        let err = ClientError::backend(422, Some("  ".into()));
        assert_eq!(err.to_string(), "Request failed with status 422");

        let err = ClientError::backend(409, Some("Shift already open".into()));
        assert_eq!(err.to_string(), "Shift already open");
    }

    #[test]
    fn test_categories() {
        assert!(ClientError::Timeout.is_transport());
        assert!(ClientError::Network("reset".into()).is_transport());
        assert!(!ClientError::SessionExpired.is_transport());
        assert!(ClientError::SessionExpired.is_session_expired());
    }

    #[test]
    fn test_json_error_is_decode() {
        let err: ClientError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, ClientError::Decode(_)));
    }
}

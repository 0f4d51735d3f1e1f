use serde_json::Value;
use thiserror::Error;

use crate::storage::StorageError;

/// Fallback text when a 401 response carries no message.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Fallback text for error responses without a message.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Fallback text when the server could not be reached.
pub const NETWORK_ERROR_MESSAGE: &str = "Unable to reach the server. Check your connection.";

/// Errors surfaced by the gateway and the session store.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("HTTP {status}: {message}")]
    Api {
        status: u16,
        message: String,
        /// Field-level validation errors, when the backend sent them.
        errors: Option<Value>,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("CSRF priming failed: {0}")]
    CsrfPriming(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl GatewayError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
            errors: None,
        }
    }

    /// Builds an API error from a parsed error body.
    pub fn from_body(status: u16, body: Option<&Value>, fallback: &str) -> Self {
        Self::Api {
            status,
            message: body
                .and_then(server_message)
                .unwrap_or_else(|| fallback.to_string()),
            errors: body.and_then(|b| b.get("errors")).cloned(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn csrf_priming(message: impl Into<String>) -> Self {
        Self::CsrfPriming(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// HTTP status behind this error, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Validation details (`errors` field) for form-level handling.
    pub fn field_errors(&self) -> Option<&Value> {
        match self {
            Self::Api { errors, .. } => errors.as_ref(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Text suitable for a user-visible notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized { message } | Self::Api { message, .. } => message.clone(),
            Self::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// Get error category for logging and frontend reactions
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized { .. } => ErrorCategory::Unauthorized,
            Self::Api { status, .. } if *status >= 500 => ErrorCategory::Server,
            Self::Api { .. } => ErrorCategory::Validation,
            Self::Network(_) => ErrorCategory::Network,
            Self::CsrfPriming(_)
            | Self::Decode(_)
            | Self::Storage(_)
            | Self::Configuration(_) => ErrorCategory::Client,
        }
    }
}

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Session missing or expired; triggers logout and redirect
    Unauthorized,
    /// Validation or business rule rejected by the backend (4xx)
    Validation,
    /// Backend failure (5xx)
    Server,
    /// No response received
    Network,
    /// Local failure: decoding, storage, configuration, priming
    Client,
}

/// Extracts the human-readable message from an error body.
///
/// Backends answer `{ "message": ... }` or `{ "error": ... }`.
pub fn server_message(body: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|msg| !msg.is_empty())
        .map(str::to_string)
}

pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_server_message_prefers_message_field() {
        let body = json!({"message": "Token expired", "error": "unauthenticated"});
        assert_eq!(server_message(&body).as_deref(), Some("Token expired"));
    }

    #[test]
    fn test_server_message_falls_back_to_error_field() {
        let body = json!({"message": "  ", "error": "Invalid credentials"});
        assert_eq!(server_message(&body).as_deref(), Some("Invalid credentials"));
        assert_eq!(server_message(&json!({"data": {}})), None);
        assert_eq!(server_message(&json!("plain")), None);
    }

    #[test]
    fn test_category() {
        assert_eq!(
            GatewayError::unauthorized("x").category(),
            ErrorCategory::Unauthorized
        );
        assert_eq!(
            GatewayError::api(422, "bad").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            GatewayError::api(503, "down").category(),
            ErrorCategory::Server
        );
        assert_eq!(
            GatewayError::network("refused").category(),
            ErrorCategory::Network
        );
        assert_eq!(
            GatewayError::csrf_priming("no cookie").category(),
            ErrorCategory::Client
        );
    }

    #[test]
    fn test_from_body_keeps_field_errors() {
        let body = json!({
            "message": "The email field is required.",
            "errors": {"email": ["The email field is required."]}
        });
        let err = GatewayError::from_body(422, Some(&body), GENERIC_ERROR_MESSAGE);
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.user_message(), "The email field is required.");
        assert!(err.field_errors().unwrap().get("email").is_some());

        let err = GatewayError::from_body(500, None, GENERIC_ERROR_MESSAGE);
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
        assert!(err.field_errors().is_none());
    }

    #[test]
    fn test_status_and_user_message() {
        let err = GatewayError::unauthorized("Token expired");
        assert_eq!(err.status(), Some(401));
        assert!(err.is_unauthorized());
        assert_eq!(err.user_message(), "Token expired");

        let err = GatewayError::network("connection refused");
        assert_eq!(err.status(), None);
        assert_eq!(err.user_message(), NETWORK_ERROR_MESSAGE);
    }
}

//! Error types for the IR-Flow client.
//!
//! This module defines `IrFlowError`, the unified error type used throughout
//! the crate for consistent error handling and propagation.
//!
//! Application-level failures reported by the server (`"success": false` in
//! the response envelope) are not errors here. They are returned to the caller
//! inside [`Envelope`](crate::models::Envelope).
//!
//! # Security
//!
//! Error messages built from server output are sanitized so the API key never
//! leaks into logs. Use `sanitize_message()` when constructing messages from
//! external sources.

use std::path::PathBuf;

use thiserror::Error;

/// Message used for every configuration value of the wrong type.
pub const WRONG_KEY_OR_VALUE: &str = "You have the wrong or missing key or value";

/// Convenience alias used by every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, IrFlowError>;

/// Unified error type for all IR-Flow client operations.
#[derive(Error, Debug)]
pub enum IrFlowError {
    /// Configuration error that is not tied to a single key.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required key is absent from a configuration mapping.
    #[error("missing required configuration key: {key}")]
    MissingKey {
        /// Name of the missing key.
        key: String,
    },

    /// A configuration value has the wrong type or is empty.
    #[error("{0}")]
    InvalidValue(String),

    /// The configuration file has no section with the expected name.
    #[error("config file {path:?} does not have the required section [{section}]")]
    MissingSection {
        /// Path of the configuration file.
        path: PathBuf,
        /// The section that was expected.
        section: String,
    },

    /// The configuration file section lacks one or more required keys.
    #[error("config file {path:?} is missing required keys: {}", .keys.join(", "))]
    MissingFileKeys {
        /// Path of the configuration file.
        path: PathBuf,
        /// Every required key that was not found.
        keys: Vec<String>,
    },

    /// The configuration file could not be parsed.
    #[error("failed to read configuration file: {0}")]
    ConfigSource(#[from] ini::Error),

    /// A method argument failed a local check before any request was sent.
    #[error("invalid argument: {0}")]
    Precondition(String),

    /// HTTP request failed during transmission.
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// HTTP client initialization failed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// Non-success status with a body that is not a JSON envelope.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code returned.
        status: reqwest::StatusCode,
        /// The response body, sanitized and truncated.
        body: String,
    },

    /// Local file I/O failed (attachment upload or download).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The server answered with JSON of an unexpected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl IrFlowError {
    /// Creates a configuration error for a missing key.
    pub fn missing_key(key: impl Into<String>) -> Self {
        IrFlowError::MissingKey { key: key.into() }
    }

    /// Creates the uniform "wrong or missing key or value" error.
    pub fn wrong_value() -> Self {
        IrFlowError::InvalidValue(WRONG_KEY_OR_VALUE.to_string())
    }

    /// Creates a configuration error for an invalid value.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        IrFlowError::Config(message.into())
    }

    /// Creates a precondition error.
    pub fn precondition(message: impl Into<String>) -> Self {
        IrFlowError::Precondition(message.into())
    }

    /// Returns true for errors raised while loading configuration.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            IrFlowError::Config(_)
                | IrFlowError::MissingKey { .. }
                | IrFlowError::InvalidValue(_)
                | IrFlowError::MissingSection { .. }
                | IrFlowError::MissingFileKeys { .. }
                | IrFlowError::ConfigSource(_)
        )
    }

    /// Sanitizes a message to remove any occurrence of the API key.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to sanitize
    /// * `api_key` - The API key to strip from the message
    ///
    /// # Returns
    ///
    /// The message with any occurrence of the API key replaced with `[REDACTED]`
    #[must_use]
    pub fn sanitize_message(message: &str, api_key: &str) -> String {
        if api_key.is_empty() {
            return message.to_string();
        }
        message.replace(api_key, "[REDACTED]")
    }

    /// Creates a sanitized version of this error's display message.
    #[must_use]
    pub fn sanitized_display(&self, api_key: &str) -> String {
        Self::sanitize_message(&self.to_string(), api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_error_names_key() {
        let err = IrFlowError::missing_key("api_user");
        assert!(err.to_string().contains("api_user"));
        assert!(err.is_config());
    }

    #[test]
    fn test_wrong_value_message() {
        let err = IrFlowError::wrong_value();
        assert_eq!(err.to_string(), WRONG_KEY_OR_VALUE);
    }

    #[test]
    fn test_missing_file_keys_lists_all() {
        let err = IrFlowError::MissingFileKeys {
            path: PathBuf::from("api.conf"),
            keys: vec!["address".to_string(), "api_key".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("address, api_key"));
        assert!(msg.contains("api.conf"));
    }

    #[test]
    fn test_precondition_is_not_config() {
        let err = IrFlowError::precondition("type_name is required");
        assert_eq!(err.to_string(), "invalid argument: type_name is required");
        assert!(!err.is_config());
    }

    #[test]
    fn test_sanitize_message_removes_api_key() {
        let api_key = "super_secret_key_12345";
        let message = format!("X-Authorization: user {}", api_key);
        let sanitized = IrFlowError::sanitize_message(&message, api_key);
        assert!(!sanitized.contains(api_key));
        assert!(sanitized.contains("[REDACTED]"));
    }

    #[test]
    fn test_sanitize_message_empty_key() {
        let message = "Some error message";
        let sanitized = IrFlowError::sanitize_message(message, "");
        assert_eq!(sanitized, message);
    }

    #[test]
    fn test_sanitized_display() {
        let err = IrFlowError::UnexpectedResponse("key abc123 rejected".to_string());
        assert_eq!(
            err.sanitized_display("abc123"),
            "unexpected response: key [REDACTED] rejected"
        );
    }
}

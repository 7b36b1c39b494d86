//! Error types and handling for the `wanderlist` library

use std::fmt;

use thiserror::Error;

/// Failure category reported by the HTTP transport before a status is known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorCode {
    /// The request did not complete within its timeout
    Timeout,
    /// Connection, DNS or TLS failure
    Network,
    /// The response body could not be decoded
    Decode,
}

impl fmt::Display for TransportErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            TransportErrorCode::Timeout => "TIMEOUT",
            TransportErrorCode::Network => "NETWORK",
            TransportErrorCode::Decode => "DECODE",
        };
        f.write_str(code)
    }
}

/// Main error type for the `wanderlist` library
#[derive(Error, Debug)]
pub enum WanderlistError {
    /// Missing or invalid configuration, typically an absent credential
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// An external service answered with a non-success status or a malformed payload
    #[error("Remote error: {message}")]
    Remote { message: String },

    /// Network or timeout failure before a status was known
    #[error("Transport error [{code}]: {message}")]
    Transport {
        code: TransportErrorCode,
        message: String,
    },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },
}

impl WanderlistError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new remote service error
    pub fn remote<S: Into<String>>(message: S) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(code: TransportErrorCode, message: S) -> Self {
        Self::Transport {
            code,
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether this error was caused by a request timing out
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            WanderlistError::Transport {
                code: TransportErrorCode::Timeout,
                ..
            }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            WanderlistError::Config { message } => {
                format!("Configuration error: {message}. Please check your config file and API keys.")
            }
            WanderlistError::Remote { .. } => {
                "An external service returned an unexpected response.".to_string()
            }
            WanderlistError::Transport { code, .. } if *code == TransportErrorCode::Timeout => {
                "The request timed out. Please try again.".to_string()
            }
            WanderlistError::Transport { .. } => {
                "Unable to connect to external services. Please check your internet connection."
                    .to_string()
            }
            WanderlistError::Validation { message } => {
                format!("Invalid input: {message}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = WanderlistError::config("missing API key");
        assert!(matches!(config_err, WanderlistError::Config { .. }));

        let remote_err = WanderlistError::remote("status 0");
        assert!(matches!(remote_err, WanderlistError::Remote { .. }));

        let transport_err = WanderlistError::transport(TransportErrorCode::Network, "refused");
        assert!(matches!(
            transport_err,
            WanderlistError::Transport {
                code: TransportErrorCode::Network,
                ..
            }
        ));
    }

    #[test]
    fn test_timeout_detection() {
        assert!(WanderlistError::transport(TransportErrorCode::Timeout, "slow").is_timeout());
        assert!(!WanderlistError::transport(TransportErrorCode::Network, "down").is_timeout());
        assert!(!WanderlistError::remote("timeout in body").is_timeout());
    }

    #[test]
    fn test_display_includes_code() {
        let err = WanderlistError::transport(TransportErrorCode::Timeout, "after 60000ms");
        assert_eq!(err.to_string(), "Transport error [TIMEOUT]: after 60000ms");
    }

    #[test]
    fn test_user_messages() {
        let config_err = WanderlistError::config("search.api_key");
        assert!(config_err.user_message().contains("search.api_key"));

        let timeout_err = WanderlistError::transport(TransportErrorCode::Timeout, "x");
        assert!(timeout_err.user_message().contains("timed out"));

        let network_err = WanderlistError::transport(TransportErrorCode::Network, "x");
        assert!(network_err.user_message().contains("Unable to connect"));
    }

    #[test]
    fn test_validation_message() {
        let err = WanderlistError::validation("unserializable body");
        assert_eq!(err.to_string(), "Invalid input: unserializable body");
        assert_eq!(err.user_message(), "Invalid input: unserializable body");
    }
}

use keyring;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Session store / persistent storage errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Errors raised by the authorized request gateway
    #[error("Request error: {0}")]
    Gateway(#[from] GatewayError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Generic error
    #[error("{message}")]
    Generic { message: String },
}

/// Session store and persistent storage errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// Backend-specific storage failure
    #[error("Session storage error: {reason}")]
    Storage { reason: String },

    /// Keyring operation failed
    #[error("Keyring error: {source}")]
    Keyring {
        #[source]
        source: keyring::Error,
    },

    /// Session file could not be read, written or removed
    #[error("Session file error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },

    /// Session record could not be (de)serialized
    #[error("Session JSON error: {source}")]
    Json {
        #[source]
        source: serde_json::Error,
    },

    /// Record parsed but is not a complete session
    #[error("Invalid session: {reason}")]
    InvalidSession { reason: String },
}

/// Gateway errors
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The stored session expired before the request was sent.
    /// The request never left the process.
    #[error("Token expired")]
    ExpiredToken,

    /// The server rejected the bearer token with `invalid_token`
    #[error("Invalid token")]
    InvalidToken,

    /// Transport failure (connect, timeout, body read)
    #[error("HTTP request failed: {source}")]
    Request {
        #[source]
        source: reqwest::Error,
    },

    /// A caller or session header could not be encoded
    #[error("Invalid header: {reason}")]
    InvalidHeader { reason: String },

    /// Request body could not be serialized
    #[error("Invalid request body: {source}")]
    InvalidBody {
        #[source]
        source: serde_json::Error,
    },

    /// Gateway could not be constructed
    #[error("Gateway configuration error: {reason}")]
    Configuration { reason: String },
}

impl GatewayError {
    /// True for the two errors that end the current session
    pub fn is_session_ended(&self) -> bool {
        matches!(self, GatewayError::ExpiredToken | GatewayError::InvalidToken)
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to load config file: {source}")]
    LoadError {
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for `Config`
    #[error("Failed to parse config file: {source}")]
    ParseError {
        #[source]
        source: toml::de::Error,
    },

    /// Config values failed validation
    #[error("Configuration validation failed: {reason}")]
    ValidationError { reason: String },

    /// Config file could not be written
    #[error("Failed to write config file: {source}")]
    WriteError {
        #[source]
        source: std::io::Error,
    },

    /// Config could not be serialized
    #[error("Failed to serialize config: {source}")]
    SerializeError {
        #[source]
        source: toml::ser::Error,
    },
}

impl From<reqwest::Error> for GatewayError {
    fn from(error: reqwest::Error) -> Self {
        GatewayError::Request { source: error }
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(error: serde_json::Error) -> Self {
        SessionError::Json { source: error }
    }
}

impl From<keyring::Error> for SessionError {
    fn from(error: keyring::Error) -> Self {
        SessionError::Keyring { source: error }
    }
}

impl From<std::io::Error> for SessionError {
    fn from(error: std::io::Error) -> Self {
        SessionError::Io { source: error }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(error: std::io::Error) -> Self {
        ConfigError::LoadError { source: error }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        ConfigError::ParseError { source: error }
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(error: toml::ser::Error) -> Self {
        ConfigError::SerializeError { source: error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ending_errors() {
        assert!(GatewayError::ExpiredToken.is_session_ended());
        assert!(GatewayError::InvalidToken.is_session_ended());
        assert!(
            !GatewayError::InvalidHeader {
                reason: "bad".to_string()
            }
            .is_session_ended()
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(GatewayError::ExpiredToken.to_string(), "Token expired");
        assert_eq!(GatewayError::InvalidToken.to_string(), "Invalid token");

        let app_error: AppError = GatewayError::InvalidToken.into();
        assert_eq!(app_error.to_string(), "Request error: Invalid token");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: SessionError = json_error.into();
        assert!(matches!(error, SessionError::Json { .. }));
    }
}

//! Error types for Tello communication.

use std::net::SocketAddr;

use thiserror::Error;

/// Errors that can occur while talking to a Tello.
///
/// Construction failures ([`Bind`](Self::Bind), [`Handshake`](Self::Handshake))
/// leave no usable session behind. Every other variant is scoped to the single
/// call that produced it and the session keeps working afterwards.
#[derive(Error, Debug)]
pub enum TelloError {
    /// The local UDP socket could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The drone did not accept the `command` handshake.
    #[error("Tello rejected attempt to enter command mode (reply: {response:?})")]
    Handshake { response: String },

    /// Low-level socket failure while transmitting a datagram.
    #[error("Send failed: {0}")]
    Send(#[source] std::io::Error),

    /// The bound socket could not report its own state (e.g. local address).
    #[error("Socket error: {0}")]
    Socket(#[source] std::io::Error),

    /// No reply arrived within the configured command timeout.
    #[error("No response to command {command:?}")]
    CommandTimeout { command: String },

    /// The reply could not be parsed as the expected numeric type.
    #[error("Could not parse reply {response:?} to {command:?}")]
    ResponseParse { command: String, response: String },

    /// An argument was rejected before anything was sent.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration values could not be interpreted.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be read.
    #[error("Config IO error: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// Configuration file is not valid JSON for [`TelloConfig`](crate::TelloConfig).
    #[error("Config parse error: {0}")]
    ConfigJson(#[from] serde_json::Error),
}

/// Result type for Tello operations.
pub type TelloResult<T> = Result<T, TelloError>;

impl TelloError {
    /// True for failures that only affect the call that raised them.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, TelloError::Bind { .. } | TelloError::Handshake { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_command() {
        let err = TelloError::CommandTimeout {
            command: "flip f".to_string(),
        };
        assert!(err.to_string().contains("flip f"));
    }

    #[test]
    fn test_construction_errors_are_not_recoverable() {
        let bind = TelloError::Bind {
            addr: "0.0.0.0:8889".parse().unwrap(),
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        let handshake = TelloError::Handshake {
            response: "error".to_string(),
        };
        assert!(!bind.is_recoverable());
        assert!(!handshake.is_recoverable());

        let parse = TelloError::ResponseParse {
            command: "battery?".to_string(),
            response: "abc".to_string(),
        };
        assert!(parse.is_recoverable());
    }

    #[test]
    fn test_socket_error_is_not_a_send_error() {
        let err = TelloError::Socket(std::io::Error::from(std::io::ErrorKind::NotConnected));
        assert!(err.to_string().starts_with("Socket error"));
        assert!(!matches!(err, TelloError::Send(_)));
    }
}

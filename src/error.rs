//! Error types for client construction and the transport seam.
//!
//! Ordinary HTTP and network outcomes never reach the caller as an [`Error`]:
//! the client renders them into a [`ResponseEnvelope`](crate::ResponseEnvelope).
//! An `Error` is only returned while building a client, or by a
//! [`Transport`](crate::Transport) implementation, in which case the client
//! turns it into an envelope with status `0`.

/// The error type for this crate.
///
/// # Examples
///
/// ```
/// use fetchwrap::Error;
///
/// let err = Error::Transport("connection reset".to_string());
/// assert_eq!(err.to_string(), "Transport error: connection reset");
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error raised by `reqwest` (connection refused, DNS
    /// lookup failed, invalid URL, body could not be sent).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A failure reported by a custom [`Transport`](crate::Transport).
    #[error("Transport error: {0}")]
    Transport(String),

    /// A header name or value cannot be put on the wire.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Invalid configuration was provided.
    ///
    /// This indicates a problem with how the client was configured, such as
    /// a configuration document that does not parse.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

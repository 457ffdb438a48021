//! Domain error types.

use thiserror::Error;

/// Value object validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// Username is empty after trimming
    #[error("Username must not be empty")]
    EmptyUsername,

    /// Room id is not an integer
    #[error("Invalid room id: '{0}'")]
    InvalidRoomId(String),
}

/// Errors raised by the messaging channel
///
/// These never reach the caller of the session; the session logs them and
/// takes the reconnection path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The channel could not be opened
    #[error("Connection error: {0}")]
    Connect(String),

    /// Writing to the channel failed
    #[error("Send error: {0}")]
    Send(String),

    /// Reading from the channel failed
    #[error("Receive error: {0}")]
    Receive(String),

    /// The remote end closed the channel
    #[error("Connection closed by remote")]
    Closed,

    /// The endpoint did not confirm the session in time
    #[error("Handshake timed out after {0} ms")]
    HandshakeTimeout(u64),

    /// The endpoint rejected the session with an ERROR frame
    #[error("Handshake rejected: {0}")]
    Rejected(String),

    /// Nothing was received within the heart-beat tolerance
    #[error("No heart-beat from server within {0} ms")]
    HeartbeatTimeout(u64),
}

/// Errors raised by the directory/history service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// The configured base URL cannot be used
    #[error("Invalid directory URL: {0}")]
    InvalidUrl(String),

    /// The request did not complete
    #[error("Network error: {0}")]
    Network(String),

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The service answered with a non-success status
    #[error("Request to {url} failed with status {status}")]
    Status { status: u16, url: String },

    /// The response body is not what was expected
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Errors raised by the local state store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("State file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored value is not a valid username
    #[error("Stored username is invalid: {0}")]
    Corrupt(#[from] ValueObjectError),
}

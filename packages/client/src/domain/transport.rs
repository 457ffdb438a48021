//! Messaging channel interfaces.
//!
//! The session layer is written against these traits; the WebSocket and
//! in-memory implementations live in the infrastructure layer.

use async_trait::async_trait;

use super::error::TransportError;

/// Opens channels to the messaging endpoint
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Open a new channel. Each call yields an independent connection.
    async fn connect(&self) -> Result<Box<dyn Channel>, TransportError>;
}

/// One open, text-framed, bidirectional channel
#[async_trait]
pub trait Channel: Send {
    /// Write one text message
    async fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Read the next text message.
    ///
    /// Returns `None` once the channel is closed. Must be cancel-safe: the
    /// session polls it inside `tokio::select!`.
    async fn recv(&mut self) -> Option<Result<String, TransportError>>;

    /// Close the channel. Errors while closing are ignored.
    async fn close(&mut self);
}

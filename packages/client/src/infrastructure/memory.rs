//! In-memory implementation of the messaging channel.
//!
//! [`memory_pair`] returns a [`MemoryConnector`] for the session and a
//! [`MemoryServer`] that plays the endpoint: it accepts each connection
//! attempt as a [`MemoryPeer`] that can read what the client sent and push
//! frames back. Built for unit tests and behind the `testing` feature.

use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{Channel, Connector, TransportError};

use super::stomp::{Command, Frame, FrameDecoder};

/// Create a connected connector/server pair
pub fn memory_pair() -> (MemoryConnector, MemoryServer) {
    let (accept_tx, accept_rx) = mpsc::unbounded_channel();
    let refusing = Arc::new(AtomicBool::new(false));
    (
        MemoryConnector {
            accept_tx,
            refusing: Arc::clone(&refusing),
        },
        MemoryServer {
            accept_rx,
            refusing,
        },
    )
}

/// Client half: opens in-memory channels
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    accept_tx: mpsc::UnboundedSender<MemoryPeer>,
    refusing: Arc<AtomicBool>,
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self) -> Result<Box<dyn Channel>, TransportError> {
        if self.refusing.load(Ordering::Acquire) {
            return Err(TransportError::Connect("connection refused".to_string()));
        }

        let (to_server, from_client) = mpsc::unbounded_channel();
        let (to_client, from_server) = mpsc::unbounded_channel();
        let peer = MemoryPeer {
            to_client: Some(to_client),
            from_client,
            decoder: FrameDecoder::new(),
            pending: VecDeque::new(),
        };
        self.accept_tx
            .send(peer)
            .map_err(|_| TransportError::Connect("server is gone".to_string()))?;

        Ok(Box::new(MemoryChannel {
            to_server: Some(to_server),
            from_server,
        }))
    }
}

/// Server half: accepts connection attempts
#[derive(Debug)]
pub struct MemoryServer {
    accept_rx: mpsc::UnboundedReceiver<MemoryPeer>,
    refusing: Arc<AtomicBool>,
}

impl MemoryServer {
    /// Wait for the next connection attempt
    pub async fn accept(&mut self) -> Option<MemoryPeer> {
        self.accept_rx.recv().await
    }

    /// Take a pending connection attempt without waiting
    pub fn try_accept(&mut self) -> Option<MemoryPeer> {
        self.accept_rx.try_recv().ok()
    }

    /// While refusing, every connection attempt fails
    pub fn set_refusing(&self, refusing: bool) {
        self.refusing.store(refusing, Ordering::Release);
    }
}

/// Endpoint side of one in-memory connection
#[derive(Debug)]
pub struct MemoryPeer {
    to_client: Option<mpsc::UnboundedSender<String>>,
    from_client: mpsc::UnboundedReceiver<String>,
    decoder: FrameDecoder,
    pending: VecDeque<Frame>,
}

impl MemoryPeer {
    /// Push raw text to the client. Returns `false` if the client is gone.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.to_client
            .as_ref()
            .is_some_and(|tx| tx.send(text.into()).is_ok())
    }

    pub fn send_frame(&self, frame: &Frame) -> bool {
        self.send_text(frame.encode())
    }

    /// Next raw text sent by the client, heart-beats included
    pub async fn recv_text(&mut self) -> Option<String> {
        self.from_client.recv().await
    }

    /// Next frame sent by the client, skipping heart-beats
    pub async fn recv_frame(&mut self) -> Option<Frame> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Some(frame);
            }
            let text = self.from_client.recv().await?;
            self.decode(&text);
        }
    }

    /// Next frame already sent by the client, without waiting
    pub fn try_recv_frame(&mut self) -> Option<Frame> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Some(frame);
            }
            let text = self.from_client.try_recv().ok()?;
            self.decode(&text);
        }
    }

    /// Complete the STOMP handshake: wait for CONNECT and answer CONNECTED.
    ///
    /// Returns the client's CONNECT frame.
    pub async fn accept_stomp(&mut self, heart_beat: &str) -> Option<Frame> {
        let connect = self.recv_frame().await?;
        if connect.command() != Command::Connect && connect.command() != Command::Stomp {
            return None;
        }
        let connected = Frame::new(Command::Connected)
            .with_header("version", "1.2")
            .with_header("heart-beat", heart_beat);
        self.send_frame(&connected).then_some(connect)
    }

    /// Drop the connection from the endpoint side
    pub fn close(&mut self) {
        self.to_client = None;
        self.from_client.close();
    }

    fn decode(&mut self, text: &str) {
        for result in self.decoder.push(text) {
            match result {
                Ok(frame) => self.pending.push_back(frame),
                Err(e) => tracing::warn!("Memory peer dropped malformed client frame: {}", e),
            }
        }
    }
}

/// Client side of one in-memory connection
struct MemoryChannel {
    to_server: Option<mpsc::UnboundedSender<String>>,
    from_server: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl Channel for MemoryChannel {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        let tx = self.to_server.as_ref().ok_or(TransportError::Closed)?;
        tx.send(text).map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        self.from_server.recv().await.map(Ok)
    }

    async fn close(&mut self) {
        self.to_server = None;
        self.from_server.close();
    }
}

//! Session configuration.

use std::time::Duration;

use tokio_tungstenite::tungstenite::http::Uri;

use crate::domain::ReconnectPolicy;

/// Default WebSocket endpoint of the chat service
pub const DEFAULT_WS_URL: &str = "ws://localhost:8080/ws";

/// Default heart-beat period, both directions
pub const DEFAULT_HEARTBEAT: Duration = Duration::from_millis(4000);

/// Default time allowed for the STOMP handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default time `shutdown` waits for the driver before aborting it
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Heart-beat periods this client offers in its CONNECT frame
///
/// A zero duration means the client cannot send (or does not want to
/// receive) heart-beats in that direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    pub outgoing: Duration,
    pub incoming: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self::symmetric(DEFAULT_HEARTBEAT)
    }
}

impl HeartbeatConfig {
    pub fn symmetric(period: Duration) -> Self {
        Self {
            outgoing: period,
            incoming: period,
        }
    }

    pub fn disabled() -> Self {
        Self::symmetric(Duration::ZERO)
    }

    /// Value of the `heart-beat` header (`<outgoing ms>,<incoming ms>`)
    pub fn header_value(&self) -> String {
        format!("{},{}", self.outgoing.as_millis(), self.incoming.as_millis())
    }
}

/// Configuration of a [`ChatSession`](super::ChatSession)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// WebSocket endpoint, e.g. `ws://localhost:8080/ws`
    pub url: String,
    /// Virtual host sent in the CONNECT frame
    pub host: String,
    pub heartbeat: HeartbeatConfig,
    pub reconnect: ReconnectPolicy,
    pub connect_timeout: Duration,
    pub shutdown_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_WS_URL)
    }
}

impl SessionConfig {
    /// Configuration for `url`. The virtual host defaults to the URL's host.
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let host = host_of(&url).unwrap_or_else(|| "localhost".to_string());
        Self {
            url,
            host,
            heartbeat: HeartbeatConfig::default(),
            reconnect: ReconnectPolicy::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub fn with_heartbeat(mut self, heartbeat: HeartbeatConfig) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

fn host_of(url: &str) -> Option<String> {
    let uri: Uri = url.parse().ok()?;
    uri.host().map(str::to_string)
}

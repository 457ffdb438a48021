//! Chat session: one logical connection to the messaging endpoint.
//!
//! [`ChatSession`] is a cheap-to-clone handle. Every operation enqueues a
//! command for a single background driver task that owns the channel, the
//! room membership and the reconnection loop, so calls return immediately
//! and are applied in program order.

mod config;
mod dispatcher;
mod driver;
mod heartbeat;
mod membership;
mod state;

use std::{sync::Arc, time::Duration};

use hiroba_shared::time::{Clock, SystemClock};
use parking_lot::Mutex;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::domain::{ChatMessage, Connector, RoomId, Username};

pub use config::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_HEARTBEAT, DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_WS_URL,
    HeartbeatConfig, SessionConfig,
};
pub use dispatcher::{DispatchError, MessageDispatcher, Subscription};
pub use heartbeat::NegotiatedHeartbeat;
pub use state::ConnectionState;

use driver::{Driver, SessionCommand};
use membership::RoomMembership;
use state::SharedState;

struct SessionInner {
    commands: mpsc::UnboundedSender<SessionCommand>,
    shared: Arc<SharedState>,
    dispatcher: MessageDispatcher,
    task: Mutex<Option<JoinHandle<()>>>,
    shutdown_timeout: Duration,
}

/// Handle to a chat session
#[derive(Clone)]
pub struct ChatSession {
    inner: Arc<SessionInner>,
}

impl ChatSession {
    /// Spawn the session driver. Must be called within a Tokio runtime.
    ///
    /// The session starts disconnected; call [`connect`](Self::connect).
    pub fn start(config: SessionConfig, connector: impl Connector) -> Self {
        Self::start_with_clock(config, connector, Arc::new(SystemClock))
    }

    /// Same as [`start`](Self::start) with the clock used for outgoing timestamps
    pub fn start_with_clock(
        config: SessionConfig,
        connector: impl Connector,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(SharedState::new());
        let dispatcher = MessageDispatcher::new();
        let shutdown_timeout = config.shutdown_timeout;

        let driver = Driver::new(
            config,
            Arc::new(connector),
            commands_rx,
            Arc::clone(&shared),
            dispatcher.clone(),
            RoomMembership::new(clock),
        );
        let task = tokio::spawn(driver.run());

        Self {
            inner: Arc::new(SessionInner {
                commands,
                shared,
                dispatcher,
                task: Mutex::new(Some(task)),
                shutdown_timeout,
            }),
        }
    }

    /// Open the connection as `username`. No-op while connected or connecting.
    pub fn connect(&self, username: Username) {
        self.send(SessionCommand::Connect(username));
    }

    /// Leave the current room and close the connection.
    ///
    /// Cancels a pending connection attempt or reconnection. Nothing
    /// reconnects afterwards until the next [`connect`](Self::connect).
    pub fn disconnect(&self) {
        self.send(SessionCommand::Disconnect);
    }

    /// Move to `room_id`, leaving the current room first
    pub fn join_room(&self, room_id: RoomId) {
        self.send(SessionCommand::JoinRoom(room_id));
    }

    pub fn leave_room(&self) {
        self.send(SessionCommand::LeaveRoom);
    }

    /// Send a chat message to the current room. Dropped when not in a room.
    pub fn send_message(&self, content: impl Into<String>) {
        self.send(SessionCommand::SendChat(content.into()));
    }

    /// Register `handler` for inbound messages of the current room
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ChatMessage) + Send + Sync + 'static,
    {
        self.inner.dispatcher.subscribe(handler)
    }

    pub fn dispatcher(&self) -> &MessageDispatcher {
        &self.inner.dispatcher
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state().is_connected()
    }

    /// Username given to the last [`connect`](Self::connect)
    pub fn username(&self) -> Option<Username> {
        self.inner.shared.username()
    }

    pub fn current_room_id(&self) -> Option<RoomId> {
        self.inner.shared.current_room()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.shared.connection_state()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.shared.watch()
    }

    /// Disconnect and stop the driver.
    ///
    /// Waits up to the configured shutdown timeout, then aborts the driver.
    pub async fn shutdown(&self) {
        tracing::debug!("Session shutdown requested");
        self.send(SessionCommand::Shutdown);

        let task = self.inner.task.lock().take();
        let Some(mut task) = task else {
            return;
        };

        match tokio::time::timeout(self.inner.shutdown_timeout, &mut task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Session driver terminated abnormally: {}", e),
            Err(_) => {
                tracing::warn!(
                    "Session driver did not stop within {:?}; aborting",
                    self.inner.shutdown_timeout
                );
                task.abort();
            }
        }

        self.inner.shared.set_current_room(None);
        self.inner
            .shared
            .set_connection_state(ConnectionState::Disconnected);
    }

    fn send(&self, command: SessionCommand) {
        if let Err(e) = self.inner.commands.send(command) {
            tracing::debug!("Session driver has stopped; dropping {:?}", e.0);
        }
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("state", &self.connection_state())
            .field("username", &self.username())
            .field("current_room_id", &self.current_room_id())
            .finish()
    }
}

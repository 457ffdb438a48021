//! Session driver: the one task that owns the messaging channel.
//!
//! Every session operation arrives here as a [`SessionCommand`] and is
//! applied in order. The driver moves between four phases:
//!
//! ```text
//! Idle --connect--> Connect --CONNECTED--> Serve --lost--> Backoff --delay--> Connect
//!   ^                  |                     |                |
//!   +---- disconnect --+---------------------+----------------+
//! ```

use std::{future, pin::Pin, sync::Arc, time::Duration};

use tokio::{
    sync::mpsc,
    time::{self, Instant, Interval, MissedTickBehavior, Sleep},
};

use crate::{
    domain::{Channel, Connector, RoomId, TransportError, Username},
    infrastructure::stomp::{self, Command, Frame, FrameDecoder},
};

use super::{
    config::{HeartbeatConfig, SessionConfig},
    dispatcher::MessageDispatcher,
    heartbeat::NegotiatedHeartbeat,
    membership::RoomMembership,
    state::{ConnectionState, SharedState},
};

/// Grace period for closing a channel that may already be dead
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub(crate) enum SessionCommand {
    Connect(Username),
    Disconnect,
    JoinRoom(RoomId),
    LeaveRoom,
    SendChat(String),
    Shutdown,
}

enum Next {
    Idle,
    Connect { username: Username, attempt: u32 },
    Backoff { username: Username, attempt: u32 },
    Shutdown,
}

enum Flow {
    Continue,
    Disconnected,
    Shutdown,
    Lost(TransportError),
}

enum Event {
    Inbound(Option<Result<String, TransportError>>),
    Command(Option<SessionCommand>),
    HeartbeatDue,
    Silent,
}

/// An open channel with a confirmed STOMP session
struct Connection {
    channel: Box<dyn Channel>,
    decoder: FrameDecoder,
    heartbeat: NegotiatedHeartbeat,
    // frames that arrived together with CONNECTED
    pending: Vec<Frame>,
}

impl Connection {
    async fn send_frames(&mut self, frames: Vec<Frame>) -> Result<(), TransportError> {
        for frame in frames {
            tracing::debug!("Sending {} frame", frame.command());
            self.channel.send(frame.encode()).await?;
        }
        Ok(())
    }

    async fn close(&mut self) {
        if time::timeout(CLOSE_TIMEOUT, self.channel.close())
            .await
            .is_err()
        {
            tracing::debug!("Channel did not close within {:?}", CLOSE_TIMEOUT);
        }
    }
}

pub(crate) struct Driver {
    config: SessionConfig,
    connector: Arc<dyn Connector>,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    shared: Arc<SharedState>,
    dispatcher: MessageDispatcher,
    membership: RoomMembership,
}

impl Driver {
    pub(crate) fn new(
        config: SessionConfig,
        connector: Arc<dyn Connector>,
        commands: mpsc::UnboundedReceiver<SessionCommand>,
        shared: Arc<SharedState>,
        dispatcher: MessageDispatcher,
        membership: RoomMembership,
    ) -> Self {
        Self {
            config,
            connector,
            commands,
            shared,
            dispatcher,
            membership,
        }
    }

    pub(crate) async fn run(mut self) {
        tracing::debug!("Session driver started");

        let mut next = Next::Idle;
        loop {
            next = match next {
                Next::Idle => self.idle().await,
                Next::Connect { username, attempt } => self.connect(username, attempt).await,
                Next::Backoff { username, attempt } => self.backoff(username, attempt).await,
                Next::Shutdown => break,
            };
        }

        self.shared.set_current_room(None);
        self.shared.set_connection_state(ConnectionState::Disconnected);
        tracing::debug!("Session driver stopped");
    }

    async fn idle(&mut self) -> Next {
        self.shared.set_current_room(None);
        self.shared.set_connection_state(ConnectionState::Disconnected);

        loop {
            match self.commands.recv().await {
                Some(SessionCommand::Connect(username)) => {
                    self.shared.set_username(username.clone());
                    return Next::Connect {
                        username,
                        attempt: 0,
                    };
                }
                Some(SessionCommand::Disconnect) => tracing::debug!("Already disconnected"),
                Some(SessionCommand::Shutdown) | None => return Next::Shutdown,
                Some(other) => tracing::debug!("Not connected; ignoring {:?}", other),
            }
        }
    }

    async fn connect(&mut self, username: Username, attempt: u32) -> Next {
        let state = if attempt == 0 {
            ConnectionState::Connecting
        } else {
            ConnectionState::Reconnecting { attempt }
        };
        self.shared.set_connection_state(state);
        tracing::info!("Connecting to {} as {}", self.config.url, username);

        let handshake = handshake(
            Arc::clone(&self.connector),
            self.config.host.clone(),
            self.config.heartbeat,
            self.config.connect_timeout,
        );
        tokio::pin!(handshake);

        let result = loop {
            tokio::select! {
                result = &mut handshake => break result,
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Disconnect) => {
                        tracing::info!("Connection attempt abandoned");
                        return Next::Idle;
                    }
                    Some(SessionCommand::Shutdown) | None => return Next::Shutdown,
                    Some(SessionCommand::Connect(_)) => {
                        tracing::debug!("Connection attempt already in progress");
                    }
                    Some(other) => tracing::debug!("Not connected yet; ignoring {:?}", other),
                },
            }
        };

        match result {
            Ok(connection) => self.serve(connection, username).await,
            Err(e) => {
                tracing::warn!("Connection attempt failed: {}", e);
                Next::Backoff {
                    username,
                    attempt: attempt.saturating_add(1),
                }
            }
        }
    }

    async fn serve(&mut self, mut connection: Connection, username: Username) -> Next {
        self.shared.set_connection_state(ConnectionState::Connected);
        tracing::info!("Connected as {}", username);

        let mut outgoing = connection.heartbeat.outgoing.map(|period| {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        let liveness = connection.heartbeat.liveness_timeout();
        let mut deadline: Option<Pin<Box<Sleep>>> =
            liveness.map(|timeout| Box::pin(time::sleep(timeout)));

        for frame in std::mem::take(&mut connection.pending) {
            self.handle_frame(frame);
        }

        loop {
            let event = tokio::select! {
                inbound = connection.channel.recv() => Event::Inbound(inbound),
                command = self.commands.recv() => Event::Command(command),
                () = next_tick(&mut outgoing) => Event::HeartbeatDue,
                () = expired(&mut deadline) => Event::Silent,
            };

            let flow = match event {
                Event::Inbound(Some(Ok(text))) => {
                    if let (Some(timeout), Some(sleep)) = (liveness, deadline.as_mut()) {
                        sleep.as_mut().reset(Instant::now() + timeout);
                    }
                    for result in connection.decoder.push(&text) {
                        match result {
                            Ok(frame) => self.handle_frame(frame),
                            Err(e) => tracing::warn!("Dropping malformed frame: {}", e),
                        }
                    }
                    Flow::Continue
                }
                Event::Inbound(Some(Err(e))) => Flow::Lost(e),
                Event::Inbound(None) => Flow::Lost(TransportError::Closed),
                Event::Command(Some(command)) => {
                    self.handle_command(&mut connection, &username, command)
                        .await
                }
                Event::Command(None) => {
                    // every session handle is gone
                    self.close(&mut connection, &username).await;
                    Flow::Shutdown
                }
                Event::HeartbeatDue => {
                    match connection.channel.send(stomp::HEARTBEAT.to_string()).await {
                        Ok(()) => {
                            tracing::trace!("Sent heart-beat");
                            Flow::Continue
                        }
                        Err(e) => Flow::Lost(e),
                    }
                }
                Event::Silent => Flow::Lost(TransportError::HeartbeatTimeout(millis(
                    liveness.unwrap_or_default(),
                ))),
            };

            match flow {
                Flow::Continue => {}
                Flow::Disconnected => return Next::Idle,
                Flow::Shutdown => return Next::Shutdown,
                Flow::Lost(e) => {
                    tracing::warn!("Connection lost: {}", e);
                    return self.lost(connection, username).await;
                }
            }
        }
    }

    async fn handle_command(
        &mut self,
        connection: &mut Connection,
        username: &Username,
        command: SessionCommand,
    ) -> Flow {
        let sent = match command {
            SessionCommand::Connect(requested) => {
                tracing::debug!(
                    "Already connected as {}; ignoring connect as {}",
                    username,
                    requested
                );
                Ok(())
            }
            SessionCommand::Disconnect => {
                self.close(connection, username).await;
                return Flow::Disconnected;
            }
            SessionCommand::Shutdown => {
                self.close(connection, username).await;
                return Flow::Shutdown;
            }
            SessionCommand::JoinRoom(room_id) => {
                let frames = self.membership.join(room_id, username);
                self.shared.set_current_room(self.membership.current_room());
                connection.send_frames(frames).await
            }
            SessionCommand::LeaveRoom => {
                if self.membership.current_room().is_none() {
                    tracing::debug!("Not in a room; nothing to leave");
                }
                let frames = self.membership.leave(username);
                self.shared.set_current_room(None);
                connection.send_frames(frames).await
            }
            SessionCommand::SendChat(content) => match self.membership.chat(username, content) {
                Some(frame) => connection.send_frames(vec![frame]).await,
                None => {
                    tracing::debug!("No active room; message not sent");
                    Ok(())
                }
            },
        };

        match sent {
            Ok(()) => Flow::Continue,
            Err(e) => Flow::Lost(e),
        }
    }

    fn handle_frame(&self, frame: Frame) {
        match frame.command() {
            Command::Message if self.membership.accepts(&frame) => {
                if let Err(e) = self.dispatcher.dispatch_raw(frame.body()) {
                    tracing::warn!("Dropping malformed message: {}", e);
                }
            }
            Command::Message => tracing::debug!(
                "Dropping MESSAGE for inactive subscription {:?}",
                frame.header("subscription")
            ),
            Command::Error => tracing::error!("Server reported an error: {}", error_message(&frame)),
            Command::Receipt => {
                tracing::debug!("RECEIPT {:?}", frame.header("receipt-id"));
            }
            other => tracing::debug!("Ignoring unexpected {} frame", other),
        }
    }

    /// Leave the current room, say DISCONNECT and close the channel
    async fn close(&mut self, connection: &mut Connection, username: &Username) {
        let mut frames = self.membership.leave(username);
        self.shared.set_current_room(None);
        frames.push(Frame::disconnect());

        if let Err(e) = connection.send_frames(frames).await {
            tracing::debug!("Channel failed while disconnecting: {}", e);
        }
        connection.close().await;
        self.shared.set_connection_state(ConnectionState::Disconnected);
        tracing::info!("Disconnected");
    }

    async fn lost(&mut self, mut connection: Connection, username: Username) -> Next {
        if let Some(room_id) = self.membership.reset() {
            tracing::info!("Room {} was left with the lost connection", room_id);
        }
        self.shared.set_current_room(None);
        connection.close().await;

        Next::Backoff {
            username,
            attempt: 1,
        }
    }

    async fn backoff(&mut self, username: Username, attempt: u32) -> Next {
        let policy = self.config.reconnect;
        if !policy.should_attempt_reconnect(attempt) {
            tracing::error!(
                "Giving up after {} reconnection attempts",
                attempt.saturating_sub(1)
            );
            return Next::Idle;
        }

        self.shared
            .set_connection_state(ConnectionState::Reconnecting { attempt });
        let delay = policy.delay_for(attempt);
        tracing::info!("Reconnecting in {:?} (attempt {})", delay, attempt);

        let sleep = time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                () = &mut sleep => return Next::Connect { username, attempt },
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Disconnect) => {
                        tracing::info!("Reconnection cancelled");
                        return Next::Idle;
                    }
                    Some(SessionCommand::Shutdown) | None => return Next::Shutdown,
                    Some(SessionCommand::Connect(_)) => {
                        tracing::debug!("Reconnection already scheduled");
                    }
                    Some(other) => tracing::debug!("Not connected; ignoring {:?}", other),
                },
            }
        }
    }
}

/// Open a channel and complete the STOMP handshake within `timeout`
async fn handshake(
    connector: Arc<dyn Connector>,
    host: String,
    heartbeat: HeartbeatConfig,
    timeout: Duration,
) -> Result<Connection, TransportError> {
    let open = async {
        let mut channel = connector.connect().await?;
        let connect = Frame::connect(&host, &heartbeat.header_value());
        if let Err(e) = channel.send(connect.encode()).await {
            channel.close().await;
            return Err(e);
        }

        let mut decoder = FrameDecoder::new();
        match await_connected(&mut channel, &mut decoder).await {
            Ok((connected, pending)) => {
                let agreed =
                    NegotiatedHeartbeat::negotiate(&heartbeat, connected.header("heart-beat"));
                tracing::debug!(
                    "STOMP session confirmed (version: {:?}, heart-beat: {:?})",
                    connected.header("version"),
                    agreed
                );
                Ok(Connection {
                    channel,
                    decoder,
                    heartbeat: agreed,
                    pending,
                })
            }
            Err(e) => {
                channel.close().await;
                Err(e)
            }
        }
    };

    match time::timeout(timeout, open).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::HandshakeTimeout(millis(timeout))),
    }
}

async fn await_connected(
    channel: &mut Box<dyn Channel>,
    decoder: &mut FrameDecoder,
) -> Result<(Frame, Vec<Frame>), TransportError> {
    loop {
        let text = match channel.recv().await {
            Some(Ok(text)) => text,
            Some(Err(e)) => return Err(e),
            None => return Err(TransportError::Closed),
        };

        let mut results = decoder.push(&text).into_iter();
        while let Some(result) = results.next() {
            match result {
                Ok(frame) if frame.command() == Command::Connected => {
                    let pending = results.filter_map(log_malformed).collect();
                    return Ok((frame, pending));
                }
                Ok(frame) if frame.command() == Command::Error => {
                    return Err(TransportError::Rejected(error_message(&frame)));
                }
                Ok(frame) => {
                    tracing::debug!("Ignoring {} frame before CONNECTED", frame.command());
                }
                Err(e) => tracing::warn!("Dropping malformed frame during handshake: {}", e),
            }
        }
    }
}

fn log_malformed(result: Result<Frame, stomp::FrameError>) -> Option<Frame> {
    result
        .map_err(|e| tracing::warn!("Dropping malformed frame: {}", e))
        .ok()
}

fn error_message(frame: &Frame) -> String {
    match frame.header("message") {
        Some(message) => message.to_string(),
        None => frame.body().trim().to_string(),
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending().await,
    }
}

async fn expired(deadline: &mut Option<Pin<Box<Sleep>>>) {
    match deadline {
        Some(sleep) => sleep.as_mut().await,
        None => future::pending().await,
    }
}

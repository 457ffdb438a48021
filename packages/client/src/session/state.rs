//! Session state shared between the handle and the driver.

use std::fmt;

use parking_lot::RwLock;
use tokio::sync::watch;

use crate::domain::{RoomId, Username};

/// Connection lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// First connection attempt in progress
    Connecting,
    /// STOMP session confirmed by the server
    Connected,
    /// Connection lost or refused; waiting for, or making, retry `attempt`
    Reconnecting { attempt: u32 },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => f.write_str("disconnected"),
            ConnectionState::Connecting => f.write_str("connecting"),
            ConnectionState::Connected => f.write_str("connected"),
            ConnectionState::Reconnecting { attempt } => {
                write!(f, "reconnecting (attempt {})", attempt)
            }
        }
    }
}

/// Snapshot values written by the driver and read by everyone else
#[derive(Debug)]
pub(crate) struct SharedState {
    state: watch::Sender<ConnectionState>,
    username: RwLock<Option<Username>>,
    current_room: RwLock<Option<RoomId>>,
}

impl SharedState {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            state,
            username: RwLock::new(None),
            current_room: RwLock::new(None),
        }
    }

    pub(crate) fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub(crate) fn watch(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Publish `next`. Watchers are only woken when the value changes.
    pub(crate) fn set_connection_state(&self, next: ConnectionState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            tracing::debug!("Connection state: {} -> {}", current, next);
            *current = next;
            true
        });
    }

    pub(crate) fn username(&self) -> Option<Username> {
        self.username.read().clone()
    }

    pub(crate) fn set_username(&self, username: Username) {
        *self.username.write() = Some(username);
    }

    pub(crate) fn current_room(&self) -> Option<RoomId> {
        *self.current_room.read()
    }

    pub(crate) fn set_current_room(&self, room_id: Option<RoomId>) {
        *self.current_room.write() = room_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_uninitialized() {
        // テスト項目: 作成直後は未接続でユーザーもルームもない
        // given (前提条件):
        let shared = SharedState::new();

        // when (操作):
        let state = shared.connection_state();

        // then (期待する結果):
        assert_eq!(state, ConnectionState::Disconnected);
        assert!(shared.username().is_none());
        assert!(shared.current_room().is_none());
    }

    #[tokio::test]
    async fn test_watchers_are_notified_only_on_change() {
        // テスト項目: 状態が変化した場合のみ監視側に通知される
        // given (前提条件):
        let shared = SharedState::new();
        let mut watcher = shared.watch();

        // when (操作):
        shared.set_connection_state(ConnectionState::Disconnected);
        let unchanged = watcher.has_changed().unwrap();
        shared.set_connection_state(ConnectionState::Connecting);

        // then (期待する結果):
        assert!(!unchanged);
        assert!(watcher.has_changed().unwrap());
        assert_eq!(*watcher.borrow_and_update(), ConnectionState::Connecting);
    }

    #[test]
    fn test_display_reconnecting_includes_attempt() {
        // テスト項目: 再接続中の表示には試行回数が含まれる
        // given (前提条件):
        let state = ConnectionState::Reconnecting { attempt: 3 };

        // when (操作):
        let text = state.to_string();

        // then (期待する結果):
        assert_eq!(text, "reconnecting (attempt 3)");
    }
}

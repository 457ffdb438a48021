//! Helpers shared by the use case tests.

use std::sync::Arc;

use hiroba_shared::time::FixedClock;

use crate::{
    domain::{ChatMessage, RoomId, Username},
    infrastructure::{
        MemoryPeer, MemoryServer, memory_pair,
        stomp::{Command, Frame},
    },
    session::{ChatSession, ConnectionState, SessionConfig},
};

pub(crate) fn username(name: &str) -> Username {
    Username::new(name.to_string()).unwrap()
}

/// Session over an in-memory channel, not yet connected
pub(crate) fn session() -> (ChatSession, MemoryServer) {
    let (connector, server) = memory_pair();
    let clock = Arc::new(FixedClock::new(1672531200000));
    let session = ChatSession::start_with_clock(SessionConfig::default(), connector, clock);
    (session, server)
}

/// Session connected as `name`, heart-beats off
pub(crate) async fn connected_session(name: &str) -> (ChatSession, MemoryServer, MemoryPeer) {
    let (session, mut server) = session();
    session.connect(username(name));
    let mut peer = server.accept().await.unwrap();
    peer.accept_stomp("0,0").await.unwrap();
    session
        .watch_state()
        .wait_for(ConnectionState::is_connected)
        .await
        .unwrap();
    (session, server, peer)
}

/// CHAT message frame as the broker would deliver it to `subscription`
pub(crate) fn message_frame(subscription: &str, room_id: i64, sender: &str, content: &str) -> Frame {
    let body = serde_json::json!({
        "roomId": room_id,
        "sender": sender,
        "content": content,
        "type": "CHAT",
        "timestamp": "2024-01-01T09:00:00",
    });
    Frame::new(Command::Message)
        .with_header("subscription", subscription)
        .with_header("destination", format!("/topic/chat/{}", room_id))
        .with_header("message-id", "1")
        .with_body(body.to_string())
}

pub(crate) fn chat(room_id: i64, sender: &str, content: &str, timestamp: &str) -> ChatMessage {
    ChatMessage::chat(
        RoomId::new(room_id),
        username(sender),
        content.to_string(),
        timestamp.to_string(),
    )
}

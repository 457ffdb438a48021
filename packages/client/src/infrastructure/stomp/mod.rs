//! STOMP 1.2 framing for the messaging channel.
//!
//! The chat server exposes a STOMP broker over WebSocket: rooms are topics
//! under `/topic/chat/{roomId}` and messages are published to
//! `/app/chat/send/{roomId}`.

pub mod decoder;
pub mod error;
pub mod frame;

pub use decoder::FrameDecoder;
pub use error::FrameError;
pub use frame::{Command, Frame};

use crate::domain::RoomId;

/// A heart-beat is a bare end-of-line outside of any frame
pub const HEARTBEAT: &str = "\n";

/// Topic a client subscribes to for a room's messages
pub fn room_topic(room_id: RoomId) -> String {
    format!("/topic/chat/{}", room_id)
}

/// Destination a client publishes a room's messages to
pub fn room_send_destination(room_id: RoomId) -> String {
    format!("/app/chat/send/{}", room_id)
}

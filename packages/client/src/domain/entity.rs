//! Domain entities for the chat client.

use super::value_object::{RoomId, Username};

/// Kind of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Regular message typed by a user
    Chat,
    /// Presence notice: the sender entered the room
    Join,
    /// Presence notice: the sender left the room
    Leave,
}

/// A chat message exchanged in a room
///
/// Immutable once constructed. `content` is empty for JOIN/LEAVE notices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    room_id: RoomId,
    sender: Username,
    content: String,
    message_type: MessageType,
    timestamp: String,
}

impl ChatMessage {
    pub fn new(
        room_id: RoomId,
        sender: Username,
        content: String,
        message_type: MessageType,
        timestamp: String,
    ) -> Self {
        Self {
            room_id,
            sender,
            content,
            message_type,
            timestamp,
        }
    }

    /// Create a CHAT message
    pub fn chat(room_id: RoomId, sender: Username, content: String, timestamp: String) -> Self {
        Self::new(room_id, sender, content, MessageType::Chat, timestamp)
    }

    /// Create a JOIN notice (empty content)
    pub fn join(room_id: RoomId, sender: Username, timestamp: String) -> Self {
        Self::new(room_id, sender, String::new(), MessageType::Join, timestamp)
    }

    /// Create a LEAVE notice (empty content)
    pub fn leave(room_id: RoomId, sender: Username, timestamp: String) -> Self {
        Self::new(room_id, sender, String::new(), MessageType::Leave, timestamp)
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn sender(&self) -> &Username {
        &self.sender
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// `true` for JOIN/LEAVE notices
    pub fn is_presence(&self) -> bool {
        !matches!(self.message_type, MessageType::Chat)
    }
}

/// A room as recorded by the directory service
///
/// `participants` is the directory membership record and is the source of
/// truth for participant counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRoom {
    pub id: RoomId,
    pub name: String,
    pub created_at: Option<String>,
    pub participants: Vec<String>,
}

impl ChatRoom {
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn has_participant(&self, username: &Username) -> bool {
        self.participants.iter().any(|p| p == username.as_str())
    }
}

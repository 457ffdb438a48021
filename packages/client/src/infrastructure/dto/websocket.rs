//! Message bodies carried on the STOMP channel.

use serde::{Deserialize, Deserializer, Serialize};

/// Message type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    Chat,
    Join,
    Leave,
}

/// Chat message sent and received between clients
///
/// The same shape is returned by the history endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub room_id: i64,
    pub sender: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    pub r#type: MessageType,
    /// ISO-8601; RFC 3339 when sent by this client, offset-less local time when sent by the server
    #[serde(default, deserialize_with = "null_as_empty")]
    pub timestamp: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

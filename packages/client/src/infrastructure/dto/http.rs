//! Directory/history API DTOs.

use serde::{Deserialize, Serialize};

/// Room as returned by `/rooms` endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoomDto {
    pub id: i64,
    pub room_name: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub participants: Vec<String>,
}

/// Body of `POST /rooms`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub room_name: String,
    pub creator: String,
}

/// Body of `POST /rooms/{id}/participants`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRoomRequest {
    pub username: String,
}

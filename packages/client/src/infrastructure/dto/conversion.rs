//! Conversion logic between DTOs and domain entities.

use crate::domain::{
    entity,
    error::ValueObjectError,
    value_object::{RoomId, Username},
};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// DTO → Domain Entity
// ========================================

impl From<dto::MessageType> for entity::MessageType {
    fn from(dto: dto::MessageType) -> Self {
        match dto {
            dto::MessageType::Chat => Self::Chat,
            dto::MessageType::Join => Self::Join,
            dto::MessageType::Leave => Self::Leave,
        }
    }
}

impl TryFrom<dto::ChatMessage> for entity::ChatMessage {
    type Error = ValueObjectError;

    fn try_from(dto: dto::ChatMessage) -> Result<Self, Self::Error> {
        Ok(Self::new(
            RoomId::new(dto.room_id),
            Username::new(dto.sender)?,
            dto.content,
            dto.r#type.into(),
            dto.timestamp,
        ))
    }
}

impl From<http::ChatRoomDto> for entity::ChatRoom {
    fn from(dto: http::ChatRoomDto) -> Self {
        let mut participants = dto.participants;
        // the service sends a set; keep a stable order for display
        participants.sort();
        participants.dedup();
        Self {
            id: RoomId::new(dto.id),
            name: dto.room_name,
            created_at: dto.created_at,
            participants,
        }
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<entity::MessageType> for dto::MessageType {
    fn from(model: entity::MessageType) -> Self {
        match model {
            entity::MessageType::Chat => Self::Chat,
            entity::MessageType::Join => Self::Join,
            entity::MessageType::Leave => Self::Leave,
        }
    }
}

impl From<&entity::ChatMessage> for dto::ChatMessage {
    fn from(model: &entity::ChatMessage) -> Self {
        Self {
            room_id: model.room_id().value(),
            sender: model.sender().as_str().to_string(),
            content: model.content().to_string(),
            r#type: model.message_type().into(),
            timestamp: model.timestamp().to_string(),
        }
    }
}

//! Room membership controller.
//!
//! Turns room requests into the frames that realize them, keeping at most one
//! room subscription alive. Pure state machine: the driver sends the frames.

use std::sync::Arc;

use hiroba_shared::time::Clock;
use uuid::Uuid;

use crate::{
    domain::{ChatMessage, RoomId, Username},
    infrastructure::{
        dto::websocket as dto,
        stomp::{self, Command, Frame},
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveRoom {
    room_id: RoomId,
    subscription_id: String,
}

pub(crate) struct RoomMembership {
    clock: Arc<dyn Clock>,
    active: Option<ActiveRoom>,
}

impl RoomMembership {
    pub(crate) fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            active: None,
        }
    }

    pub(crate) fn current_room(&self) -> Option<RoomId> {
        self.active.as_ref().map(|room| room.room_id)
    }

    /// Frames that move `sender` into `room_id`: the full leave sequence for
    /// the previous room, then SUBSCRIBE and the JOIN notice.
    pub(crate) fn join(&mut self, room_id: RoomId, sender: &Username) -> Vec<Frame> {
        if self.current_room() == Some(room_id) {
            tracing::debug!("Already in room {}", room_id);
            return Vec::new();
        }

        let mut frames = self.leave(sender);

        let subscription_id = format!("sub-{}", Uuid::new_v4());
        frames.push(Frame::subscribe(&subscription_id, &stomp::room_topic(room_id)));
        self.active = Some(ActiveRoom {
            room_id,
            subscription_id,
        });

        let notice = ChatMessage::join(room_id, sender.clone(), self.clock.now_rfc3339());
        frames.extend(message_frame(&notice));
        tracing::info!("Joining room {}", room_id);
        frames
    }

    /// Frames that leave the current room: LEAVE notice, then UNSUBSCRIBE.
    pub(crate) fn leave(&mut self, sender: &Username) -> Vec<Frame> {
        let Some(active) = self.active.take() else {
            return Vec::new();
        };

        let notice = ChatMessage::leave(active.room_id, sender.clone(), self.clock.now_rfc3339());
        let mut frames: Vec<Frame> = message_frame(&notice).into_iter().collect();
        frames.push(Frame::unsubscribe(&active.subscription_id));
        tracing::info!("Leaving room {}", active.room_id);
        frames
    }

    /// CHAT frame for the current room, if there is one
    pub(crate) fn chat(&self, sender: &Username, content: String) -> Option<Frame> {
        let room_id = self.current_room()?;
        let message = ChatMessage::chat(room_id, sender.clone(), content, self.clock.now_rfc3339());
        message_frame(&message)
    }

    /// Forget the current room without sending anything; the channel is gone.
    pub(crate) fn reset(&mut self) -> Option<RoomId> {
        self.active.take().map(|room| room.room_id)
    }

    /// Whether an inbound MESSAGE belongs to the active subscription
    pub(crate) fn accepts(&self, frame: &Frame) -> bool {
        let Some(room) = self.active.as_ref() else {
            return false;
        };
        frame.command() == Command::Message
            && frame.header("subscription") == Some(room.subscription_id.as_str())
    }
}

fn message_frame(message: &ChatMessage) -> Option<Frame> {
    let destination = stomp::room_send_destination(message.room_id());
    match serde_json::to_string(&dto::ChatMessage::from(message)) {
        Ok(body) => Some(Frame::send_json(&destination, body)),
        Err(e) => {
            tracing::error!("Failed to serialize message for {}: {}", destination, e);
            None
        }
    }
}

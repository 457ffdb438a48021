//! Message formatting utilities for the terminal UI.

use hiroba_shared::time::display_timestamp;

use crate::{
    domain::{ChatMessage, ChatRoom, MessageType, RoomId, Username},
    session::ConnectionState,
};

const HEAVY_RULE: &str = "============================================================";
const LIGHT_RULE: &str = "------------------------------------------------------------";

/// Message formatter for the terminal UI
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a room listing
    ///
    /// # Arguments
    ///
    /// * `rooms` - Rooms to list, in display order
    /// * `me` - The logged-in user (rooms they belong to are marked)
    pub fn format_room_list(rooms: &[ChatRoom], me: Option<&Username>) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n{}\nRooms:\n", HEAVY_RULE));

        if rooms.is_empty() {
            output.push_str("(No rooms)\n");
        } else {
            for room in rooms {
                let member = me.is_some_and(|me| room.has_participant(me));
                let member_suffix = if member { " (joined)" } else { "" };
                output.push_str(&format!(
                    "[{}] {}{} - {} participant(s)\n",
                    room.id,
                    room.name,
                    member_suffix,
                    room.participant_count()
                ));
            }
        }

        output.push_str(HEAVY_RULE);
        output.push('\n');
        output
    }

    pub fn format_room_created(room: &ChatRoom) -> String {
        format!("\nCreated room [{}] {}\n", room.id, room.name)
    }

    /// Format the header shown when a room is opened, followed by its history
    pub fn format_room_opened(room_id: RoomId, history: &[ChatMessage]) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n{}\nRoom {}\n", HEAVY_RULE, room_id));
        if history.is_empty() {
            output.push_str("(No messages yet)\n");
        }
        for message in history {
            output.push_str(&Self::format_message(message));
        }
        output.push_str(HEAVY_RULE);
        output.push('\n');
        output
    }

    /// Format any inbound message according to its type
    pub fn format_message(message: &ChatMessage) -> String {
        match message.message_type() {
            MessageType::Chat => Self::format_chat_message(message),
            MessageType::Join => Self::format_join_notice(message),
            MessageType::Leave => Self::format_leave_notice(message),
        }
    }

    pub fn format_chat_message(message: &ChatMessage) -> String {
        format!(
            "\n{}\n@{}: {}\nsent at {}\n{}\n",
            LIGHT_RULE,
            message.sender(),
            message.content(),
            readable(message.timestamp()),
            LIGHT_RULE
        )
    }

    pub fn format_join_notice(message: &ChatMessage) -> String {
        format!(
            "\n+ {} entered at {}\n",
            message.sender(),
            readable(message.timestamp())
        )
    }

    pub fn format_leave_notice(message: &ChatMessage) -> String {
        format!(
            "\n- {} left at {}\n",
            message.sender(),
            readable(message.timestamp())
        )
    }

    /// Format a confirmation after sending
    ///
    /// # Arguments
    ///
    /// * `sent_at` - RFC 3339 timestamp of the send
    pub fn format_sent_confirmation(sent_at: &str) -> String {
        format!("sent at {}\n", readable(sent_at))
    }

    pub fn format_connection_state(state: &ConnectionState) -> String {
        format!("\n* {}\n", state)
    }

    pub fn format_error(message: &str) -> String {
        format!("\n! {}\n", message)
    }

    pub fn format_help() -> String {
        let mut output = String::new();
        output.push_str("\nCommands:\n");
        for (usage, description) in [
            ("/rooms", "list every room"),
            ("/myrooms", "list the rooms you are a member of"),
            ("/create <name>", "create a room"),
            ("/join <id>", "open a room and show its recent messages"),
            ("/close", "close the open room (membership is kept)"),
            ("/leave", "leave the open room and drop the membership"),
            ("/logout", "disconnect and forget the saved user"),
            ("/quit", "exit"),
            ("/help", "show this help"),
        ] {
            output.push_str(&format!("  {:<16} {}\n", usage, description));
        }
        output.push_str("Anything else is sent to the open room.\n");
        output
    }
}

/// Wire timestamp for display; unknown formats are shown as received
fn readable(timestamp: &str) -> String {
    display_timestamp(timestamp).unwrap_or_else(|| timestamp.to_string())
}

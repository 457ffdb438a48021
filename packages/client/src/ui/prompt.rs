//! Prompt shared by the readline thread and the output side.

use std::{io::Write, sync::Arc};

use parking_lot::Mutex;

use crate::domain::{RoomId, Username};

/// Current prompt text. Cloning shares the same prompt.
#[derive(Debug, Clone, Default)]
pub struct Prompt {
    text: Arc<Mutex<String>>,
}

impl Prompt {
    pub fn new() -> Self {
        let prompt = Self::default();
        prompt.update(None, None);
        prompt
    }

    /// Rebuild the prompt from who is logged in and which room is open
    pub fn update(&self, username: Option<&Username>, room_id: Option<RoomId>) {
        let text = match (username, room_id) {
            (Some(username), Some(room_id)) => format!("{}#{}> ", username, room_id),
            (Some(username), None) => format!("{}> ", username),
            (None, _) => "username> ".to_string(),
        };
        *self.text.lock() = text;
    }

    pub fn text(&self) -> String {
        self.text.lock().clone()
    }

    /// Redisplay the prompt after printing a message
    pub fn redisplay(&self) {
        print!("{}", self.text());
        std::io::stdout().flush().ok();
    }
}

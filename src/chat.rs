//! UI-agnostic conversation state
//!
//! This module holds the message log, the draft being typed and the
//! loading flag. It knows nothing about terminals or HTTP: the view feeds it
//! edits and resolutions, and reads it back when rendering.

use crate::error::ChatError;

/// Shown in place of a reply whenever the outbound request fails.
pub const ERROR_REPLY: &str = "⚠️ Error: Could not connect to chatbot.";

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    User,
    Bot,
}

/// A single entry in the message log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub origin: Origin,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::Bot,
            text: text.into(),
        }
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    draft: String,
    cursor: usize, // in chars, not bytes
    awaiting_reply: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    // Draft editing

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.draft, self.cursor);
        self.draft.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.draft, self.cursor);
            self.draft.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.draft.chars().count() {
            let byte_pos = char_to_byte_index(&self.draft, self.cursor);
            self.draft.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.draft.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.draft.chars().count();
    }

    /// Replace the whole draft, leaving the cursor at its end.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
        self.cursor_end();
    }

    /// Move the draft into the log and mark a reply as pending.
    ///
    /// Returns the query to send, or `None` when nothing was submitted:
    /// either the draft is blank or a reply is still outstanding. In both
    /// cases the log and the draft are left untouched.
    pub fn submit(&mut self) -> Option<String> {
        if self.awaiting_reply || self.draft.trim().is_empty() {
            return None;
        }

        let query = std::mem::take(&mut self.draft);
        self.cursor = 0;
        self.messages.push(Message::user(query.clone()));
        self.awaiting_reply = true;
        Some(query)
    }

    /// Apply the outcome of the outbound request.
    pub fn resolve(&mut self, result: Result<String, ChatError>) {
        let reply = match result {
            Ok(reply) => reply,
            Err(e) => e.user_message().to_string(),
        };
        self.messages.push(Message::bot(reply));
        self.awaiting_reply = false;
    }
}

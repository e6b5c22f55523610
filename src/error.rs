use thiserror::Error;

use crate::chat::ERROR_REPLY;

/// Everything that can go wrong with one outbound chat request.
///
/// The variants only exist for logging; the conversation shows the same
/// text for all of them.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("could not reach chatbot: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("chatbot responded with status {0}")]
    Status(u16),

    #[error("malformed chatbot response: {0}")]
    Decode(String),

    #[error("chat request task ended unexpectedly: {0}")]
    Task(String),
}

impl ChatError {
    pub fn user_message(&self) -> &'static str {
        ERROR_REPLY
    }
}

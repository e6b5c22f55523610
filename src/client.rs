use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

#[derive(Serialize)]
struct ChatRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    reply: String,
}

/// Talks to the chatbot backend's `/chat` route.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Like [`ChatClient::new`], but gives up on requests after `timeout`.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one question and wait for the bot's reply. No retries.
    pub async fn send(&self, query: &str) -> Result<String, ChatError> {
        let url = format!("{}/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { query })
            .send()
            .await
            .map_err(ChatError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(ChatError::Transport)?;
        let chat_response: ChatResponse =
            serde_json::from_slice(&body).map_err(|e| ChatError::Decode(e.to_string()))?;
        Ok(chat_response.reply)
    }
}

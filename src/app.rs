use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::chat::Conversation;
use crate::client::ChatClient;
use crate::error::ChatError;

pub const SPINNER_FRAMES: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

pub struct App {
    pub should_quit: bool,
    pub conversation: Conversation,
    client: ChatClient,
    reply_task: Option<JoinHandle<Result<String, ChatError>>>,

    // Chat box scrolling, in rendered lines
    pub chat_scroll: u16,
    pub chat_max_scroll: u16, // set by the renderer
    pub chat_height: u16,     // inner height of the chat box, set by the renderer
    pub follow_bottom: bool,

    pub animation_frame: usize,
}

impl App {
    pub fn new(client: ChatClient) -> Self {
        Self {
            should_quit: false,
            conversation: Conversation::new(),
            client,
            reply_task: None,
            chat_scroll: 0,
            chat_max_scroll: 0,
            chat_height: 0,
            follow_bottom: true,
            animation_frame: 0,
        }
    }

    pub fn endpoint(&self) -> &str {
        self.client.base_url()
    }

    /// Send the draft if there is one worth sending.
    ///
    /// Nothing happens while a reply is still outstanding, so replies always
    /// come back in the order the questions were asked.
    pub fn submit(&mut self) {
        let Some(query) = self.conversation.submit() else {
            return;
        };
        info!(chars = query.chars().count(), "sending question");

        let client = self.client.clone();
        self.reply_task = Some(tokio::spawn(async move { client.send(&query).await }));
        self.animation_frame = 0;
        self.follow_bottom = true;
    }

    /// Apply the reply if the request has finished; never blocks.
    pub async fn poll_reply(&mut self) {
        if self.reply_task.as_ref().is_some_and(|task| task.is_finished()) {
            self.wait_for_reply().await;
        }
    }

    /// Wait for the outstanding request, if any, and apply its outcome.
    pub async fn wait_for_reply(&mut self) {
        let Some(task) = self.reply_task.take() else {
            return;
        };

        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(ChatError::Task(e.to_string())),
        };

        match &result {
            Ok(reply) => debug!(chars = reply.chars().count(), "reply received"),
            Err(e) => warn!(error = %e, "chat request failed"),
        }

        self.conversation.resolve(result);
        self.follow_bottom = true;
    }

    pub fn tick(&mut self) {
        if self.conversation.is_awaiting_reply() {
            self.animation_frame = (self.animation_frame + 1) % SPINNER_FRAMES.len();
        }
        self.ease_to_bottom();
    }

    /// Move part of the way towards the newest line on each tick.
    fn ease_to_bottom(&mut self) {
        if !self.follow_bottom || self.chat_scroll >= self.chat_max_scroll {
            return;
        }
        let remaining = self.chat_max_scroll - self.chat_scroll;
        self.chat_scroll += remaining.div_ceil(2);
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.animation_frame % SPINNER_FRAMES.len()]
    }

    // Manual scrolling

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_bottom = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.chat_max_scroll);
        // Reaching the bottom again resumes following new messages
        self.follow_bottom = self.chat_scroll >= self.chat_max_scroll;
    }

    pub fn half_page(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }
}

pub mod client;
pub mod response;

pub use client::LlmClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Anything that can answer a chat-completion request.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, messages: Vec<ChatMessage>) -> anyhow::Result<String>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies in order; an exhausted script behaves like an
    /// unreachable server.
    #[derive(Default)]
    pub struct ScriptedBackend {
        replies: Mutex<VecDeque<String>>,
        requests: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedBackend {
        pub fn new<I, S>(replies: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn offline() -> Self {
            Self::default()
        }

        pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn chat(&self, messages: Vec<ChatMessage>) -> anyhow::Result<String> {
            self.requests.lock().unwrap().push(messages);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("connection refused"))
        }
    }
}

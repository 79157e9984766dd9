// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process chat platform used by tests. Records every posted message.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{ChatChannel, ChatError, ChatPlatform, ChatUser};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Posted {
    pub channel: String,
    pub user: Option<String>,
    pub text: String,
}

#[derive(Default)]
pub(crate) struct FakeChat {
    users: HashMap<String, ChatUser>,
    channels: HashMap<String, ChatChannel>,
    posts: Mutex<Vec<Posted>>,
    fail_posts: bool,
    post_delay: Option<Duration>,
}

impl FakeChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, id: &str, name: &str, real_name: &str) -> Self {
        self.users.insert(
            id.to_string(),
            ChatUser {
                id: id.to_string(),
                name: name.to_string(),
                real_name: real_name.to_string(),
            },
        );
        self
    }

    pub fn with_channel(mut self, id: &str, name: &str) -> Self {
        self.channels.insert(
            id.to_string(),
            ChatChannel {
                id: id.to_string(),
                name: name.to_string(),
            },
        );
        self
    }

    pub fn failing_posts(mut self) -> Self {
        self.fail_posts = true;
        self
    }

    /// Every post waits `delay` before it is recorded.
    pub fn with_post_delay(mut self, delay: Duration) -> Self {
        self.post_delay = Some(delay);
        self
    }

    /// Channel-wide posts, in order.
    pub fn messages(&self) -> Vec<Posted> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user.is_none())
            .cloned()
            .collect()
    }

    /// Ephemeral posts, in order.
    pub fn ephemerals(&self) -> Vec<Posted> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user.is_some())
            .cloned()
            .collect()
    }

    async fn record(&self, channel: &str, user: Option<&str>, text: &str) -> Result<(), ChatError> {
        if let Some(delay) = self.post_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_posts {
            return Err(ChatError::Request("post failed".to_string()));
        }
        self.posts.lock().unwrap().push(Posted {
            channel: channel.to_string(),
            user: user.map(str::to_string),
            text: text.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl ChatPlatform for FakeChat {
    async fn user_info(&self, user_id: &str) -> Result<ChatUser, ChatError> {
        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| ChatError::Api("users.info: user_not_found".to_string()))
    }

    async fn channel_info(&self, channel_id: &str) -> Result<ChatChannel, ChatError> {
        self.channels
            .get(channel_id)
            .cloned()
            .ok_or_else(|| ChatError::Api("conversations.info: channel_not_found".to_string()))
    }

    async fn post_message(&self, channel: &str, text: &str) -> Result<(), ChatError> {
        self.record(channel, None, text).await
    }

    async fn post_ephemeral(&self, channel: &str, user: &str, text: &str) -> Result<(), ChatError> {
        self.record(channel, Some(user), text).await
    }
}

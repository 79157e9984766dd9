// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chat platform integration.
//!
//! The ledger only ever sees opaque user identifiers. Display names, channel
//! names and message delivery go through [`ChatPlatform`], implemented over
//! the Slack Web API by [`SlackClient`].

pub mod client;
#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use serde::Deserialize;

pub use client::SlackClient;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("chat request failed: {0}")]
    Request(String),

    /// The platform answered with `ok: false`.
    #[error("chat API error: {0}")]
    Api(String),

    #[error("chat response was invalid: {0}")]
    InvalidResponse(String),
}

/// A chat-platform user as returned by a user lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatUser {
    #[serde(default)]
    pub id: String,
    /// Handle, e.g. `willow` for `@willow`.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub real_name: String,
}

impl ChatUser {
    /// Real name when the profile has one, otherwise the handle.
    pub fn display_name(&self) -> &str {
        if self.real_name.is_empty() {
            &self.name
        } else {
            &self.real_name
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatChannel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Identity lookups and message delivery on the chat platform.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    async fn user_info(&self, user_id: &str) -> Result<ChatUser, ChatError>;

    async fn channel_info(&self, channel_id: &str) -> Result<ChatChannel, ChatError>;

    /// Post a message visible to everyone in `channel`.
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), ChatError>;

    /// Post a message in `channel` visible only to `user`.
    async fn post_ephemeral(&self, channel: &str, user: &str, text: &str) -> Result<(), ChatError>;
}

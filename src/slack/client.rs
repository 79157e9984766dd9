// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Slack Web API client.
//!
//! Every Web API method answers HTTP 200 with an `{"ok": bool, "error": ...}`
//! envelope, so both the HTTP status and the `ok` flag are checked.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use url::Url;

use super::{ChatChannel, ChatError, ChatPlatform, ChatUser};

pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api/";

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Response Envelopes
// =============================================================================

trait Envelope {
    fn ok(&self) -> bool;
    fn error(&self) -> Option<&str>;
}

macro_rules! envelope {
    ($name:ident $(, $field:ident: $ty:ty)?) => {
        #[derive(Debug, Deserialize)]
        struct $name {
            ok: bool,
            #[serde(default)]
            error: Option<String>,
            $(
                #[serde(default)]
                $field: Option<$ty>,
            )?
        }

        impl Envelope for $name {
            fn ok(&self) -> bool {
                self.ok
            }

            fn error(&self) -> Option<&str> {
                self.error.as_deref()
            }
        }
    };
}

envelope!(UserInfoResponse, user: ChatUser);
envelope!(ChannelInfoResponse, channel: ChatChannel);
envelope!(AckResponse);

fn check<T: Envelope>(method: &str, response: T) -> Result<T, ChatError> {
    if response.ok() {
        Ok(response)
    } else {
        Err(ChatError::Api(format!(
            "{method}: {}",
            response.error().unwrap_or("unknown_error")
        )))
    }
}

// =============================================================================
// SlackClient
// =============================================================================

#[derive(Debug, Clone)]
pub struct SlackClient {
    base_url: Url,
    token: String,
    http: Client,
}

impl SlackClient {
    /// Create a client for the Web API rooted at `base_url`.
    pub fn new(mut base_url: Url, token: impl Into<String>) -> Result<Self, ChatError> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ChatError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            token: token.into(),
            http,
        })
    }

    fn endpoint(&self, method: &str) -> Result<Url, ChatError> {
        self.base_url
            .join(method)
            .map_err(|e| ChatError::Request(format!("invalid endpoint {method}: {e}")))
    }

    async fn get<T>(&self, method: &str, query: &[(&str, &str)]) -> Result<T, ChatError>
    where
        T: DeserializeOwned + Envelope,
    {
        let response = self
            .http
            .get(self.endpoint(method)?)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ChatError::Request(format!("{method}: {e}")))?;

        let body = response
            .json::<T>()
            .await
            .map_err(|e| ChatError::InvalidResponse(format!("{method}: {e}")))?;
        check(method, body)
    }

    async fn post(&self, method: &str, payload: serde_json::Value) -> Result<(), ChatError> {
        let response = self
            .http
            .post(self.endpoint(method)?)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ChatError::Request(format!("{method}: {e}")))?;

        let body = response
            .json::<AckResponse>()
            .await
            .map_err(|e| ChatError::InvalidResponse(format!("{method}: {e}")))?;
        check(method, body).map(|_| ())
    }
}

#[async_trait]
impl ChatPlatform for SlackClient {
    async fn user_info(&self, user_id: &str) -> Result<ChatUser, ChatError> {
        let response: UserInfoResponse = self.get("users.info", &[("user", user_id)]).await?;
        response
            .user
            .ok_or_else(|| ChatError::InvalidResponse("users.info: missing user".to_string()))
    }

    async fn channel_info(&self, channel_id: &str) -> Result<ChatChannel, ChatError> {
        let response: ChannelInfoResponse = self
            .get("conversations.info", &[("channel", channel_id)])
            .await?;
        response.channel.ok_or_else(|| {
            ChatError::InvalidResponse("conversations.info: missing channel".to_string())
        })
    }

    async fn post_message(&self, channel: &str, text: &str) -> Result<(), ChatError> {
        self.post("chat.postMessage", json!({ "channel": channel, "text": text }))
            .await
    }

    async fn post_ephemeral(&self, channel: &str, user: &str, text: &str) -> Result<(), ChatError> {
        self.post(
            "chat.postEphemeral",
            json!({ "channel": channel, "user": user, "text": text }),
        )
        .await
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Balance Commands
//!
//! Slash commands that report balances back to the caller:
//!
//! | Command | Text | Reply |
//! |---------|------|-------|
//! | any | `@name` | balance of the named user |
//! | `/willowbuck-balance` | empty | caller's own balance |
//! | anything else | empty | leaderboard |
//!
//! Replies are always ephemeral.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::ledger::{run_blocking, Ledger, LedgerResult};
use crate::slack::ChatPlatform;
use crate::storage::AccountStore;

pub const BALANCE_COMMAND: &str = "/willowbuck-balance";

pub const DEFAULT_LEADERBOARD_SIZE: usize = 5;

/// Form body of a slash-command request. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(default)]
pub struct SlashCommand {
    pub command: String,
    pub text: String,
    pub user_id: String,
    pub channel_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CommandReply {
    /// Always `ephemeral`.
    pub response_type: String,
    pub text: String,
}

impl CommandReply {
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            response_type: "ephemeral".to_string(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Query<'a> {
    /// Handle without the leading `@`, plus the text as typed.
    Named { handle: &'a str, typed: &'a str },
    Caller,
    Leaderboard,
}

impl<'a> Query<'a> {
    fn parse(cmd: &'a SlashCommand) -> Self {
        let typed = cmd.text.trim();
        if !typed.is_empty() {
            return Query::Named {
                handle: typed.trim_start_matches('@'),
                typed,
            };
        }
        if cmd.command == BALANCE_COMMAND {
            Query::Caller
        } else {
            Query::Leaderboard
        }
    }
}

pub struct CommandResponder<S> {
    ledger: Arc<Ledger<S>>,
    chat: Arc<dyn ChatPlatform>,
    leaderboard_size: usize,
}

impl<S: AccountStore + 'static> CommandResponder<S> {
    pub fn new(ledger: Arc<Ledger<S>>, chat: Arc<dyn ChatPlatform>) -> Self {
        Self {
            ledger,
            chat,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
        }
    }

    pub fn with_leaderboard_size(mut self, size: usize) -> Self {
        self.leaderboard_size = size;
        self
    }

    pub async fn respond(&self, cmd: &SlashCommand) -> LedgerResult<CommandReply> {
        let text = match Query::parse(cmd) {
            Query::Named { handle, typed } => self.named_balance(handle, typed).await?,
            Query::Caller => {
                let user = cmd.user_id.clone();
                let balance = run_blocking(&self.ledger, move |l| {
                    l.get_balance(&user, l.policy().credit_default)
                })
                .await?;
                format!("You currently have {balance} :willowbuck:")
            }
            Query::Leaderboard => self.leaderboard().await?,
        };
        Ok(CommandReply::ephemeral(text))
    }

    /// Accounts are keyed by opaque ids, so a handle is matched by resolving
    /// every stored account on the chat platform.
    // TODO: store the handle alongside the balance so this stops issuing one
    // user lookup per account.
    async fn named_balance(&self, handle: &str, typed: &str) -> LedgerResult<String> {
        let accounts = run_blocking(&self.ledger, |l| l.top_balances(None)).await?;
        for account in accounts {
            match self.chat.user_info(&account.user).await {
                Ok(user) if user.name == handle => {
                    return Ok(format!(
                        "{typed} currently has {} :willowbuck:",
                        account.balance
                    ));
                }
                Ok(_) => {}
                Err(e) => debug!(user = %account.user, error = %e, "Skipping unresolvable account"),
            }
        }
        Ok(format!("{typed} currently has 0 :willowbuck:"))
    }

    async fn leaderboard(&self) -> LedgerResult<String> {
        let mut text = String::from("Here's the top users by :willowbuck: balance:");
        let size = self.leaderboard_size;
        let accounts = run_blocking(&self.ledger, move |l| l.top_balances(Some(size))).await?;
        for account in accounts {
            match self.chat.user_info(&account.user).await {
                Ok(user) => {
                    text.push('\n');
                    text.push_str(&format!("{}: {}", user.display_name(), account.balance));
                }
                Err(e) => {
                    warn!(user = %account.user, error = %e, "Leaving unresolvable user off the leaderboard");
                }
            }
        }
        Ok(text)
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Reaction Events
//!
//! Decoding of chat-platform event callbacks and the configuration that
//! turns a reaction into a ledger operation.
//!
//! ## Dispatch
//!
//! | Event | `grant` mode | `transfer` mode |
//! |-------|--------------|-----------------|
//! | `reaction_added` | credit item author | move from reactor to item author |
//! | `reaction_removed` | debit item author | ignored |
//!
//! Reactions that are not in the [`ReactionTable`] are ignored.

pub mod handler;
pub mod notify;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::ledger::LedgerError;
use crate::slack::ChatError;

pub use handler::{Applied, Notice, ReactionHandler, ReactionOutcome};

// =============================================================================
// Payloads
// =============================================================================

/// Top-level body of the events webhook.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEnvelope {
    /// Endpoint ownership handshake; the challenge is echoed back.
    UrlVerification { challenge: String },
    EventCallback { event: ReactionEvent },
    #[serde(other)]
    Unsupported,
}

/// A `reaction_added` / `reaction_removed` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReactionEvent {
    #[serde(rename = "type")]
    pub kind: String,
    /// User who reacted.
    pub user: String,
    /// Author of the item that was reacted to.
    pub item_user: String,
    /// Emoji name without colons.
    pub reaction: String,
    pub item: ReactionItem,
    pub event_ts: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReactionItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub channel: String,
    pub ts: String,
}

/// The closed set of event kinds the dispatcher acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Added,
    Removed,
}

impl TryFrom<&str> for ReactionKind {
    type Error = EventError;

    fn try_from(kind: &str) -> Result<Self, Self::Error> {
        match kind {
            "reaction_added" => Ok(ReactionKind::Added),
            "reaction_removed" => Ok(ReactionKind::Removed),
            other => Err(EventError::UnknownEventType(other.to_string())),
        }
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// How an added reaction moves currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReactionMode {
    /// Mint for the item author on add, take back on removal.
    #[default]
    Grant,
    /// Pay the item author out of the reactor's balance.
    Transfer,
}

impl FromStr for ReactionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grant" => Ok(ReactionMode::Grant),
            "transfer" => Ok(ReactionMode::Transfer),
            other => Err(format!("unknown reaction mode {other:?} (expected grant or transfer)")),
        }
    }
}

impl fmt::Display for ReactionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReactionMode::Grant => write!(f, "grant"),
            ReactionMode::Transfer => write!(f, "transfer"),
        }
    }
}

/// Reaction name → willowbuck amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionTable(BTreeMap<String, i64>);

impl Default for ReactionTable {
    fn default() -> Self {
        Self(BTreeMap::from([
            ("willowbuck".to_string(), 1),
            ("willowbuck5".to_string(), 5),
            ("willowbuck10".to_string(), 10),
        ]))
    }
}

impl ReactionTable {
    pub fn amount(&self, reaction: &str) -> Option<i64> {
        self.0.get(reaction).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parses `name=amount` pairs separated by commas, e.g.
/// `willowbuck=1,willowbuck5=5`.
impl FromStr for ReactionTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut table = BTreeMap::new();
        for pair in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, amount) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected name=amount, got {pair:?}"))?;
            let name = name.trim().trim_matches(':');
            if name.is_empty() {
                return Err(format!("empty reaction name in {pair:?}"));
            }
            let amount: i64 = amount
                .trim()
                .parse()
                .map_err(|e| format!("invalid amount in {pair:?}: {e}"))?;
            if amount <= 0 {
                return Err(format!("amount for {name} must be positive"));
            }
            table.insert(name.to_string(), amount);
        }

        if table.is_empty() {
            return Err("reaction table is empty".to_string());
        }
        Ok(Self(table))
    }
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    #[error("unknown sender")]
    UnknownSender,

    #[error("unknown receiver")]
    UnknownReceiver,

    #[error("unknown channel")]
    UnknownChannel,

    #[error("Self-reaction requests are ignored")]
    SelfReaction,

    #[error("unknown event type {0:?}")]
    UnknownEventType(String),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl EventError {
    /// Whether redelivering the same event is safe and may succeed.
    ///
    /// Chat failures only surface from lookups made before any ledger write.
    pub fn is_retryable(&self) -> bool {
        match self {
            EventError::Chat(_) => true,
            EventError::Ledger(e) => e.is_retryable(),
            _ => false,
        }
    }
}

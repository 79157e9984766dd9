// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::commands::{CommandResponder, DEFAULT_LEADERBOARD_SIZE};
use crate::config::AppConfig;
use crate::events::ReactionHandler;
use crate::ledger::{Ledger, LedgerPolicy};
use crate::slack::ChatPlatform;
use crate::storage::AccountStore;

/// Storage handle shared by every component.
pub type SharedStore = Arc<dyn AccountStore>;

pub type SharedLedger = Ledger<SharedStore>;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<SharedLedger>,
    pub reactions: Arc<ReactionHandler<SharedStore>>,
    pub commands: Arc<CommandResponder<SharedStore>>,
    /// Row count for a leaderboard request without an explicit limit.
    pub leaderboard_size: usize,
}

impl AppState {
    /// State with the default ledger policy, reaction table and mode.
    pub fn new(store: SharedStore, chat: Arc<dyn ChatPlatform>) -> Self {
        let ledger = Arc::new(Ledger::new(store));
        Self {
            reactions: Arc::new(ReactionHandler::new(ledger.clone(), chat.clone())),
            commands: Arc::new(CommandResponder::new(ledger.clone(), chat)),
            ledger,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
        }
    }

    pub fn from_config(store: SharedStore, chat: Arc<dyn ChatPlatform>, config: &AppConfig) -> Self {
        let ledger = Arc::new(Ledger::with_policy(store, config.ledger));
        let reactions = ReactionHandler::new(ledger.clone(), chat.clone())
            .with_reactions(config.reactions.clone())
            .with_mode(config.reaction_mode)
            .with_notify_channel(config.notify_channel.clone());
        let commands = CommandResponder::new(ledger.clone(), chat)
            .with_leaderboard_size(config.leaderboard_size);

        Self {
            ledger,
            reactions: Arc::new(reactions),
            commands: Arc::new(commands),
            leaderboard_size: config.leaderboard_size,
        }
    }

    pub fn policy(&self) -> LedgerPolicy {
        self.ledger.policy()
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Reaction dispatcher: validates an event, resolves identities on the chat
//! platform, applies the ledger operation and collects the notifications it
//! owes.
//!
//! [`ReactionHandler::apply`] never posts to the chat platform. Its notices
//! are handed to [`ReactionHandler::deliver`] separately, so the webhook can
//! acknowledge an event as soon as the ledger write is done.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::notify::{credit_message, debit_message, SELF_REACTION_MSG, WELCOME_MSG};
use super::{EventError, ReactionEvent, ReactionKind, ReactionMode, ReactionTable};
use crate::ledger::{
    run_blocking, CreditReceipt, DebitOutcome, Ledger, LedgerError, TransferReceipt,
};
use crate::slack::{ChatChannel, ChatError, ChatPlatform, ChatUser};
use crate::storage::AccountStore;

/// What a handled reaction did to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionOutcome {
    /// Not a currency reaction, or a removal in transfer mode.
    Ignored,
    Credited(CreditReceipt),
    Debited(DebitOutcome),
    Transferred(TransferReceipt),
    /// Transfer refused for insufficient funds; the reactor is told why.
    Declined { requested: i64, available: i64 },
}

/// A chat message owed by a handled reaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Visible only to `user` in `channel`.
    Ephemeral {
        channel: String,
        user: String,
        text: String,
    },
    /// Public post to the announcement channel.
    Post { channel: String, text: String },
}

/// Result of [`ReactionHandler::apply`].
#[derive(Debug)]
pub struct Applied {
    pub result: Result<ReactionOutcome, EventError>,
    /// Messages to deliver, in order. Present on some errors too (a rejected
    /// self-reaction still gets its notice).
    pub notices: Vec<Notice>,
}

pub struct ReactionHandler<S> {
    ledger: Arc<Ledger<S>>,
    chat: Arc<dyn ChatPlatform>,
    reactions: ReactionTable,
    mode: ReactionMode,
    notify_channel: Option<String>,
}

/// Resolved participants of a reaction.
struct Parties {
    sender: ChatUser,
    receiver: ChatUser,
    channel: ChatChannel,
}

impl<S: AccountStore + 'static> ReactionHandler<S> {
    pub fn new(ledger: Arc<Ledger<S>>, chat: Arc<dyn ChatPlatform>) -> Self {
        Self {
            ledger,
            chat,
            reactions: ReactionTable::default(),
            mode: ReactionMode::default(),
            notify_channel: None,
        }
    }

    pub fn with_reactions(mut self, reactions: ReactionTable) -> Self {
        self.reactions = reactions;
        self
    }

    pub fn with_mode(mut self, mode: ReactionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Channel that receives public announcements. Without one, only
    /// ephemeral messages are sent.
    pub fn with_notify_channel(mut self, channel: Option<String>) -> Self {
        self.notify_channel = channel.filter(|c| !c.is_empty());
        self
    }

    /// Apply the reaction, then deliver its notices before returning.
    pub async fn handle(&self, event: &ReactionEvent) -> Result<ReactionOutcome, EventError> {
        let Applied { result, notices } = self.apply(event).await;
        self.deliver(notices).await;
        result
    }

    /// Apply the reaction without posting anything.
    pub async fn apply(&self, event: &ReactionEvent) -> Applied {
        let mut notices = Vec::new();
        let result = self.dispatch(event, &mut notices).await;
        Applied { result, notices }
    }

    /// Post notices in order. Failures are logged and skipped.
    pub async fn deliver(&self, notices: Vec<Notice>) {
        for notice in notices {
            match notice {
                Notice::Ephemeral {
                    channel,
                    user,
                    text,
                } => {
                    if let Err(e) = self.chat.post_ephemeral(&channel, &user, &text).await {
                        warn!(%channel, %user, error = %e, "Unable to send ephemeral notification");
                    }
                }
                Notice::Post { channel, text } => {
                    if let Err(e) = self.chat.post_message(&channel, &text).await {
                        warn!(%channel, error = %e, "Unable to post channel notification");
                    }
                }
            }
        }
    }

    async fn dispatch(
        &self,
        event: &ReactionEvent,
        notices: &mut Vec<Notice>,
    ) -> Result<ReactionOutcome, EventError> {
        let Some(amount) = self.reactions.amount(&event.reaction) else {
            debug!(reaction = %event.reaction, "Ignoring reaction outside the table");
            return Ok(ReactionOutcome::Ignored);
        };

        if event.user.is_empty() {
            return Err(EventError::UnknownSender);
        }
        if event.item_user.is_empty() {
            return Err(EventError::UnknownReceiver);
        }
        if event.item.channel.is_empty() {
            return Err(EventError::UnknownChannel);
        }

        let parties = self.resolve(event).await?;

        if parties.sender.id == parties.receiver.id {
            notices.push(ephemeral(event, &parties.sender, SELF_REACTION_MSG));
            info!(user = %event.user, reaction = %event.reaction, "Self-reaction ignored");
            return Err(EventError::SelfReaction);
        }

        let kind = ReactionKind::try_from(event.kind.as_str())?;

        match (kind, self.mode) {
            (ReactionKind::Added, ReactionMode::Grant) => {
                self.grant(event, &parties, amount, notices).await
            }
            (ReactionKind::Removed, ReactionMode::Grant) => {
                self.revoke(&parties, amount, notices).await
            }
            (ReactionKind::Added, ReactionMode::Transfer) => {
                self.transfer(event, &parties, amount, notices).await
            }
            (ReactionKind::Removed, ReactionMode::Transfer) => {
                debug!(user = %event.user, "Removal ignored in transfer mode");
                Ok(ReactionOutcome::Ignored)
            }
        }
    }

    async fn resolve(&self, event: &ReactionEvent) -> Result<Parties, EventError> {
        let channel = match self.chat.channel_info(&event.item.channel).await {
            Ok(channel) if !channel.name.is_empty() => channel,
            Ok(_) | Err(ChatError::Api(_)) => return Err(EventError::UnknownChannel),
            Err(e) => return Err(e.into()),
        };

        let receiver = self
            .lookup_user(&event.item_user, EventError::UnknownReceiver)
            .await?;
        let sender = self
            .lookup_user(&event.user, EventError::UnknownSender)
            .await?;

        Ok(Parties {
            sender,
            receiver,
            channel,
        })
    }

    async fn lookup_user(&self, user_id: &str, unknown: EventError) -> Result<ChatUser, EventError> {
        match self.chat.user_info(user_id).await {
            Ok(user) if !user.id.is_empty() => Ok(user),
            Ok(_) | Err(ChatError::Api(_)) => Err(unknown),
            Err(e) => Err(e.into()),
        }
    }

    async fn grant(
        &self,
        event: &ReactionEvent,
        parties: &Parties,
        amount: i64,
        notices: &mut Vec<Notice>,
    ) -> Result<ReactionOutcome, EventError> {
        let to = parties.receiver.id.clone();
        let receipt = run_blocking(&self.ledger, move |l| l.credit(amount, &to)).await?;

        if receipt.created {
            notices.push(ephemeral(event, &parties.receiver, WELCOME_MSG));
        }
        self.announce(
            notices,
            credit_message(
                parties.sender.display_name(),
                parties.receiver.display_name(),
                &parties.channel.name,
                amount,
                receipt.created,
            ),
        );

        Ok(ReactionOutcome::Credited(receipt))
    }

    async fn revoke(
        &self,
        parties: &Parties,
        amount: i64,
        notices: &mut Vec<Notice>,
    ) -> Result<ReactionOutcome, EventError> {
        let user = parties.receiver.id.clone();
        let outcome = run_blocking(&self.ledger, move |l| l.debit(amount, &user)).await?;

        self.announce(
            notices,
            debit_message(
                parties.sender.display_name(),
                parties.receiver.display_name(),
                &parties.channel.name,
            ),
        );

        Ok(ReactionOutcome::Debited(outcome))
    }

    async fn transfer(
        &self,
        event: &ReactionEvent,
        parties: &Parties,
        amount: i64,
        notices: &mut Vec<Notice>,
    ) -> Result<ReactionOutcome, EventError> {
        let from = parties.sender.id.clone();
        let to = parties.receiver.id.clone();
        let receipt = match run_blocking(&self.ledger, move |l| l.transfer(amount, &from, &to)).await
        {
            Ok(receipt) => receipt,
            Err(LedgerError::InsufficientFunds {
                requested,
                available,
            }) => {
                let notice = LedgerError::InsufficientFunds {
                    requested,
                    available,
                }
                .to_string();
                notices.push(ephemeral(event, &parties.sender, &notice));
                return Ok(ReactionOutcome::Declined {
                    requested,
                    available,
                });
            }
            Err(e) => return Err(e.into()),
        };

        if receipt.receiver_created {
            notices.push(ephemeral(event, &parties.receiver, WELCOME_MSG));
        }
        self.announce(
            notices,
            credit_message(
                parties.sender.display_name(),
                parties.receiver.display_name(),
                &parties.channel.name,
                amount,
                receipt.receiver_created,
            ),
        );

        Ok(ReactionOutcome::Transferred(receipt))
    }

    fn announce(&self, notices: &mut Vec<Notice>, text: String) {
        info!(message = %text, "Reaction applied");
        if let Some(channel) = &self.notify_channel {
            notices.push(Notice::Post {
                channel: channel.clone(),
                text,
            });
        }
    }
}

fn ephemeral(event: &ReactionEvent, user: &ChatUser, text: &str) -> Notice {
    Notice::Ephemeral {
        channel: event.item.channel.clone(),
        user: user.id.clone(),
        text: text.to_string(),
    }
}

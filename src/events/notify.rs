// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Notification texts posted after a reaction has been applied.

/// Sent privately to a user the first time they receive willowbucks.
pub const WELCOME_MSG: &str = "Congratulations! You have been given your first willowbuck!

You can send and receive willowbucks by using the :willowbuck: reaction on
another user's message!

You can use the following commands at any time:
/willowbuck-balance      - check your current :willowbuck: balance
/willowbuck-top-balances - see the top :willowbuck: earners";

pub const SELF_REACTION_MSG: &str = "Self-reaction requests are ignored";

/// Channel announcement for a credit or transfer.
pub fn credit_message(from: &str, to: &str, channel: &str, amount: i64, first: bool) -> String {
    match (first, amount) {
        (true, 1) => format!("{from} sent {to} their first :willowbuck: in channel #{channel}"),
        (true, _) => {
            format!("{from} sent {to} their first {amount} :willowbuck: in channel #{channel}")
        }
        (false, 1) => format!("{from} sent a :willowbuck: to {to} in channel #{channel}"),
        (false, _) => format!("{from} sent {amount} :willowbuck: to {to} in channel #{channel}"),
    }
}

/// Channel announcement for a removed reaction.
pub fn debit_message(from: &str, to: &str, channel: &str) -> String {
    format!("{from} removed their :willowbuck: from {to} in #{channel}")
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Data Models
//!
//! The [`Account`] record is the only persistent entity in the ledger. The
//! remaining types are JSON response bodies for the read-only HTTP routes;
//! they derive `ToSchema` for the OpenAPI document.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Account
// =============================================================================

/// A balance record keyed by chat-platform user identifier.
///
/// `is_new` is never persisted. It is set when no stored row existed and the
/// ledger synthesized a default in memory; such an account only reaches
/// storage once a credit or transfer actually writes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    /// Opaque user identifier (primary key).
    pub user: String,
    /// Current willowbuck balance.
    pub balance: i64,
    #[serde(skip)]
    pub is_new: bool,
}

impl Account {
    /// An account as read back from storage.
    pub fn new(user: impl Into<String>, balance: i64) -> Self {
        Self {
            user: user.into(),
            balance,
            is_new: false,
        }
    }

    /// An in-memory default for a user with no stored row.
    pub fn synthesized(user: impl Into<String>, balance: i64) -> Self {
        Self {
            user: user.into(),
            balance,
            is_new: true,
        }
    }
}

// =============================================================================
// Response Models
// =============================================================================

/// Balance lookup response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct BalanceResponse {
    /// User identifier that was queried.
    pub user: String,
    /// Balance, or the new-account default when no row exists.
    pub balance: i64,
    /// True when the user has never been credited.
    pub is_new: bool,
}

impl From<Account> for BalanceResponse {
    fn from(account: Account) -> Self {
        Self {
            user: account.user,
            balance: account.balance,
            is_new: account.is_new,
        }
    }
}

/// One row of the balance leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// 1-based position in the ranking.
    pub rank: usize,
    pub user: String,
    pub balance: i64,
}

/// Leaderboard response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntry>,
}

impl LeaderboardResponse {
    /// Number ranked accounts in the order given.
    pub fn from_ranked(accounts: Vec<Account>) -> Self {
        let entries = accounts
            .into_iter()
            .enumerate()
            .map(|(i, account)| LeaderboardEntry {
                rank: i + 1,
                user: account.user,
                balance: account.balance,
            })
            .collect();
        Self { entries }
    }
}

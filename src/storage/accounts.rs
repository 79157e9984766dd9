// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The storage client contract consumed by the ledger.
//!
//! One table, one row per user identifier. Each operation is a single
//! round trip to the backend with no client-side caching or batching.

use std::sync::Arc;

use crate::models::Account;

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backend call failed (I/O, transaction, commit, lock).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be decoded into an account.
    #[error("malformed record for {user}: {reason}")]
    Malformed { user: String, reason: String },

    /// A conditional write found a different prior state than expected.
    #[error("conditional write rejected for {user}")]
    ConditionFailed { user: String },

    /// A write to `user` failed, and a retry found the row already changed.
    /// The first attempt may or may not have committed.
    #[error("write to {user} has an unknown outcome")]
    Indeterminate { user: String },
}

impl StoreError {
    /// Whether repeating the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// AccountStore
// =============================================================================

/// Point get / update / scan over the accounts table.
pub trait AccountStore: Send + Sync {
    /// Fetch the row for `user`. An absent key is `Ok(None)`, not an error.
    fn get(&self, user: &str) -> StoreResult<Option<Account>>;

    /// Upsert the `balance` attribute of `account.user`.
    ///
    /// Other attributes of an existing row are left untouched.
    fn put(&self, account: &Account) -> StoreResult<()>;

    /// Upsert `balance` only if the stored state matches `expected`.
    ///
    /// `None` requires that no row exists yet; `Some(b)` requires the stored
    /// balance to equal `b`. A mismatch fails with
    /// [`StoreError::ConditionFailed`] and writes nothing.
    fn compare_and_put(&self, account: &Account, expected: Option<i64>) -> StoreResult<()>;

    /// Every row's `user` and `balance`, unordered and fully materialized.
    ///
    /// There is no pagination. The whole table is read on every call, which
    /// is only acceptable while the account universe stays small.
    fn scan_all(&self) -> StoreResult<Vec<Account>>;
}

impl<T: AccountStore + ?Sized> AccountStore for Arc<T> {
    fn get(&self, user: &str) -> StoreResult<Option<Account>> {
        (**self).get(user)
    }

    fn put(&self, account: &Account) -> StoreResult<()> {
        (**self).put(account)
    }

    fn compare_and_put(&self, account: &Account, expected: Option<i64>) -> StoreResult<()> {
        (**self).compare_and_put(account, expected)
    }

    fn scan_all(&self) -> StoreResult<Vec<Account>> {
        (**self).scan_all()
    }
}

impl<T: AccountStore + ?Sized> AccountStore for &T {
    fn get(&self, user: &str) -> StoreResult<Option<Account>> {
        (**self).get(user)
    }

    fn put(&self, account: &Account) -> StoreResult<()> {
        (**self).put(account)
    }

    fn compare_and_put(&self, account: &Account, expected: Option<i64>) -> StoreResult<()> {
        (**self).compare_and_put(account, expected)
    }

    fn scan_all(&self) -> StoreResult<Vec<Account>> {
        (**self).scan_all()
    }
}

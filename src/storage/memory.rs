// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory account store.
//!
//! Rows are kept in a `BTreeMap`, so scans come back in key order. Besides
//! ephemeral runs, the store can simulate backend outages: either the whole
//! store, or writes for selected users only.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use super::accounts::{AccountStore, StoreError, StoreResult};
use crate::models::Account;

#[derive(Default)]
struct Inner {
    balances: BTreeMap<String, i64>,
    unavailable: bool,
    failing_writes: BTreeSet<String>,
}

#[derive(Default)]
pub struct InMemoryAccountStore {
    inner: Mutex<Inner>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed rows directly, bypassing any injected faults.
    pub fn with_accounts<I, U>(accounts: I) -> Self
    where
        I: IntoIterator<Item = (U, i64)>,
        U: Into<String>,
    {
        let store = Self::new();
        if let Ok(mut inner) = store.inner.lock() {
            inner
                .balances
                .extend(accounts.into_iter().map(|(u, b)| (u.into(), b)));
        }
        store
    }

    /// Make every subsequent call fail with `Unavailable` until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.unavailable = unavailable;
        }
    }

    /// Make writes for `user` fail with `Unavailable`. Reads still succeed.
    pub fn fail_writes_for(&self, user: impl Into<String>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failing_writes.insert(user.into());
        }
    }

    /// Number of persisted rows.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.balances.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::Unavailable("account map lock poisoned".to_string()))?;
        if inner.unavailable {
            return Err(StoreError::Unavailable("in-memory store offline".to_string()));
        }
        Ok(inner)
    }

    fn lock_for_write(&self, user: &str) -> StoreResult<MutexGuard<'_, Inner>> {
        let inner = self.lock()?;
        if inner.failing_writes.contains(user) {
            return Err(StoreError::Unavailable(format!("write rejected for {user}")));
        }
        Ok(inner)
    }
}

impl AccountStore for InMemoryAccountStore {
    fn get(&self, user: &str) -> StoreResult<Option<Account>> {
        let inner = self.lock()?;
        Ok(inner
            .balances
            .get(user)
            .map(|balance| Account::new(user, *balance)))
    }

    fn put(&self, account: &Account) -> StoreResult<()> {
        let mut inner = self.lock_for_write(&account.user)?;
        inner.balances.insert(account.user.clone(), account.balance);
        Ok(())
    }

    fn compare_and_put(&self, account: &Account, expected: Option<i64>) -> StoreResult<()> {
        let mut inner = self.lock_for_write(&account.user)?;
        if inner.balances.get(&account.user).copied() != expected {
            return Err(StoreError::ConditionFailed {
                user: account.user.clone(),
            });
        }
        inner.balances.insert(account.user.clone(), account.balance);
        Ok(())
    }

    fn scan_all(&self) -> StoreResult<Vec<Account>> {
        let inner = self.lock()?;
        Ok(inner
            .balances
            .iter()
            .map(|(user, balance)| Account::new(user.as_str(), *balance))
            .collect())
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bounded retry with exponential backoff for transient storage failures.
//!
//! Only [`StoreError::Unavailable`] is retried. Condition failures and
//! malformed rows are returned on the first attempt.
//!
//! The backoff sleeps the calling thread. Async callers run store calls via
//! [`crate::ledger::run_blocking`].

use std::thread;
use std::time::Duration;

use super::accounts::{AccountStore, StoreError, StoreResult};
use crate::models::Account;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(50);
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero behaves like one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Backoff to sleep after the given failed attempt (1-based).
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .map_or(self.max_backoff, |d| d.min(self.max_backoff))
    }
}

/// Store decorator that retries transient failures of the wrapped store.
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: AccountStore> RetryingStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn run<T>(&self, op: &'static str, mut call: impl FnMut(&S) -> StoreResult<T>) -> StoreResult<T> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call(&self.inner) {
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let backoff = self.policy.backoff(attempt);
                    tracing::warn!(
                        op,
                        attempt,
                        max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Transient storage failure, retrying"
                    );
                    thread::sleep(backoff);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

impl<S: AccountStore> AccountStore for RetryingStore<S> {
    fn get(&self, user: &str) -> StoreResult<Option<Account>> {
        self.run("get", |s| s.get(user))
    }

    fn put(&self, account: &Account) -> StoreResult<()> {
        self.run("put", |s| s.put(account))
    }

    // A retried conditional write that finds the row changed may be seeing
    // its own earlier commit, so the outcome is reported as unknown.
    fn compare_and_put(&self, account: &Account, expected: Option<i64>) -> StoreResult<()> {
        let mut attempt = 0u32;
        self.run("compare_and_put", |s| {
            attempt += 1;
            match s.compare_and_put(account, expected) {
                Err(StoreError::ConditionFailed { user }) if attempt > 1 => {
                    tracing::error!(user = %user, attempt, "Retried write found the row changed");
                    Err(StoreError::Indeterminate { user })
                }
                result => result,
            }
        })
    }

    fn scan_all(&self) -> StoreResult<Vec<Account>> {
        self.run("scan_all", |s| s.scan_all())
    }
}

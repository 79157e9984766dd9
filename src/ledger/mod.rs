// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Ledger
//!
//! Business rules for willowbuck balances on top of an [`AccountStore`].
//!
//! ## New-Account Policy
//!
//! Unknown users are never written on lookup. Each operation synthesizes an
//! in-memory default instead:
//!
//! | Operation | Lookup default |
//! |-----------|----------------|
//! | `credit`, `debit`, balance queries | `credit_default` (0) |
//! | `transfer` sender | `transfer_default` (5) |
//! | `transfer` receiver | `transfer_receiver_default` (0) |
//!
//! ## Write Semantics
//!
//! Every write is conditional on the state that was read (the prior balance,
//! or "no row" for a synthesized account). A concurrent writer therefore
//! produces [`LedgerError::ConcurrentModification`] instead of a silently
//! lost update. The two writes of a transfer are still separate: if the
//! second one fails the sender stays debited and the caller gets
//! [`LedgerError::PartialTransferFailure`].
//!
//! A write whose commit outcome is unknown (the backend failed, a retry then
//! found the row already changed) surfaces as a non-retryable
//! [`crate::storage::StoreError::Indeterminate`]; repeating it could apply
//! the same change twice.
//!
//! Balances never wrap or clamp. An operation that would overflow fails with
//! [`LedgerError::BalanceOverflow`] before anything is written.
//!
//! ## Async Callers
//!
//! Store calls block. Handlers go through [`run_blocking`] so storage I/O and
//! retry backoff stay off the async workers.

mod error;

pub use error::{LedgerError, LedgerResult};

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::models::Account;
use crate::storage::AccountStore;

/// New-account balance for credit-origin lookups.
pub const DEFAULT_BALANCE_CREDIT: i64 = 0;

/// New-account balance for a transfer sender.
pub const DEFAULT_BALANCE_TRANSFER: i64 = 5;

// =============================================================================
// Policy and Results
// =============================================================================

/// Default balances synthesized for users without a stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerPolicy {
    pub credit_default: i64,
    pub transfer_default: i64,
    pub transfer_receiver_default: i64,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self {
            credit_default: DEFAULT_BALANCE_CREDIT,
            transfer_default: DEFAULT_BALANCE_TRANSFER,
            transfer_receiver_default: DEFAULT_BALANCE_CREDIT,
        }
    }
}

/// Result of a successful credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditReceipt {
    /// Balance after the credit.
    pub balance: i64,
    /// True when this credit created the account's row.
    pub created: bool,
}

/// Why a debit was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitSkip {
    /// The user has no stored row.
    UnknownAccount,
    /// The debit would take the balance below zero.
    InsufficientBalance { balance: i64 },
}

/// Result of a debit. Neither variant is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    Applied { balance: i64 },
    Ignored(DebitSkip),
}

impl DebitOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, DebitOutcome::Applied { .. })
    }
}

/// Result of a successful transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReceipt {
    pub from_balance: i64,
    pub to_balance: i64,
    /// True when the receiver had no stored row before the transfer.
    pub receiver_created: bool,
}

/// Convert a signed ranking limit to an optional length. Negative means
/// "no limit".
pub fn rank_limit(limit: i64) -> Option<usize> {
    usize::try_from(limit).ok()
}

/// Run `call` against `ledger` on the blocking thread pool.
pub async fn run_blocking<S, T, F>(ledger: &Arc<Ledger<S>>, call: F) -> LedgerResult<T>
where
    S: AccountStore + 'static,
    T: Send + 'static,
    F: FnOnce(&Ledger<S>) -> LedgerResult<T> + Send + 'static,
{
    let ledger = Arc::clone(ledger);
    tokio::task::spawn_blocking(move || call(&ledger))
        .await
        .map_err(|e| LedgerError::Aborted(e.to_string()))?
}

fn ensure_positive(amount: i64) -> LedgerResult<()> {
    if amount <= 0 {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(())
}

fn add(account: &Account, amount: i64) -> LedgerResult<i64> {
    account
        .balance
        .checked_add(amount)
        .ok_or_else(|| LedgerError::BalanceOverflow {
            user: account.user.clone(),
            balance: account.balance,
            amount,
        })
}

/// Write condition for an account as it was read.
fn prior(account: &Account) -> Option<i64> {
    (!account.is_new).then_some(account.balance)
}

// =============================================================================
// Ledger
// =============================================================================

pub struct Ledger<S> {
    store: S,
    policy: LedgerPolicy,
}

impl<S: AccountStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self::with_policy(store, LedgerPolicy::default())
    }

    pub fn with_policy(store: S, policy: LedgerPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> LedgerPolicy {
        self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Look up `user`, synthesizing `{balance: default_balance, is_new: true}`
    /// when no row exists. Nothing is written.
    pub fn get_account(&self, user: &str, default_balance: i64) -> LedgerResult<Account> {
        match self.store.get(user)? {
            Some(account) => Ok(account),
            None => Ok(Account::synthesized(user, default_balance)),
        }
    }

    pub fn get_balance(&self, user: &str, default_balance: i64) -> LedgerResult<i64> {
        self.get_account(user, default_balance).map(|a| a.balance)
    }

    /// Add `amount` to `to`, creating the row on first credit.
    pub fn credit(&self, amount: i64, to: &str) -> LedgerResult<CreditReceipt> {
        ensure_positive(amount)?;

        let account = self.get_account(to, self.policy.credit_default)?;
        let balance = add(&account, amount)?;
        self.store
            .compare_and_put(&Account::new(to, balance), prior(&account))?;

        info!(user = %to, amount, balance, created = account.is_new, "Credited account");
        Ok(CreditReceipt {
            balance,
            created: account.is_new,
        })
    }

    /// Subtract `amount` from `user` if the account exists and can cover it.
    ///
    /// An unknown account or one that would go negative is left untouched
    /// and reported as [`DebitOutcome::Ignored`], not as an error.
    pub fn debit(&self, amount: i64, user: &str) -> LedgerResult<DebitOutcome> {
        ensure_positive(amount)?;

        let account = self.get_account(user, self.policy.credit_default)?;
        if account.is_new {
            debug!(user, amount, "Debit skipped: unknown account");
            return Ok(DebitOutcome::Ignored(DebitSkip::UnknownAccount));
        }

        if account.balance < amount {
            debug!(user, amount, balance = account.balance, "Debit skipped: insufficient balance");
            return Ok(DebitOutcome::Ignored(DebitSkip::InsufficientBalance {
                balance: account.balance,
            }));
        }
        let remaining = account.balance - amount;

        self.store
            .compare_and_put(&Account::new(user, remaining), prior(&account))?;

        info!(user, amount, balance = remaining, "Debited account");
        Ok(DebitOutcome::Applied { balance: remaining })
    }

    /// Move `amount` from `from` to `to`.
    ///
    /// The sender is checked before the receiver is even read. Writes happen
    /// sender first, then receiver.
    pub fn transfer(&self, amount: i64, from: &str, to: &str) -> LedgerResult<TransferReceipt> {
        ensure_positive(amount)?;
        if from == to {
            return Err(LedgerError::SelfTransfer {
                user: from.to_string(),
            });
        }

        let sender = self.get_account(from, self.policy.transfer_default)?;
        if sender.balance < amount {
            debug!(from, to, amount, balance = sender.balance, "Transfer declined");
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available: sender.balance,
            });
        }

        let receiver = self.get_account(to, self.policy.transfer_receiver_default)?;

        // Both balances are settled before the first write
        let from_balance = sender.balance - amount;
        let to_balance = add(&receiver, amount)?;

        self.store
            .compare_and_put(&Account::new(from, from_balance), prior(&sender))?;

        if let Err(source) = self
            .store
            .compare_and_put(&Account::new(to, to_balance), prior(&receiver))
        {
            error!(
                from,
                to,
                amount,
                from_balance,
                error = %source,
                "Transfer debited sender but failed to credit receiver; manual reconciliation required"
            );
            return Err(LedgerError::PartialTransferFailure {
                from: from.to_string(),
                to: to.to_string(),
                amount,
                from_balance,
                source,
            });
        }

        info!(from, to, amount, from_balance, to_balance, "Transferred willowbucks");
        Ok(TransferReceipt {
            from_balance,
            to_balance,
            receiver_created: receiver.is_new,
        })
    }

    /// Accounts sorted by balance, highest first, truncated to `limit`.
    ///
    /// Equal balances keep their scan order. `None` returns every account.
    /// This reads the entire table on each call.
    pub fn top_balances(&self, limit: Option<usize>) -> LedgerResult<Vec<Account>> {
        let mut accounts = self.store.scan_all()?;
        accounts.sort_by(|a, b| b.balance.cmp(&a.balance));
        if let Some(limit) = limit {
            accounts.truncate(limit);
        }
        Ok(accounts)
    }
}

// =============================================================================
// Tests
// =============================================================================

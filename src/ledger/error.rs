// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger errors.

use crate::storage::StoreError;

/// Errors returned by ledger operations.
///
/// Every variant carries enough structure (amounts, balances, users) for a
/// caller to render its own message. A debit that cannot be applied is not
/// an error; see [`super::DebitOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Amounts must be strictly positive.
    #[error("invalid amount {0}: must be a positive number of willowbucks")]
    InvalidAmount(i64),

    /// Sender and receiver are the same account.
    #[error("cannot transfer willowbucks from {user} to themselves")]
    SelfTransfer { user: String },

    /// The backend call failed; surfaced verbatim.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] StoreError),

    /// The sender cannot cover a transfer. Nothing was written.
    #[error("Unable to send {requested} willowbucks (you have a balance of {available})")]
    InsufficientFunds { requested: i64, available: i64 },

    /// Applying `amount` would take `user` past the largest representable
    /// balance. Nothing was written.
    #[error("balance of {user} ({balance}) cannot take {amount} more willowbucks")]
    BalanceOverflow {
        user: String,
        balance: i64,
        amount: i64,
    },

    /// The account changed between read and write. Nothing was written for
    /// this account; the whole operation may be retried.
    #[error("account {user} was modified concurrently")]
    ConcurrentModification { user: String },

    /// The sender's debit committed but the receiver's credit did not.
    ///
    /// No rollback is attempted. `from_balance` is the sender balance that
    /// is now persisted; an operator has to credit `amount` to `to` (or
    /// refund `from`) by hand.
    #[error(
        "transfer of {amount} from {from} to {to} debited the sender \
         (now {from_balance}) but failed to credit the receiver: {source}"
    )]
    PartialTransferFailure {
        from: String,
        to: String,
        amount: i64,
        from_balance: i64,
        #[source]
        source: StoreError,
    },

    /// The blocking task running the ledger call panicked or was cancelled.
    #[error("ledger task aborted: {0}")]
    Aborted(String),
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ConditionFailed { user } => LedgerError::ConcurrentModification { user },
            other => LedgerError::StorageUnavailable(other),
        }
    }
}

impl LedgerError {
    /// Whether the same call may succeed if issued again.
    ///
    /// A partial transfer is never retryable: repeating it would debit the
    /// sender a second time.
    pub fn is_retryable(&self) -> bool {
        match self {
            LedgerError::ConcurrentModification { .. } => true,
            LedgerError::StorageUnavailable(e) => e.is_transient(),
            _ => false,
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
